#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use waf_rules_export::config::{CloudflareConfig, ExportConfig, FetchConfig, Settings, WorkerConfig};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "test-token";

/// Settings pointing at `base_url` with millisecond-scale delays
pub fn test_settings(base_url: &str, account_name: &str, rule_action: &str) -> Settings {
    Settings {
        cloudflare: CloudflareConfig {
            api_token: TEST_TOKEN.to_string(),
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        },
        export: ExportConfig {
            account_name: account_name.to_string(),
            rule_action: rule_action.to_string(),
            output_path: None,
        },
        fetch: FetchConfig {
            per_page: 1000,
            max_attempts: 3,
            zone_retry_delay_ms: 0,
            rule_retry_delay_ms: 0,
            page_delay_ms: 0,
            backoff_initial_ms: 1,
            backoff_ceiling_ms: 60,
        },
        worker: WorkerConfig {
            concurrency: 4,
            run_timeout_secs: None,
        },
    }
}

pub fn zone_json(id: &str, name: &str, account: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": "active",
        "account": { "id": format!("acct-{}", account.len()), "name": account }
    })
}

pub fn rule_json(id: &str, action: &str) -> Value {
    json!({
        "id": id,
        "version": "1",
        "action": action,
        "expression": format!("(http.request.uri.path contains \"/{}\")", id),
        "description": format!("rule {}", id),
        "last_updated": "2024-06-01T12:00:00.000000Z",
        "enabled": true,
        "ref": id
    })
}

pub fn zones_page(zones: Vec<Value>) -> Value {
    let count = zones.len();
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": zones,
        "result_info": { "count": count }
    })
}

pub fn ruleset(rules: Vec<Value>) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": {
            "id": "ruleset-1",
            "name": "default",
            "kind": "zone",
            "phase": "http_request_firewall_custom",
            "rules": rules
        }
    })
}

pub fn ruleset_path(zone_id: &str) -> String {
    format!(
        "/zones/{}/rulesets/phases/http_request_firewall_custom/entrypoint",
        zone_id
    )
}

/// Serve `body` for zone page `page`, expecting exactly `times` requests
pub async fn mount_zone_page(server: &MockServer, page: u32, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("page", page.to_string()))
        .and(query_param("per_page", "1000"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_ruleset(server: &MockServer, zone_id: &str, rules: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(ruleset_path(zone_id)))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(ruleset(rules)))
        .mount(server)
        .await;
}

/// Serve a one-rule ruleset for `zone_id` after `delay`
pub async fn mount_slow_ruleset(server: &MockServer, zone_id: &str, rule_id: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(ruleset_path(zone_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ruleset(vec![rule_json(rule_id, "skip")]))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Data rows of the report, header excluded
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("report should be readable");
    let headers = reader.headers().expect("report should have a header").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "Zone Name",
            "Rule ID",
            "Version",
            "Action",
            "Expression",
            "Description",
            "Last Updated",
            "Enabled"
        ]
    );

    reader
        .records()
        .map(|record| {
            record
                .expect("row should parse")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}
