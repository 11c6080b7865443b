use crate::cloudflare::{FirewallRule, Zone};
use crate::core::sink::{ExportRow, ReportSink};
use crate::utils::{log_exported_rule, ExportResult};

/// Rules whose action equals `action`, in upstream order
pub fn filter_by_action<'a>(
    rules: &'a [FirewallRule],
    action: &'a str,
) -> impl Iterator<Item = &'a FirewallRule> + 'a {
    rules.iter().filter(move |rule| rule.action == action)
}

/// Append the zone's rules matching `filter_action` to the report.
///
/// Returns the number of rows written. Each row is echoed to the log.
pub async fn export(
    zone: &Zone,
    rules: &[FirewallRule],
    filter_action: &str,
    sink: &ReportSink,
) -> ExportResult<usize> {
    let rows: Vec<ExportRow> = filter_by_action(rules, filter_action)
        .map(|rule| ExportRow::new(zone, rule))
        .collect();

    let written = sink.append(&rows).await?;
    rows.iter().for_each(log_exported_rule);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, action: &str) -> FirewallRule {
        FirewallRule {
            id: id.to_string(),
            version: "1".to_string(),
            action: action.to_string(),
            expression: format!("http.request.uri.path eq \"/{}\"", id),
            description: format!("rule {}", id),
            last_updated: "2024-05-01T10:00:00Z".to_string(),
            enabled: true,
        }
    }

    fn zone() -> Zone {
        Zone {
            id: "z1".to_string(),
            name: "example.com".to_string(),
            account_name: "DXP Customers".to_string(),
        }
    }

    #[test]
    fn filter_keeps_upstream_order_and_exact_action() {
        let rules = vec![
            rule("a", "skip"),
            rule("b", "block"),
            rule("c", "skip"),
            rule("d", "Skip"),
            rule("e", "skip"),
        ];

        let ids: Vec<&str> = filter_by_action(&rules, "skip").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "e"]);
    }

    #[tokio::test]
    async fn export_writes_only_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let sink = ReportSink::create(&path).unwrap();

        let rules = vec![rule("a", "skip"), rule("b", "challenge"), rule("c", "skip")];
        let written = export(&zone(), &rules, "skip", &sink).await.unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| &r[0] == "example.com" && &r[3] == "skip"));
        assert_eq!(&records[0][1], "a");
        assert_eq!(&records[1][1], "c");
    }

    #[tokio::test]
    async fn export_without_matches_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let sink = ReportSink::create(&path).unwrap();

        let written = export(&zone(), &[rule("a", "block")], "skip", &sink).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(sink.rows_written(), 0);
    }
}
