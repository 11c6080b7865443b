use std::sync::Arc;

use crate::cloudflare::client::{CloudflareClient, CloudflareResponse, FirewallRule, Ruleset};
use crate::config::FetchConfig;
use crate::core::{retry, RetryPolicy};
use crate::utils::log_cloudflare_event;

/// Fetches custom firewall rulesets for individual zones
///
/// Failures are contained per zone: a ruleset that cannot be fetched after
/// all attempts yields `None` instead of an error.
pub struct RuleFetcher {
    /// Cloudflare API client shared with the zone enumerator
    client: Arc<CloudflareClient>,

    /// Attempts and pause used for each ruleset request
    retry_policy: RetryPolicy,
}

impl RuleFetcher {
    pub fn new(client: Arc<CloudflareClient>, fetch: &FetchConfig) -> Self {
        Self {
            client,
            retry_policy: RetryPolicy::new(fetch.max_attempts, fetch.rule_retry_delay()),
        }
    }

    /// Fetches the rules of the zone's custom firewall entrypoint
    ///
    /// # Returns
    ///
    /// * `Some(rules)` - Rules in the order Cloudflare evaluates them
    /// * `None` - If every attempt failed
    pub async fn fetch_rules(&self, zone_id: &str) -> Option<Vec<FirewallRule>> {
        let fetched = retry(
            &self.retry_policy,
            "get_custom_ruleset",
            || self.client.get_custom_ruleset(zone_id),
            |response: &CloudflareResponse<Ruleset>| response.result.is_some(),
        )
        .await;

        match fetched {
            Ok(response) => Some(response.result.map(|ruleset| ruleset.rules).unwrap_or_default()),
            Err(e) => {
                log_cloudflare_event(
                    "get_custom_ruleset",
                    false,
                    Some(&format!("zone {}: giving up: {}", zone_id, e)),
                );
                None
            }
        }
    }
}
