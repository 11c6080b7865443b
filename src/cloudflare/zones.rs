use std::sync::Arc;
use std::time::Duration;

use crate::cloudflare::client::{CloudflareClient, Zone, ZoneRecord};
use crate::config::FetchConfig;
use crate::core::{retry, RetryPolicy};
use crate::utils::{log_backoff, log_backoff_exceeded, log_cloudflare_event, ExportError, ExportResult};

/// How zone enumeration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationOutcome {
    /// An empty page was reached
    Complete,
    /// Backoff on `page` grew past the ceiling; the zone list is partial
    BackoffExceeded { page: u32 },
}

/// Zones collected by an enumeration run
#[derive(Debug, Clone)]
pub struct ZoneEnumeration {
    pub zones: Vec<Zone>,
    pub outcome: EnumerationOutcome,
    /// Non-empty pages successfully read
    pub pages_fetched: u32,
}

impl ZoneEnumeration {
    pub fn is_complete(&self) -> bool {
        self.outcome == EnumerationOutcome::Complete
    }
}

/// Walks the paginated zone list of the Cloudflare API
///
/// Pages are requested strictly in order. Each page goes through the shared
/// retry utility; a page that still fails doubles the backoff delay, and once
/// that delay passes the ceiling enumeration stops with whatever was
/// collected so far.
pub struct ZoneEnumerator {
    client: Arc<CloudflareClient>,
    per_page: u32,
    retry_policy: RetryPolicy,
    page_delay: Duration,
    backoff_initial: Duration,
    backoff_ceiling: Duration,
}

impl ZoneEnumerator {
    pub fn new(client: Arc<CloudflareClient>, fetch: &FetchConfig) -> Self {
        Self {
            client,
            per_page: fetch.per_page,
            retry_policy: RetryPolicy::new(fetch.max_attempts, fetch.zone_retry_delay()),
            page_delay: fetch.page_delay(),
            backoff_initial: fetch.backoff_initial(),
            backoff_ceiling: fetch.backoff_ceiling(),
        }
    }

    /// Collects every zone owned by `account_filter`
    pub async fn enumerate_zones(&self, account_filter: &str) -> ZoneEnumeration {
        let mut zones = Vec::new();

        if account_filter.is_empty() {
            tracing::warn!("Empty account filter, no zones will be selected");
            return ZoneEnumeration {
                zones,
                outcome: EnumerationOutcome::Complete,
                pages_fetched: 0,
            };
        }

        let mut page = 1;
        let mut pages_fetched = 0;
        let mut backoff = self.backoff_initial;

        let outcome = loop {
            let fetched = retry(
                &self.retry_policy,
                "list_zones",
                || self.fetch_page(page),
                |_: &Vec<ZoneRecord>| true,
            )
            .await;

            match fetched {
                Ok(records) => {
                    if records.is_empty() {
                        tracing::info!(page = page, "No more zones to process");
                        break EnumerationOutcome::Complete;
                    }

                    let page_size = records.len();
                    let selected = filter_by_account(records, account_filter);
                    tracing::debug!(
                        page = page,
                        page_size = page_size,
                        selected = selected.len(),
                        "Zone page fetched"
                    );
                    zones.extend(selected);

                    pages_fetched += 1;
                    page += 1;
                    backoff = self.backoff_initial;

                    if !self.page_delay.is_zero() {
                        tokio::time::sleep(self.page_delay).await;
                    }
                }
                Err(e) => {
                    backoff = backoff.saturating_mul(2);
                    if backoff > self.backoff_ceiling {
                        log_backoff_exceeded(page, backoff, self.backoff_ceiling);
                        log_cloudflare_event(
                            "list_zones",
                            false,
                            Some(&format!("giving up on page {}: {}", page, e)),
                        );
                        break EnumerationOutcome::BackoffExceeded { page };
                    }
                    log_backoff(page, backoff);
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        log_cloudflare_event(
            "enumerate_zones",
            outcome == EnumerationOutcome::Complete,
            Some(&format!(
                "{} zones for account {:?} across {} pages",
                zones.len(),
                account_filter,
                pages_fetched
            )),
        );

        ZoneEnumeration {
            zones,
            outcome,
            pages_fetched,
        }
    }

    /// Requests one page of zones, once
    ///
    /// A response whose body reports `success: false` becomes
    /// [`ExportError::Cloudflare`] carrying the first API error.
    pub async fn fetch_page(&self, page: u32) -> ExportResult<Vec<ZoneRecord>> {
        let response = self.client.list_zones(page, self.per_page).await?;
        if !response.success {
            return Err(ExportError::Cloudflare(response.error_summary()));
        }
        Ok(response.result.unwrap_or_default())
    }
}

/// Keeps records whose account name equals `account_filter` exactly
pub fn filter_by_account(records: Vec<ZoneRecord>, account_filter: &str) -> Vec<Zone> {
    if account_filter.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .filter(|record| record.account.name == account_filter)
        .map(Zone::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudflare::client::ZoneAccount;

    fn record(id: &str, account: &str) -> ZoneRecord {
        ZoneRecord {
            id: id.to_string(),
            name: format!("{}.example", id),
            account: ZoneAccount {
                name: account.to_string(),
            },
        }
    }

    #[test]
    fn account_filter_is_exact_and_case_sensitive() {
        let records = vec![
            record("a", "DXP Customers"),
            record("b", "DXP Customer"),
            record("c", "dxp customers"),
            record("d", "DXP Customers "),
            record("e", "DXP Customers"),
        ];

        let ids: Vec<String> = filter_by_account(records, "DXP Customers")
            .into_iter()
            .map(|zone| zone.id)
            .collect();
        assert_eq!(ids, vec!["a", "e"]);
    }

    #[test]
    fn empty_filter_selects_nothing() {
        let records = vec![record("a", ""), record("b", "DXP Customers")];
        assert!(filter_by_account(records, "").is_empty());
    }
}
