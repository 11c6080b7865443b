use chrono::Local;
use futures::{future, stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

use crate::cloudflare::{CloudflareClient, EnumerationOutcome, RuleFetcher, Zone, ZoneEnumerator};
use crate::config::Settings;
use crate::core::{export, ReportSink};
use crate::utils::ExportResult;

/// Result of one export run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Report written by the run
    pub output_path: PathBuf,
    /// Zones selected by the account filter
    pub zones_enumerated: usize,
    /// Zones whose ruleset was fetched and exported
    pub zones_exported: usize,
    /// Zones whose ruleset could not be fetched; they contributed no rows
    pub zones_degraded: usize,
    /// Zones whose task failed while exporting
    pub zones_failed: usize,
    /// Data rows in the report
    pub rows_written: usize,
    /// How zone enumeration ended
    pub enumeration: EnumerationOutcome,
    /// Whether the worker pool hit its hard timeout
    pub timed_out: bool,
}

impl RunSummary {
    /// A run succeeds when every zone was enumerated, the pool finished in
    /// time, and at least one zone was exported whenever any was selected.
    pub fn is_success(&self) -> bool {
        self.enumeration == EnumerationOutcome::Complete
            && !self.timed_out
            && (self.zones_enumerated == 0 || self.zones_exported > 0)
    }
}

/// What happened to a single zone
#[derive(Debug)]
struct ZoneReport {
    rows: usize,
    rules_available: bool,
}

#[derive(Debug, Default)]
struct ZoneTally {
    exported: usize,
    degraded: usize,
    failed: usize,
}

impl ZoneTally {
    fn record(&mut self, zone_name: &str, joined: Result<ExportResult<ZoneReport>, JoinError>) {
        match joined {
            Ok(Ok(report)) if report.rules_available => {
                tracing::debug!(zone = %zone_name, rows = report.rows, "Zone exported");
                self.exported += 1;
            }
            Ok(Ok(_)) => {
                tracing::warn!(zone = %zone_name, "Ruleset unavailable, zone contributes no rows");
                self.degraded += 1;
            }
            Ok(Err(e)) => {
                tracing::error!(zone = %zone_name, error = %e, "Zone export failed");
                self.failed += 1;
            }
            Err(e) => {
                tracing::error!(zone = %zone_name, error = %e, "Zone task did not complete");
                self.failed += 1;
            }
        }
    }
}

/// Aborts the wrapped task if dropped before it completes
struct TaskGuard<T>(JoinHandle<T>);

impl<T> Drop for TaskGuard<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs the export: enumerate zones, then fetch and export their rules
/// through a bounded pool of worker tasks.
pub struct ExportService {
    /// Cloudflare client shared by enumeration and all workers
    client: Arc<CloudflareClient>,
    settings: Settings,
}

impl ExportService {
    /// Creates the service and its HTTP client
    pub fn new(settings: Settings) -> ExportResult<Self> {
        let client = Arc::new(CloudflareClient::new(&settings.cloudflare)?);
        Ok(Self { client, settings })
    }

    /// Runs an export to the configured (or date-stamped) output path
    pub async fn run(&self) -> ExportResult<RunSummary> {
        let output_path = self
            .settings
            .export
            .resolved_output_path(Local::now().date_naive());
        self.run_to(&output_path).await
    }

    /// Runs an export to `output_path`
    ///
    /// Only setup failures are returned as errors. Per-zone failures and an
    /// aborted enumeration are reported through the summary.
    pub async fn run_to(&self, output_path: &Path) -> ExportResult<RunSummary> {
        let export_config = &self.settings.export;
        tracing::info!(
            account = %export_config.account_name,
            action = %export_config.rule_action,
            output = %output_path.display(),
            "Starting firewall custom rule export"
        );

        let enumerator = ZoneEnumerator::new(Arc::clone(&self.client), &self.settings.fetch);
        let enumeration = enumerator.enumerate_zones(&export_config.account_name).await;

        let sink = Arc::new(ReportSink::create(output_path)?);
        let zones_enumerated = enumeration.zones.len();
        let (tally, timed_out) = self.export_zones(enumeration.zones, &sink).await;

        let summary = RunSummary {
            output_path: sink.path().to_path_buf(),
            zones_enumerated,
            zones_exported: tally.exported,
            zones_degraded: tally.degraded,
            zones_failed: tally.failed,
            rows_written: sink.rows_written(),
            enumeration: enumeration.outcome,
            timed_out,
        };

        if summary.is_success() {
            tracing::info!(?summary, "Export finished");
        } else {
            tracing::error!(?summary, "Export finished with errors");
        }

        Ok(summary)
    }

    async fn export_zones(&self, zones: Vec<Zone>, sink: &Arc<ReportSink>) -> (ZoneTally, bool) {
        let fetcher = Arc::new(RuleFetcher::new(Arc::clone(&self.client), &self.settings.fetch));
        let action: Arc<str> = Arc::from(self.settings.export.rule_action.as_str());
        let concurrency = self.settings.worker.concurrency;

        tracing::info!(zones = zones.len(), concurrency = concurrency, "Exporting zone rulesets");

        let mut tally = ZoneTally::default();
        let drain = stream::iter(zones)
            .map(|zone| {
                let fetcher = Arc::clone(&fetcher);
                let sink = Arc::clone(sink);
                let action = Arc::clone(&action);
                let zone_name = zone.name.clone();
                let span = tracing::info_span!("zone", zone = %zone.name, zone_id = %zone.id);

                let guard = TaskGuard(tokio::spawn(
                    async move { process_zone(&fetcher, &sink, &zone, &action).await }
                        .instrument(span),
                ));

                async move {
                    let mut guard = guard;
                    let joined = (&mut guard.0).await;
                    (zone_name, joined)
                }
            })
            .buffer_unordered(concurrency)
            .for_each(|(zone_name, joined)| {
                tally.record(&zone_name, joined);
                future::ready(())
            });

        let timed_out = match self.settings.worker.run_timeout() {
            Some(limit) => tokio::time::timeout(limit, drain).await.is_err(),
            None => {
                drain.await;
                false
            }
        };

        if timed_out {
            tracing::error!("Worker pool timed out, remaining zones were abandoned");
        }

        (tally, timed_out)
    }
}

async fn process_zone(
    fetcher: &RuleFetcher,
    sink: &ReportSink,
    zone: &Zone,
    action: &str,
) -> ExportResult<ZoneReport> {
    match fetcher.fetch_rules(&zone.id).await {
        Some(rules) => {
            let rows = export(zone, &rules, action, sink).await?;
            Ok(ZoneReport {
                rows,
                rules_available: true,
            })
        }
        None => Ok(ZoneReport {
            rows: 0,
            rules_available: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(enumeration: EnumerationOutcome, enumerated: usize, exported: usize) -> RunSummary {
        RunSummary {
            output_path: PathBuf::from("report.csv"),
            zones_enumerated: enumerated,
            zones_exported: exported,
            zones_degraded: enumerated - exported,
            zones_failed: 0,
            rows_written: 0,
            enumeration,
            timed_out: false,
        }
    }

    #[test]
    fn no_matching_zones_is_success() {
        assert!(summary(EnumerationOutcome::Complete, 0, 0).is_success());
    }

    #[test]
    fn aborted_enumeration_is_failure() {
        let s = summary(EnumerationOutcome::BackoffExceeded { page: 3 }, 4, 4);
        assert!(!s.is_success());
    }

    #[test]
    fn nothing_exported_is_failure() {
        assert!(!summary(EnumerationOutcome::Complete, 2, 0).is_success());
        assert!(summary(EnumerationOutcome::Complete, 2, 1).is_success());
    }

    #[test]
    fn timeout_is_failure() {
        let mut s = summary(EnumerationOutcome::Complete, 1, 1);
        s.timed_out = true;
        assert!(!s.is_success());
    }
}
