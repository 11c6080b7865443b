use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::cloudflare::{FirewallRule, Zone};
use crate::utils::ExportResult;

/// Column names of the report, in order
pub const REPORT_HEADER: [&str; 8] = [
    "Zone Name",
    "Rule ID",
    "Version",
    "Action",
    "Expression",
    "Description",
    "Last Updated",
    "Enabled",
];

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub zone_name: String,
    pub rule_id: String,
    pub version: String,
    pub action: String,
    pub expression: String,
    pub description: String,
    pub last_updated: String,
    pub enabled: bool,
}

impl ExportRow {
    pub fn new(zone: &Zone, rule: &FirewallRule) -> Self {
        Self {
            zone_name: zone.name.clone(),
            rule_id: rule.id.clone(),
            version: rule.version.clone(),
            action: rule.action.clone(),
            expression: rule.expression.clone(),
            description: rule.description.clone(),
            last_updated: rule.last_updated.clone(),
            enabled: rule.enabled,
        }
    }

    fn record(&self) -> [&str; 8] {
        [
            self.zone_name.as_str(),
            self.rule_id.as_str(),
            self.version.as_str(),
            self.action.as_str(),
            self.expression.as_str(),
            self.description.as_str(),
            self.last_updated.as_str(),
            if self.enabled { "true" } else { "false" },
        ]
    }
}

/// Append-only CSV report shared by all zone workers
///
/// Writers are serialized through a mutex and every row is flushed as soon
/// as it is written, so a batch appended by one worker never interleaves
/// with another worker's rows.
pub struct ReportSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
    rows_written: AtomicUsize,
}

impl ReportSink {
    /// Create (or truncate) the report at `path` and write the header row
    pub fn create(path: impl AsRef<Path>) -> ExportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(REPORT_HEADER)?;
        writer.flush()?;

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            rows_written: AtomicUsize::new(0),
        })
    }

    /// Append `rows` in order under a single lock acquisition
    pub async fn append(&self, rows: &[ExportRow]) -> ExportResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut writer = self.writer.lock().await;
        for row in rows {
            writer.write_record(row.record())?;
            writer.flush()?;
            self.rows_written.fetch_add(1, Ordering::Relaxed);
        }

        Ok(rows.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
