//! Core functionality for the rule export.
//! This module contains the retry utility, the shared CSV report
//! and the per-zone export step.

mod exporter;
mod retry;
mod sink;

pub use exporter::{export, filter_by_action};
pub use retry::{retry, RetryPolicy};
pub use sink::{ExportRow, ReportSink, REPORT_HEADER};
