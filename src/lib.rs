//! Exports Cloudflare custom firewall rules for every zone of an account
//! into a CSV audit report.

pub mod cloudflare;
pub mod config;
pub mod core;
pub mod service;
pub mod utils;

pub use service::{ExportService, RunSummary};
