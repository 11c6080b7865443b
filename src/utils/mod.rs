//! Utility modules for the rule export.
//! This module contains common utilities used across the application.

mod logging;
mod error;

pub use logging::{
    init_logging,
    log_cloudflare_event,
    log_exported_rule,
    log_backoff,
    log_backoff_exceeded,
};

pub use error::{ExportError, ExportResult};
