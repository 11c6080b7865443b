use std::env;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::ChronoLocal},
    EnvFilter,
};

use crate::core::ExportRow;
use crate::utils::{ExportError, ExportResult};

/// Initialize the logging system with the specified log level
pub fn init_logging() -> ExportResult<()> {
    // Get the log level from environment variable or default to INFO
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    // Create a custom environment filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_level(true)
        .with_timer(ChronoLocal::rfc_3339())
        .pretty()
        .try_init()
        .map_err(|e| ExportError::Internal(format!("failed to set tracing subscriber: {}", e)))
}

/// Log a Cloudflare API event
pub fn log_cloudflare_event(event_type: &str, success: bool, details: Option<&str>) {
    if success {
        tracing::event!(
            Level::INFO,
            event_type = %event_type,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    } else {
        tracing::event!(
            Level::WARN,
            event_type = %event_type,
            success = %success,
            details = ?details,
            timestamp = %chrono::Utc::now()
        );
    }
}

/// Echo an exported rule to the operator console
pub fn log_exported_rule(row: &ExportRow) {
    tracing::info!(
        zone_name = %row.zone_name,
        rule_id = %row.rule_id,
        version = %row.version,
        action = %row.action,
        expression = %row.expression,
        description = %row.description,
        last_updated = %row.last_updated,
        enabled = %row.enabled,
        event = "rule_exported"
    );
}

/// Log an enumeration backoff step before sleeping `delay`
pub fn log_backoff(page: u32, delay: Duration) {
    tracing::warn!(
        page = page,
        delay_secs = delay.as_secs_f64(),
        event = "backoff",
        "Retrying zone page after backoff"
    );
}

/// Log the end of enumeration once the backoff delay passed `ceiling`
pub fn log_backoff_exceeded(page: u32, delay: Duration, ceiling: Duration) {
    tracing::error!(
        page = page,
        delay_secs = delay.as_secs_f64(),
        ceiling_secs = ceiling.as_secs_f64(),
        event = "backoff_exceeded",
        "Maximum retry delay reached, stopping zone enumeration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error() {
        // The first call may lose to a subscriber installed by another test.
        let _ = init_logging();

        let err = init_logging().unwrap_err();
        assert!(matches!(err, ExportError::Internal(_)));
        assert!(err.to_string().contains("tracing subscriber"));
    }
}
