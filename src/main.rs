use anyhow::Context;
use std::process::ExitCode;

use waf_rules_export::config::load_config;
use waf_rules_export::utils::{init_logging, ExportError};
use waf_rules_export::ExportService;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    init_logging()?;
    tracing::info!("Starting firewall custom rule export...");

    // Load configuration
    let settings = load_config().map_err(ExportError::Config)?;
    tracing::info!(
        account = %settings.export.account_name,
        action = %settings.export.rule_action,
        concurrency = settings.worker.concurrency,
        "Configuration loaded successfully"
    );

    let service = ExportService::new(settings).context("failed to initialize Cloudflare client")?;
    let summary = service.run().await.context("export aborted")?;

    tracing::info!(
        output = %summary.output_path.display(),
        zones = summary.zones_enumerated,
        rows = summary.rows_written,
        "Report written"
    );

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
