use anyhow::Result;
use std::path::Path;
use tracing::{error, info};

use slack_report_dispatcher::config::{load_config, load_env_file, DEFAULT_ENV_PATH};
use slack_report_dispatcher::{DispatchOutcome, ReportDispatcher};

#[tokio::main]
async fn main() {
    init_tracing();

    // Failures end up in the local log only; the process still exits cleanly.
    match run().await {
        Ok(outcome) => info!(
            "Report delivery finished (thread {}, archive attached: {}): {:?}",
            outcome.thread_ts().unwrap_or("-"),
            outcome.file_uploaded(),
            outcome
        ),
        Err(e) => error!("Error in report delivery: {:#}", e),
    }
}

async fn run() -> Result<DispatchOutcome> {
    load_env_file(Path::new(DEFAULT_ENV_PATH))?;
    let cfg = load_config()?;
    info!("summary = {}, archive = {}", cfg.summary_path.display(), cfg.archive_path.display());

    ReportDispatcher::new(&cfg).run().await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
