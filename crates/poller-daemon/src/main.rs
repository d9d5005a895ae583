//! Vehicle Poller - Main Entry Point

use poller_daemon::{init_logging, run, DaemonSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = DaemonSettings::load()?;
    init_logging(&settings.log_level)?;

    info!("=== Vehicle Poller v{} ===", env!("CARGO_PKG_VERSION"));
    run(settings).await
}
