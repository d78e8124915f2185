//! `talentsift reconcile` - recover orphaned RUNNING queue items.

use clap::Args;
use std::time::Duration;
use talentsift_core::config::Config;
use talentsift_core::storage::{self, queue};

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Reset RUNNING items older than this many seconds
    #[arg(long)]
    pub older_than_secs: Option<u64>,
}

/// Reset RUNNING items whose last transition is older than the threshold.
pub async fn execute(config: &Config, args: ReconcileArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;

    let threshold = Duration::from_secs(
        args.older_than_secs
            .unwrap_or(config.worker.stuck_threshold_secs),
    );
    let reset = queue::reset_stuck(&pool, threshold).await?;

    if reset == 0 {
        println!("No stuck items");
    } else {
        println!("Reset {reset} stuck items back to READY");
    }
    Ok(())
}
