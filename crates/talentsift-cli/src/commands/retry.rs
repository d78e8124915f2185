//! `talentsift retry` - put failed queue items back to READY.

use clap::Args;
use talentsift_core::config::Config;
use talentsift_core::storage::{self, queue};

/// Arguments for the retry command.
#[derive(Args)]
pub struct RetryArgs {
    /// Queue item to retry
    #[arg(required_unless_present = "all_failed")]
    pub queue_id: Option<String>,

    /// Retry every FAILED item
    #[arg(long, conflicts_with = "queue_id")]
    pub all_failed: bool,

    /// Maximum items to retry with --all-failed
    #[arg(long, default_value_t = 100)]
    pub limit: i64,
}

/// Transition FAILED items back to READY. Attempts and last_error are
/// preserved.
pub async fn execute(config: &Config, args: RetryArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;

    if args.all_failed {
        let failed = queue::failed(&pool, args.limit).await?;
        if failed.is_empty() {
            println!("No failed items");
            return Ok(());
        }
        let mut retried = 0;
        for item in &failed {
            if queue::retry(&pool, &item.queue_id).await? {
                retried += 1;
            }
        }
        println!("Retried {retried} of {} failed items", failed.len());
        return Ok(());
    }

    let queue_id = args.queue_id.expect("clap enforces queue_id");
    if queue::retry(&pool, &queue_id).await? {
        println!("Queue item {queue_id} is READY again");
    } else {
        anyhow::bail!("queue item '{queue_id}' is not in the FAILED state");
    }
    Ok(())
}
