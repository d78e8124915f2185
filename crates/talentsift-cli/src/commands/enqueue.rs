//! `talentsift enqueue` - queue a pipeline stage for a candidate.

use clap::Args;
use talentsift_core::config::Config;
use talentsift_core::storage::queue::{self, Stage};
use talentsift_core::storage::{self, candidates};

/// Arguments for the enqueue command.
#[derive(Args)]
pub struct EnqueueArgs {
    /// Candidate to enqueue
    pub candidate_id: String,

    /// Stage to enqueue. Enqueueing anything later than TEXT_EXTRACT
    /// assumes the earlier stages already ran for this candidate.
    #[arg(long, default_value = "TEXT_EXTRACT")]
    pub stage: String,
}

/// Append a READY queue item for the candidate.
pub async fn execute(config: &Config, args: EnqueueArgs) -> anyhow::Result<()> {
    let Some(stage) = Stage::from_db(&args.stage) else {
        anyhow::bail!(
            "unknown stage '{}' (expected TEXT_EXTRACT, LLM_EXTRACT, EMBED, SCORE or EXPLAIN)",
            args.stage
        );
    };

    let pool = storage::init_db(&config.database.path).await?;

    if candidates::get(&pool, &args.candidate_id).await?.is_none() {
        anyhow::bail!("candidate '{}' not found", args.candidate_id);
    }

    let queue_id = queue::enqueue(&pool, &args.candidate_id, stage).await?;
    println!("Enqueued {stage} for candidate {} as {queue_id}", args.candidate_id);
    Ok(())
}
