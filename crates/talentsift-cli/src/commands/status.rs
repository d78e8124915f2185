//! `talentsift status` - queue statistics and candidate state.

use clap::Args;
use talentsift_core::config::Config;
use talentsift_core::storage::{self, candidates, queue};

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Show one candidate instead of queue totals
    pub candidate_id: Option<String>,
}

/// Print queue statistics, or one candidate's projection.
pub async fn execute(config: &Config, args: StatusArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;

    if let Some(candidate_id) = args.candidate_id {
        let Some(candidate) = candidates::get(&pool, &candidate_id).await? else {
            anyhow::bail!("candidate '{candidate_id}' not found");
        };

        println!("Candidate: {} ({})", candidate.candidate_id, candidate.display_name);
        println!("Job:       {}", candidate.job_id);
        println!("Status:    {}", candidate.status);
        if let Some(error) = &candidate.error_message {
            println!("Error:     {error}");
        }
        return Ok(());
    }

    let stats = queue::stats(&pool).await?;
    println!("Queue:");
    println!("  ready:   {}", stats.ready);
    println!("  running: {}", stats.running);
    println!("  done:    {}", stats.done);
    println!("  failed:  {}", stats.failed);

    let failed = queue::failed(&pool, 10).await?;
    if !failed.is_empty() {
        println!("\nRecent failures:");
        for item in failed {
            println!(
                "  {} {} candidate={} attempts={} error={}",
                item.queue_id,
                item.job_type,
                item.candidate_id,
                item.attempts,
                item.last_error.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}
