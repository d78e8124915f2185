//! `talentsift score` - print a candidate's stored score breakdown.

use clap::Args;
use talentsift_core::config::Config;
use talentsift_core::storage::{self, explanations, scores};

/// Arguments for the score command.
#[derive(Args)]
pub struct ScoreArgs {
    /// Candidate whose score to show
    pub candidate_id: String,

    /// Emit machine-readable JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Print the stored breakdown for a candidate.
pub async fn execute(config: &Config, args: ScoreArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;

    let Some(record) = scores::get(&pool, &args.candidate_id).await? else {
        anyhow::bail!("no score recorded for candidate '{}'", args.candidate_id);
    };

    if args.json {
        let value = serde_json::json!({
            "candidate_id": record.candidate_id,
            "must_score": record.breakdown.must_score,
            "nice_score": record.breakdown.nice_score,
            "year_score": record.breakdown.year_score,
            "role_score": record.breakdown.role_score,
            "total_fit_0_100": record.breakdown.total_fit_0_100,
            "must_gaps": record.breakdown.must_gaps,
            "score_config_version": record.score_config_version,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Candidate: {}", record.candidate_id);
    println!("Total fit: {}/100", record.breakdown.total_fit_0_100);
    println!("  must: {:.2}", record.breakdown.must_score);
    println!("  nice: {:.2}", record.breakdown.nice_score);
    println!("  year: {:.2}", record.breakdown.year_score);
    println!("  role: {:.2}", record.breakdown.role_score);
    println!("Config version: {}", record.score_config_version);

    if record.breakdown.must_gaps.is_empty() {
        println!("Must gaps: none");
    } else {
        println!("Must gaps:");
        for gap in &record.breakdown.must_gaps {
            println!("  - {gap}");
        }
    }

    if let Some(explanation) = explanations::get(&pool, &args.candidate_id).await? {
        println!("\nSummary: {}", explanation.summary);
    }
    Ok(())
}
