//! `talentsift init-config` - seed the default scoring configuration.

use clap::Args;
use talentsift_core::config::Config;
use talentsift_core::storage::{self, score_config};

/// Arguments for the init-config command.
#[derive(Args)]
pub struct InitConfigArgs {
    /// Insert a new version even if one already exists
    #[arg(long)]
    pub force: bool,
}

/// Insert the default score configuration unless one already exists.
pub async fn execute(config: &Config, args: InitConfigArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;

    if let Some(existing) = score_config::latest(&pool).await? {
        if !args.force {
            println!(
                "Score config version {} already exists (use --force to add a new version)",
                existing.version
            );
            return Ok(());
        }
    }

    let version = score_config::insert_default(&pool).await?;
    println!("Inserted default score config as version {version}");
    Ok(())
}
