/// talentsift CLI - candidate screening pipeline worker.
///
/// Entry point for the talentsift binary. Parses CLI arguments,
/// initializes logging, and dispatches to subcommand handlers.
mod commands;

use clap::Parser;
use talentsift_core::config::Config;
use tracing_subscriber::EnvFilter;

/// Candidate screening pipeline
#[derive(Parser)]
#[command(name = "talentsift")]
#[command(version)]
#[command(about = "Candidate screening pipeline worker and operator tools")]
#[command(after_help = "\
Quick start:
  1. talentsift init-config   — seed the default scoring configuration
  2. talentsift enqueue <id>  — queue a candidate for screening
  3. talentsift run           — start the worker loop
  4. talentsift status        — inspect queue and candidate state")]
struct Cli {
    /// Path to config.toml
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = "~/.talentsift/config.toml"
    )]
    config: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the pipeline worker loop
    Run(commands::RunArgs),
    /// Enqueue a pipeline stage for a candidate
    Enqueue(commands::EnqueueArgs),
    /// Retry failed queue items
    Retry(commands::RetryArgs),
    /// Reset stuck RUNNING items back to READY
    Reconcile(commands::ReconcileArgs),
    /// Show queue statistics or one candidate's state
    Status(commands::StatusArgs),
    /// Insert the default scoring configuration
    InitConfig(commands::InitConfigArgs),
    /// Print a candidate's stored score breakdown
    Score(commands::ScoreArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing-subscriber.
    //
    // Priority: RUST_LOG env var > --verbose/--quiet flags > default (info).
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("talentsift=debug,talentsift_core=debug,info")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("talentsift=info,talentsift_core=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .compact()
        .init();

    let config = Config::load(Some(&cli.config))
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(&config, args).await,
        Commands::Enqueue(args) => commands::enqueue::execute(&config, args).await,
        Commands::Retry(args) => commands::retry::execute(&config, args).await,
        Commands::Reconcile(args) => commands::reconcile::execute(&config, args).await,
        Commands::Status(args) => commands::status::execute(&config, args).await,
        Commands::InitConfig(args) => commands::init_config::execute(&config, args).await,
        Commands::Score(args) => commands::score::execute(&config, args).await,
    }
}
