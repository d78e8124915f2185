//! `talentsift run` - start the pipeline worker loop.

use clap::Args;
use std::sync::Arc;
use talentsift_core::blobstore::LocalBlobStore;
use talentsift_core::config::Config;
use talentsift_core::llm::openai_compat::OpenAiCompatClient;
use talentsift_core::pipeline::runner::Runner;
use talentsift_core::pipeline::PipelineContext;
use talentsift_core::storage;
use tokio_util::sync::CancellationToken;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Process at most one queue item, then exit
    #[arg(long)]
    pub once: bool,
}

/// Start the worker loop (or process a single item with `--once`).
pub async fn execute(config: &Config, args: RunArgs) -> anyhow::Result<()> {
    let pool = storage::init_db(&config.database.path).await?;
    let blobs = Arc::new(LocalBlobStore::new(&config.storage.base_dir)?);
    let llm = Arc::new(OpenAiCompatClient::new(&config.llm)?);

    let ctx = PipelineContext {
        pool,
        blobs,
        llm,
        worker: config.worker.clone(),
    };
    let runner = Runner::new(ctx);

    if args.once {
        match runner.run_once().await? {
            Some(queue_id) => println!("Processed queue item {queue_id}"),
            None => println!("Queue is empty"),
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    runner.run(cancel).await;
    Ok(())
}
