//! Polling runner that drives the screening pipeline.
//!
//! One loop: lease the oldest READY item, dispatch it to its stage handler,
//! commit the outcome, enqueue the successor stage. Failures stay FAILED
//! until an operator (or the reconcile sweep for orphaned RUNNING items)
//! intervenes; once attempts reach the configured maximum, the failure is
//! projected onto the candidate.

use super::{run_stage, PipelineContext};
use crate::error::{StageError, StorageError};
use crate::storage::queue::{self, QueueItem, Stage};
use crate::storage::candidates;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// The pipeline worker loop.
pub struct Runner {
    ctx: PipelineContext,
}

impl Runner {
    /// Create a runner over the given context.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Run the polling loop until cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        let poll_interval = self.ctx.worker.poll_interval();
        let stuck_threshold = self.ctx.worker.stuck_threshold();
        let sweep_interval = stuck_threshold / 2;

        tracing::info!(
            poll_interval_secs = poll_interval.as_secs(),
            max_retries = self.ctx.worker.max_retries,
            "pipeline runner started"
        );

        let mut last_sweep = Instant::now();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if last_sweep.elapsed() >= sweep_interval {
                match queue::reset_stuck(&self.ctx.pool, stuck_threshold).await {
                    Ok(0) => {}
                    Ok(count) => {
                        tracing::warn!(count, "reset stuck RUNNING items back to READY");
                    }
                    Err(e) => tracing::warn!(error = %e, "stuck-item sweep failed"),
                }
                last_sweep = Instant::now();
            }

            match queue::lease_next(&self.ctx.pool).await {
                Ok(Some(item)) => {
                    self.process(&item).await;
                }
                Ok(None) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "queue poll failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!("pipeline runner stopped");
    }

    /// Lease and process at most one item. Returns the processed queue id,
    /// or `None` when the queue was empty.
    pub async fn run_once(&self) -> Result<Option<String>, StorageError> {
        match queue::lease_next(&self.ctx.pool).await? {
            Some(item) => {
                let queue_id = item.queue_id.clone();
                self.process(&item).await;
                Ok(Some(queue_id))
            }
            None => Ok(None),
        }
    }

    /// Execute one leased item and commit the outcome.
    async fn process(&self, item: &QueueItem) {
        tracing::info!(
            queue_id = %item.queue_id,
            candidate_id = %item.candidate_id,
            stage = %item.job_type,
            attempt = item.attempts,
            "processing queue item"
        );

        if let Err(e) = candidates::mark_processing(&self.ctx.pool, &item.candidate_id).await {
            tracing::warn!(error = %e, "failed to mark candidate processing");
        }

        let Some(stage) = item.stage() else {
            let err = StageError::InputMissing {
                what: format!("handler for job type '{}'", item.job_type),
            };
            self.commit_failure(item, &err).await;
            return;
        };

        match run_stage(&self.ctx, stage, &item.candidate_id).await {
            Ok(()) => self.commit_success(item, stage).await,
            Err(e) => self.commit_failure(item, &e).await,
        }
    }

    async fn commit_success(&self, item: &QueueItem, stage: Stage) {
        if let Err(e) = queue::complete(&self.ctx.pool, &item.queue_id).await {
            tracing::error!(queue_id = %item.queue_id, error = %e, "failed to mark item done");
            return;
        }

        tracing::info!(queue_id = %item.queue_id, stage = %stage, "queue item completed");

        if let Some(next) = stage.successor() {
            match queue::enqueue(&self.ctx.pool, &item.candidate_id, next).await {
                Ok(queue_id) => {
                    tracing::info!(
                        candidate_id = %item.candidate_id,
                        stage = %next,
                        queue_id = %queue_id,
                        "enqueued successor stage"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        candidate_id = %item.candidate_id,
                        stage = %next,
                        error = %e,
                        "failed to enqueue successor stage"
                    );
                }
            }
        }
    }

    async fn commit_failure(&self, item: &QueueItem, err: &StageError) {
        let message = err.to_string();
        tracing::error!(
            queue_id = %item.queue_id,
            candidate_id = %item.candidate_id,
            error = %message,
            "stage failed"
        );

        if let Err(e) = queue::fail(&self.ctx.pool, &item.queue_id, &message).await {
            tracing::error!(queue_id = %item.queue_id, error = %e, "failed to mark item failed");
        }

        // Missing score config cannot heal through retries; everything else
        // projects onto the candidate only once attempts are exhausted.
        let fatal = matches!(err, StageError::ConfigMissing)
            || item.attempts >= i64::from(self.ctx.worker.max_retries);

        if fatal {
            tracing::error!(
                queue_id = %item.queue_id,
                attempts = item.attempts,
                max_retries = self.ctx.worker.max_retries,
                "projecting failure onto candidate"
            );
            if let Err(e) =
                candidates::mark_error(&self.ctx.pool, &item.candidate_id, &message).await
            {
                tracing::error!(
                    candidate_id = %item.candidate_id,
                    error = %e,
                    "failed to mark candidate errored"
                );
            }
        }
    }
}
