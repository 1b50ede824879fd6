//! Bounded worker pool: one pipeline run per request, at most
//! `worker_pool_size` running at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use tessera_core::config::DomainSchema;
use tessera_core::errors::JudgeError;
use tessera_core::traits::{Cancellable, CancellationToken, IGenerationProvider};

use crate::pipeline::JudgePipeline;
use crate::result::JudgeResult;

pub struct JudgePool<P> {
    pipeline: Arc<JudgePipeline<P>>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl<P> std::fmt::Debug for JudgePool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgePool")
            .field("size", &self.size)
            .field("available", &self.permits.available_permits())
            .finish()
    }
}

/// A submitted request. Dropping the handle before the request finishes
/// cancels its token, so an abandoned request stops at its next safe point.
#[derive(Debug)]
pub struct JudgeHandle {
    cancel: CancellationToken,
    join: JoinHandle<Result<JudgeResult, JudgeError>>,
    settled: bool,
}

impl JudgeHandle {
    /// Ask the request to stop at its next safe point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(mut self) -> Result<JudgeResult, JudgeError> {
        let outcome = (&mut self.join).await;
        self.settled = true;
        match outcome {
            Ok(result) => result,
            Err(e) => Err(JudgeError::WorkerFailed {
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for JudgeHandle {
    fn drop(&mut self) {
        if !self.settled && !self.join.is_finished() {
            tracing::debug!("judge handle dropped before completion, cancelling");
            self.cancel.cancel();
        }
    }
}

impl<P> JudgePool<P>
where
    P: IGenerationProvider + 'static,
{
    pub fn new(pipeline: Arc<JudgePipeline<P>>) -> Self {
        let size = pipeline.config().worker_pool_size.max(1);
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn pipeline(&self) -> &Arc<JudgePipeline<P>> {
        &self.pipeline
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue a question. Must be called from within a tokio runtime.
    pub fn submit(&self, question: impl Into<String>, schema: DomainSchema) -> JudgeHandle {
        self.submit_with_token(question, schema, CancellationToken::new())
    }

    /// Queue a question under a caller-owned cancellation token.
    pub fn submit_with_token(
        &self,
        question: impl Into<String>,
        schema: DomainSchema,
        cancel: CancellationToken,
    ) -> JudgeHandle {
        let question = question.into();
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return Err(JudgeError::Cancelled { stage: "queued".to_string() });
                }
                permit = permits.acquire_owned() => {
                    permit.map_err(|_| JudgeError::PoolClosed)?
                }
            };
            pipeline.judge(&question, &schema, &token).await
        });

        JudgeHandle {
            cancel,
            join,
            settled: false,
        }
    }

    /// Stop admitting queued requests. Running requests finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}
