//! The per-request state machine.
//!
//! ```text
//! ROUTING -> GENERATING -> VERIFYING -> DONE(passed)
//!                ^              |
//!                |          (failed, attempts < max)
//!                |              v
//!                +-------- CORRECTING
//!                               |
//!                       (attempts == max) -> DONE(exhausted)
//! ```
//!
//! The provider call is the only suspension point. It races a timeout and the
//! request's cancellation token; dropping the losing future abandons the call.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use tessera_core::config::{DomainSchema, JudgeConfig};
use tessera_core::constants::MAX_ATTEMPTS_CEILING;
use tessera_core::errors::JudgeError;
use tessera_core::tile::Coordinates;
use tessera_core::tracing_setup::events;
use tessera_core::traits::{
    Cancellable, CancellationToken, ComplexityEstimate, ContextTile, GenerationRequest,
    IComplexityEstimator, IGenerationProvider, ITileRetriever, Retrieval,
};

use crate::corrections;
use crate::result::{CitedTile, JudgeResult, Lane, Verdict};
use crate::trace::{PipelineState, PipelineTrace};
use crate::verifier::{Verification, Verifier};

/// Judge pipeline over one generation provider.
pub struct JudgePipeline<P> {
    provider: Arc<P>,
    retriever: Arc<dyn ITileRetriever>,
    estimator: Arc<dyn IComplexityEstimator>,
    verifier: Verifier,
    config: JudgeConfig,
}

impl<P> std::fmt::Debug for JudgePipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgePipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Everything retrieval produced for the advanced lane.
#[derive(Default)]
struct Grounding {
    query_point: Option<Coordinates>,
    cited: Vec<CitedTile>,
    context: Vec<ContextTile>,
}

/// Mutable state carried across iterations of one request.
struct Run<'a> {
    request_id: String,
    question: &'a str,
    schema: &'a DomainSchema,
    routing: ComplexityEstimate,
    routed_lane: Lane,
    lane: Lane,
    grounding: Grounding,
    attempts: u32,
    instruction: Option<String>,
    last: Option<(String, Verification)>,
    trace: PipelineTrace,
}

fn ensure_live(cancel: &CancellationToken, stage: &str) -> Result<(), JudgeError> {
    if cancel.is_cancelled() {
        return Err(JudgeError::Cancelled {
            stage: stage.to_string(),
        });
    }
    Ok(())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

impl<P: IGenerationProvider> JudgePipeline<P> {
    pub fn new(
        provider: Arc<P>,
        retriever: Arc<dyn ITileRetriever>,
        estimator: Arc<dyn IComplexityEstimator>,
        config: JudgeConfig,
    ) -> Self {
        Self {
            provider,
            retriever,
            estimator,
            verifier: Verifier::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Provider calls allowed per request.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.clamp(1, MAX_ATTEMPTS_CEILING)
    }

    /// Routing decision for a question. Looks at the question only.
    pub fn route(&self, question: &str, schema: &DomainSchema) -> (ComplexityEstimate, Lane) {
        let estimate = self.estimator.estimate(question, schema);
        let lane = if estimate.complexity >= self.config.complexity_threshold {
            Lane::Advanced
        } else {
            Lane::Basic
        };
        (estimate, lane)
    }

    /// Run one question to a verdict.
    ///
    /// Returns `Err` only for cancellation, retrieval failure, or an
    /// unexpected provider error; failed verification ends in
    /// [`Verdict::Exhausted`].
    pub async fn judge(
        &self,
        question: &str,
        schema: &DomainSchema,
        cancel: &CancellationToken,
    ) -> Result<JudgeResult, JudgeError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tessera_core::judge_span!(request_id, schema.code);
        self.run(request_id, question, schema, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        request_id: String,
        question: &str,
        schema: &DomainSchema,
        cancel: &CancellationToken,
    ) -> Result<JudgeResult, JudgeError> {
        let (routing, lane) = self.route(question, schema);
        let mut trace = PipelineTrace::new();
        trace.enter_with_note(
            PipelineState::Routing,
            0,
            lane,
            format!(
                "complexity {:.2}, domain_fit {:.2}",
                routing.complexity, routing.domain_fit
            ),
        );
        tracing::debug!(
            complexity = routing.complexity,
            domain_fit = routing.domain_fit,
            lane = lane.as_str(),
            "routed"
        );
        ensure_live(cancel, "routing")?;

        let grounding = match lane {
            Lane::Advanced => self.ground(question, schema)?,
            Lane::Basic => Grounding::default(),
        };

        let mut run = Run {
            request_id,
            question,
            schema,
            routing,
            routed_lane: lane,
            lane,
            grounding,
            attempts: 0,
            instruction: None,
            last: None,
            trace,
        };
        self.drive(&mut run, cancel).await
    }

    fn ground(&self, question: &str, schema: &DomainSchema) -> Result<Grounding, JudgeError> {
        let Retrieval { query_point, tiles } = self
            .retriever
            .retrieve(question, &schema.code, self.config.retrieval_k)
            .map_err(|e| JudgeError::RetrievalFailed {
                reason: e.to_string(),
            })?;
        let cited = tiles
            .iter()
            .map(|r| CitedTile {
                tile_id: r.tile.id.clone(),
                distance: r.distance,
            })
            .collect();
        let context = tiles
            .into_iter()
            .map(|r| ContextTile {
                content: truncate_chars(&r.tile.content, self.config.max_context_chars),
                tile_id: r.tile.id,
                topic: r.tile.topic,
                certainty: r.tile.coordinates.certainty,
            })
            .collect();
        Ok(Grounding {
            query_point: Some(query_point),
            cited,
            context,
        })
    }

    async fn drive(
        &self,
        run: &mut Run<'_>,
        cancel: &CancellationToken,
    ) -> Result<JudgeResult, JudgeError> {
        let max_attempts = self.max_attempts();
        // Failed provider calls in the basic lane get one retry.
        let mut basic_failures = 0u32;

        loop {
            run.attempts += 1;
            run.trace
                .enter(PipelineState::Generating, run.attempts, run.lane);

            let request = GenerationRequest {
                prompt: run.question.to_string(),
                domain: run.schema.code.clone(),
                context: match run.lane {
                    Lane::Advanced => run.grounding.context.clone(),
                    Lane::Basic => Vec::new(),
                },
                corrective_instruction: run.instruction.clone(),
                attempt: run.attempts,
            };

            let (text, self_confidence) = match self.generate(request, cancel).await {
                Ok(output) => output,
                Err(err @ JudgeError::GenerationTimeout { .. })
                | Err(err @ JudgeError::ProviderFailed { .. }) => {
                    let timed_out = matches!(err, JudgeError::GenerationTimeout { .. });
                    tracing::warn!(attempt = run.attempts, error = %err, "generation failed");

                    if timed_out && run.lane == Lane::Advanced && self.config.downgrade_on_timeout
                    {
                        run.lane = Lane::Basic;
                        events::judge_degraded(
                            &run.request_id,
                            "generation timed out, downgraded to basic lane",
                        );
                        run.trace.enter_with_note(
                            PipelineState::Routing,
                            run.attempts,
                            run.lane,
                            "downgraded after timeout",
                        );
                    } else {
                        basic_failures += 1;
                    }

                    if run.attempts >= max_attempts || basic_failures > 1 {
                        events::judge_degraded(&run.request_id, "no answer within attempts");
                        return Ok(self.finish(run, Verdict::Exhausted));
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };
            ensure_live(cancel, "generating")?;

            run.trace
                .enter(PipelineState::Verifying, run.attempts, run.lane);
            let verification = self.verifier.verify(
                run.lane,
                &text,
                run.schema,
                &run.grounding.context,
                self_confidence,
            );
            tracing::debug!(
                attempt = run.attempts,
                confidence = verification.confidence,
                passed = verification.passed,
                "verified"
            );

            if verification.passed {
                run.last = Some((text, verification));
                return Ok(self.finish(run, Verdict::Passed));
            }
            ensure_live(cancel, "verifying")?;

            if run.attempts >= max_attempts {
                run.last = Some((text, verification));
                events::judge_degraded(&run.request_id, "verification attempts exhausted");
                return Ok(self.finish(run, Verdict::Exhausted));
            }

            run.trace
                .enter(PipelineState::Correcting, run.attempts, run.lane);
            run.instruction = Some(corrections::build_instruction(run.question, &verification));
            run.last = Some((text, verification));
        }
    }

    /// One bounded provider call. Consumes at most `max_chunks` chunks.
    async fn generate(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<f64>), JudgeError> {
        let timeout_ms = self.config.generation_timeout_ms;
        let call = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.provider.generate(request),
        );

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(JudgeError::Cancelled { stage: "generating".to_string() });
            }
            outcome = call => match outcome {
                Ok(result) => result?,
                Err(_) => return Err(JudgeError::GenerationTimeout { timeout_ms }),
            },
        };

        let self_confidence = output.self_confidence.map(|c| c.clamp(0.0, 1.0));
        let mut text = String::new();
        for chunk in output.chunks.take(self.config.max_chunks) {
            if cancel.is_cancelled() {
                break;
            }
            text.push_str(&chunk);
        }
        Ok((text, self_confidence))
    }

    /// Assemble the result from the last verified candidate. Scores and
    /// confidence always describe that candidate; zero when there is none.
    fn finish(&self, run: &mut Run<'_>, verdict: Verdict) -> JudgeResult {
        run.trace.enter_with_note(
            PipelineState::Done,
            run.attempts,
            run.lane,
            verdict.as_str(),
        );

        let (candidate, verification) = match run.last.take() {
            Some((text, v)) => (Some(text), Some(v)),
            None => (None, None),
        };
        let confidence = verification
            .as_ref()
            .map_or(0.0, |v| v.confidence)
            .clamp(0.0, 1.0);

        events::judge_finished(&run.request_id, verdict.as_str(), run.attempts, confidence);

        let (factual, consistency, hallucination_risk, issues) = match verification {
            Some(v) => (v.factual, Some(v.consistency), v.risk, v.issues),
            None => (None, None, None, Vec::new()),
        };

        JudgeResult {
            request_id: run.request_id.clone(),
            domain: run.schema.code.clone(),
            routing: run.routing,
            lane: run.routed_lane,
            final_lane: run.lane,
            query_point: run.grounding.query_point,
            retrieved: std::mem::take(&mut run.grounding.cited),
            candidate,
            factual,
            consistency,
            confidence,
            hallucination_risk,
            issues,
            attempts: run.attempts,
            verdict,
            trace: std::mem::take(&mut run.trace),
        }
    }
}
