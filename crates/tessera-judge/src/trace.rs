//! Ordered record of the states a request visited.

use serde::{Deserialize, Serialize};

use crate::result::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Routing,
    Generating,
    Verifying,
    Correcting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub state: PipelineState,
    /// Provider calls made when the state was entered.
    pub attempt: u32,
    pub lane: Lane,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    steps: Vec<TraceStep>,
}

impl PipelineTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, state: PipelineState, attempt: u32, lane: Lane) {
        self.steps.push(TraceStep {
            state,
            attempt,
            lane,
            note: None,
        });
    }

    pub fn enter_with_note(
        &mut self,
        state: PipelineState,
        attempt: u32,
        lane: Lane,
        note: impl Into<String>,
    ) {
        self.steps.push(TraceStep {
            state,
            attempt,
            lane,
            note: Some(note.into()),
        });
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn states(&self) -> Vec<PipelineState> {
        self.steps.iter().map(|s| s.state).collect()
    }

    pub fn count(&self, state: PipelineState) -> usize {
        self.steps.iter().filter(|s| s.state == state).count()
    }

    pub fn last(&self) -> Option<&TraceStep> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
