use serde::{Deserialize, Serialize};

use tessera_core::tile::{Coordinates, TileId};
use tessera_core::traits::ComplexityEstimate;

use crate::trace::PipelineTrace;
use crate::verifier::{HallucinationRisk, Issue};

/// Verification lane chosen at routing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Basic,
    Advanced,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

/// Terminal state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Exhausted,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Exhausted => "exhausted",
        }
    }
}

/// A retrieved tile handed to the provider as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedTile {
    pub tile_id: TileId,
    pub distance: f64,
}

/// Outcome of one judge request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    pub request_id: String,
    pub domain: String,
    pub routing: ComplexityEstimate,
    /// Lane routing selected. A timeout may downgrade `final_lane`.
    pub lane: Lane,
    pub final_lane: Lane,
    /// Present only when retrieval ran.
    pub query_point: Option<Coordinates>,
    pub retrieved: Vec<CitedTile>,
    /// Last generated answer. `None` if every provider call failed.
    pub candidate: Option<String>,
    /// Advanced lane only.
    pub factual: Option<f64>,
    pub consistency: Option<f64>,
    /// In [0, 1].
    pub confidence: f64,
    /// Advanced lane only.
    pub hallucination_risk: Option<HallucinationRisk>,
    /// Issues found in the last candidate.
    pub issues: Vec<Issue>,
    /// Provider calls made, never above `max_attempts`.
    pub attempts: u32,
    pub verdict: Verdict,
    pub trace: PipelineTrace,
}

impl JudgeResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}
