use serde::{Deserialize, Serialize};

use tessera_core::tile::{NewTile, TileId};
use tessera_judge::JudgeResult;

/// Tag carried by tiles persisted from judged answers.
pub const GENERATED_TAG: &str = "generated";
/// Characters of the question kept as the topic of a persisted answer.
const TOPIC_CHARS: usize = 120;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskOptions {
    /// Store a passed answer as a new, unreviewed tile.
    pub persist_answer: bool,
    /// Recorded as the persisted tile's contributor.
    pub contributor_id: Option<String>,
}

impl AskOptions {
    pub fn persisting() -> Self {
        Self {
            persist_answer: true,
            contributor_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskOutcome {
    pub result: JudgeResult,
    /// Id of the tile created from the answer, if any.
    pub persisted: Option<TileId>,
}

/// Draft tile for a passed answer. `None` when there is nothing to keep.
pub(crate) fn answer_draft(
    question: &str,
    result: &JudgeResult,
    options: &AskOptions,
) -> Option<NewTile> {
    if !options.persist_answer || !result.passed() {
        return None;
    }
    let content = result.candidate.as_deref()?.trim();
    if content.is_empty() {
        return None;
    }
    let topic: String = question.trim().chars().take(TOPIC_CHARS).collect();
    Some(NewTile {
        domain: result.domain.clone(),
        topic,
        content: content.to_string(),
        tags: vec![GENERATED_TAG.to_string(), result.final_lane.as_str().to_string()],
        confidence: Some(result.confidence),
        contributor_id: options.contributor_id.clone(),
        ..NewTile::default()
    })
}
