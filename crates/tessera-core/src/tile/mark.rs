use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::VerificationError;

/// Trust label attached to a tile.
///
/// Declaration order is the total order: `None < Community < Expert < MultiExpert`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    #[default]
    None,
    Community,
    Expert,
    MultiExpert,
}

impl MarkKind {
    pub const ALL: [MarkKind; 4] = [
        MarkKind::None,
        MarkKind::Community,
        MarkKind::Expert,
        MarkKind::MultiExpert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkKind::None => "none",
            MarkKind::Community => "community",
            MarkKind::Expert => "expert",
            MarkKind::MultiExpert => "multi_expert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(MarkKind::None),
            "community" => Some(MarkKind::Community),
            "expert" => Some(MarkKind::Expert),
            "multi_expert" => Some(MarkKind::MultiExpert),
            _ => None,
        }
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reviewer's verification of a tile. Reviewers are referenced by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub verifier_id: String,
    pub is_expert: bool,
    pub verified_at: DateTime<Utc>,
}

/// The current trust mark of a tile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerificationMark {
    pub kind: MarkKind,
    /// Number of distinct verifiers that contributed.
    pub verifier_count: u32,
    pub last_verifier_id: Option<String>,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl VerificationMark {
    /// Move the mark to `proposed`, rejecting any step backward in the total order.
    ///
    /// Re-proposing the current kind is accepted and leaves `kind` unchanged.
    pub fn advance_to(&mut self, tile_id: &str, proposed: MarkKind) -> Result<(), VerificationError> {
        if proposed < self.kind {
            return Err(VerificationError::MarkRegression {
                tile_id: tile_id.to_string(),
                current: self.kind,
                proposed,
            });
        }
        self.kind = proposed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_totally_ordered() {
        assert!(MarkKind::None < MarkKind::Community);
        assert!(MarkKind::Community < MarkKind::Expert);
        assert!(MarkKind::Expert < MarkKind::MultiExpert);
    }

    #[test]
    fn advance_rejects_regression_and_keeps_kind() {
        let mut mark = VerificationMark {
            kind: MarkKind::Expert,
            ..Default::default()
        };
        let err = mark.advance_to("t1", MarkKind::Community).unwrap_err();
        assert!(matches!(err, VerificationError::MarkRegression { .. }));
        assert_eq!(mark.kind, MarkKind::Expert);

        mark.advance_to("t1", MarkKind::MultiExpert).unwrap();
        assert_eq!(mark.kind, MarkKind::MultiExpert);
    }

    #[test]
    fn parse_round_trips_names() {
        for kind in MarkKind::ALL {
            assert_eq!(MarkKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MarkKind::parse("gold"), None);
    }
}
