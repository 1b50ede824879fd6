//! Question → query point.

use std::sync::Arc;

use tessera_core::config::{DomainSchema, SpatialConfig};
use tessera_core::tile::{Axis, Coordinates};
use tessera_core::traits::IAxisScorer;

/// Maps a question to a point in a domain's space.
///
/// Granularity follows the question's length. Certainty and verification use
/// configured defaults unless a keyword from the domain's keyword map pins them.
/// Keywords are matched case-insensitively in key order; the first hit per
/// axis wins.
#[derive(Clone)]
pub struct QueryMapper {
    scorer: Arc<dyn IAxisScorer>,
    default_certainty: f64,
    default_verification: f64,
}

impl QueryMapper {
    pub fn new(scorer: Arc<dyn IAxisScorer>, config: &SpatialConfig) -> Self {
        Self {
            scorer,
            default_certainty: config.default_query_certainty,
            default_verification: config.default_query_verification,
        }
    }

    pub fn map(&self, question: &str, schema: &DomainSchema) -> Coordinates {
        let mut point = Coordinates::new(
            self.default_certainty,
            self.scorer.granularity(question, schema.granularity_range),
            self.default_verification,
        );
        let lowered = question.to_lowercase();
        let mut pinned = [false; 3];
        for (keyword, hint) in &schema.keyword_map {
            let slot = hint.axis as usize;
            if pinned[slot] || keyword.is_empty() {
                continue;
            }
            if lowered.contains(&keyword.to_lowercase()) {
                point.set(hint.axis, hint.value);
                pinned[slot] = true;
            }
        }
        for axis in Axis::ALL {
            point.set(axis, schema.range(axis).clamp(point.get(axis)));
        }
        point
    }
}

impl std::fmt::Debug for QueryMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryMapper")
            .field("default_certainty", &self.default_certainty)
            .field("default_verification", &self.default_verification)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::WeightedAxisScorer;
    use tessera_core::config::KeywordHint;

    fn mapper() -> QueryMapper {
        QueryMapper::new(Arc::new(WeightedAxisScorer::default()), &SpatialConfig::default())
    }

    #[test]
    fn default_point_uses_question_length() {
        let point = mapper().map("what causes chest pain", &DomainSchema::default());
        assert_eq!(point, Coordinates::new(50.0, 200.0, 50.0));
    }

    #[test]
    fn keyword_pins_an_axis() {
        let mut schema = DomainSchema::new("medical");
        schema.keyword_map.insert(
            "guideline".into(),
            KeywordHint {
                axis: Axis::Certainty,
                value: 90.0,
            },
        );
        schema.keyword_map.insert(
            "overview".into(),
            KeywordHint {
                axis: Axis::Granularity,
                value: 5000.0,
            },
        );
        let point = mapper().map("Current GUIDELINE overview for sepsis", &schema);
        assert_eq!(point.certainty, 90.0);
        assert_eq!(point.granularity, 1000.0);
        assert_eq!(point.verification, 50.0);
    }

    #[test]
    fn empty_question_maps_to_minimum_granularity() {
        let point = mapper().map("   ", &DomainSchema::default());
        assert_eq!(point.granularity, 1.0);
    }
}
