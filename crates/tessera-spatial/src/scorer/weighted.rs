use std::collections::HashSet;

use tessera_core::config::{AxisRange, AxisWeights};
use tessera_core::tile::{AxisInputs, KnowledgeTile};
use tessera_core::traits::IAxisScorer;

use super::granularity::granularity_for_words;

/// Minimum number of distinct expert reviewers for full consensus.
const CONSENSUS_QUORUM: usize = 2;

/// Default scorer: weighted sum of the tile's axis inputs and verification
/// history, clamped to the domain range.
#[derive(Debug, Clone, Default)]
pub struct WeightedAxisScorer {
    weights: AxisWeights,
}

impl WeightedAxisScorer {
    pub fn new(weights: AxisWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &AxisWeights {
        &self.weights
    }

    /// Sum of per-verifier increments, one per distinct verifier, each capped.
    fn reviewer_increment(&self, tile: &KnowledgeTile) -> f64 {
        let mut seen = HashSet::new();
        tile.verification_history
            .iter()
            .filter(|e| seen.insert(e.verifier_id.as_str()))
            .map(|e| {
                let weight = if e.is_expert {
                    self.weights.per_expert
                } else {
                    self.weights.per_community
                };
                weight.min(self.weights.per_reviewer_cap).max(0.0)
            })
            .sum()
    }
}

/// 1.0 once at least two distinct experts have reviewed the tile, else 0.0.
pub fn consensus(tile: &KnowledgeTile) -> f64 {
    let experts: HashSet<&str> = tile.expert_ids().into_iter().collect();
    if experts.len() >= CONSENSUS_QUORUM {
        1.0
    } else {
        0.0
    }
}

impl IAxisScorer for WeightedAxisScorer {
    fn initial_certainty(&self, explicit: Option<f64>, inputs: &AxisInputs, range: AxisRange) -> f64 {
        let start = match explicit {
            Some(value) => value,
            None if inputs.initial_review => self.weights.initial_review,
            None => self.weights.unreviewed_start,
        };
        range.clamp(start)
    }

    fn granularity(&self, content: &str, range: AxisRange) -> f64 {
        range.clamp(granularity_for_words(content.split_whitespace().count()))
    }

    fn certainty(&self, tile: &KnowledgeTile, range: AxisRange) -> f64 {
        let inputs = &tile.axis_inputs;
        let raw = inputs.initial_certainty
            + self.reviewer_increment(tile)
            + inputs.external_sources as f64 * self.weights.per_external_source
            + inputs.time_stability.clamp(0.0, 1.0) * self.weights.time_stability
            + consensus(tile) * self.weights.consensus;
        let current = range.clamp(tile.coordinates.certainty);
        range.clamp(raw).max(current)
    }

    fn verification(&self, tile: &KnowledgeTile, range: AxisRange) -> f64 {
        let raw = self.weights.verification_base
            + tile.axis_inputs.external_sources as f64 * self.weights.verification_per_source
            + consensus(tile) * self.weights.verification_consensus;
        range.clamp(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::TileBuilder;

    const CERTAINTY: AxisRange = AxisRange::new(0.0, 100.0);

    #[test]
    fn start_value_follows_initial_review() {
        let scorer = WeightedAxisScorer::default();
        let reviewed = AxisInputs {
            initial_review: true,
            ..AxisInputs::default()
        };
        assert_eq!(scorer.initial_certainty(None, &reviewed, CERTAINTY), 30.0);
        assert_eq!(scorer.initial_certainty(None, &AxisInputs::default(), CERTAINTY), 10.0);
        assert_eq!(scorer.initial_certainty(Some(140.0), &reviewed, CERTAINTY), 100.0);
    }

    #[test]
    fn one_expert_adds_one_capped_increment() {
        let scorer = WeightedAxisScorer::default();
        let tile = TileBuilder::new("a")
            .coordinates(25.0, 33.0, 50.0)
            .verified_by("dr-1", true)
            .build();
        assert_eq!(scorer.certainty(&tile, CERTAINTY), 45.0);
    }

    #[test]
    fn per_reviewer_cap_bounds_heavy_weights() {
        let scorer = WeightedAxisScorer::new(AxisWeights {
            per_expert: 80.0,
            per_reviewer_cap: 15.0,
            ..AxisWeights::default()
        });
        let tile = TileBuilder::new("a")
            .coordinates(10.0, 33.0, 50.0)
            .verified_by("dr-1", true)
            .build();
        assert_eq!(scorer.certainty(&tile, CERTAINTY), 25.0);
    }

    #[test]
    fn two_experts_reach_consensus() {
        let scorer = WeightedAxisScorer::default();
        let tile = TileBuilder::new("a")
            .coordinates(10.0, 33.0, 50.0)
            .verified_by("dr-1", true)
            .verified_by("dr-2", true)
            .build();
        assert_eq!(consensus(&tile), 1.0);
        // 10 + 20 + 20 + 25
        assert_eq!(scorer.certainty(&tile, CERTAINTY), 75.0);
        assert_eq!(scorer.verification(&tile, AxisRange::new(0.0, 100.0)), 70.0);
    }

    #[test]
    fn certainty_never_drops_below_current() {
        let scorer = WeightedAxisScorer::default();
        let mut tile = TileBuilder::new("a").coordinates(10.0, 33.0, 50.0).build();
        tile.coordinates.certainty = 60.0;
        assert_eq!(scorer.certainty(&tile, CERTAINTY), 60.0);
    }

    #[test]
    fn certainty_is_capped_at_the_axis_maximum() {
        let scorer = WeightedAxisScorer::default();
        let mut tile = TileBuilder::new("a")
            .coordinates(90.0, 33.0, 50.0)
            .external_sources(4)
            .verified_by("dr-1", true)
            .build();
        tile.axis_inputs.time_stability = 1.0;
        assert_eq!(scorer.certainty(&tile, CERTAINTY), 100.0);
    }

    #[test]
    fn verification_axis_clamps_to_domain_range() {
        let scorer = WeightedAxisScorer::default();
        let tile = TileBuilder::new("a").external_sources(3).build();
        assert_eq!(scorer.verification(&tile, AxisRange::new(0.0, 100.0)), 65.0);
        assert_eq!(scorer.verification(&tile, AxisRange::new(0.0, 60.0)), 60.0);
    }
}
