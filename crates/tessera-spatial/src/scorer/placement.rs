use chrono::{DateTime, Utc};

use tessera_core::config::DomainSchema;
use tessera_core::tile::{AxisInputs, Coordinates, KnowledgeTile, NewTile};
use tessera_core::traits::IAxisScorer;

/// Build a version-1 tile from a draft, computing its coordinate once from
/// cheap heuristics: content length for granularity, initial review state
/// (or an explicit value) for the certainty start.
pub fn place_new_tile(
    scorer: &dyn IAxisScorer,
    new: NewTile,
    schema: &DomainSchema,
    now: DateTime<Utc>,
) -> KnowledgeTile {
    let inputs = AxisInputs {
        initial_certainty: 0.0,
        initial_review: new.initial_review,
        external_sources: new.external_sources,
        time_stability: new.time_stability.clamp(0.0, 1.0),
    };
    let start = scorer.initial_certainty(new.certainty, &inputs, schema.certainty_range);
    let granularity = match new.granularity {
        Some(explicit) => schema.granularity_range.clamp(explicit),
        None => scorer.granularity(&new.content, schema.granularity_range),
    };
    let placeholder = Coordinates::new(start, granularity, schema.verification_range.min);

    let mut tile = KnowledgeTile::from_new(new, placeholder, start, now);
    tile.coordinates = recompute_coordinates(scorer, &tile, schema);
    tile
}

/// Recompute certainty and verification from the tile's inputs and history.
///
/// Granularity only follows content; it is kept here and clamped.
pub fn recompute_coordinates(
    scorer: &dyn IAxisScorer,
    tile: &KnowledgeTile,
    schema: &DomainSchema,
) -> Coordinates {
    Coordinates::new(
        scorer.certainty(tile, schema.certainty_range),
        schema.granularity_range.clamp(tile.coordinates.granularity),
        scorer.verification(tile, schema.verification_range),
    )
}

/// Granularity for replaced content.
pub fn regranulate(scorer: &dyn IAxisScorer, content: &str, schema: &DomainSchema) -> f64 {
    scorer.granularity(content, schema.granularity_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::WeightedAxisScorer;
    use test_fixtures::fixed_now;

    fn draft(content: &str) -> NewTile {
        NewTile {
            domain: "general".into(),
            topic: "t".into(),
            content: content.into(),
            ..NewTile::default()
        }
    }

    #[test]
    fn new_tile_gets_heuristic_coordinates() {
        let scorer = WeightedAxisScorer::default();
        let tile = place_new_tile(&scorer, draft("one two three four"), &DomainSchema::default(), fixed_now());
        assert_eq!(tile.coordinates, Coordinates::new(10.0, 200.0, 50.0));
        assert_eq!(tile.axis_inputs.initial_certainty, 10.0);
        assert_eq!(tile.version, 1);
    }

    #[test]
    fn explicit_values_override_heuristics() {
        let scorer = WeightedAxisScorer::default();
        let new = NewTile {
            certainty: Some(25.0),
            granularity: Some(33.0),
            ..draft("short")
        };
        let tile = place_new_tile(&scorer, new, &DomainSchema::default(), fixed_now());
        assert_eq!(tile.coordinates.certainty, 25.0);
        assert_eq!(tile.coordinates.granularity, 33.0);
    }

    #[test]
    fn recompute_keeps_granularity() {
        let scorer = WeightedAxisScorer::default();
        let mut tile = place_new_tile(&scorer, draft("a b"), &DomainSchema::default(), fixed_now());
        tile.coordinates.granularity = 42.0;
        let point = recompute_coordinates(&scorer, &tile, &DomainSchema::default());
        assert_eq!(point.granularity, 42.0);
    }
}
