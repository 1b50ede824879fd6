//! Property tests: marks never move backward, whatever the verification order.

use std::sync::Arc;

use proptest::prelude::*;

use tessera_core::config::{MarksConfig, SpatialConfig};
use tessera_core::tile::MarkKind;
use tessera_core::traits::{ITileStorage, VerifierIdentity};
use tessera_marks::VerificationManager;
use tessera_spatial::{SpatialIndex, WeightedAxisScorer};
use test_fixtures::{MemoryTileStorage, TileBuilder};

proptest! {
    #[test]
    fn mark_and_certainty_are_monotonic(
        steps in prop::collection::vec((0u8..5, any::<bool>()), 1..30),
        proposals in prop::collection::vec(0usize..4, 0..5),
    ) {
        let tile = TileBuilder::new("p").coordinates(20.0, 100.0, 50.0).build();
        let storage = Arc::new(MemoryTileStorage::with_tiles(vec![tile.clone()]));
        let spatial = Arc::new(SpatialIndex::new(&SpatialConfig::default()).unwrap());
        spatial.upsert(&tile).unwrap();
        let manager = VerificationManager::new(
            Arc::clone(&storage) as Arc<dyn ITileStorage>,
            spatial,
            Arc::new(WeightedAxisScorer::default()),
            MarksConfig::default(),
        );

        let mut kind = MarkKind::None;
        let mut certainty = tile.coordinates.certainty;
        for (who, expert) in steps {
            let verifier = VerifierIdentity {
                verifier_id: format!("{}-{who}", if expert { "dr" } else { "reader" }),
                is_expert: expert,
            };
            let outcome = manager.apply_verification(&tile.id, &verifier).unwrap();
            prop_assert!(outcome.mark().kind >= kind);
            prop_assert!(outcome.tile.coordinates.certainty >= certainty);
            prop_assert!((0.0..=1.0).contains(&outcome.tile.confidence.value()));
            kind = outcome.mark().kind;
            certainty = outcome.tile.coordinates.certainty;
        }

        for p in proposals {
            let proposed = MarkKind::ALL[p];
            let result = manager.propose_mark(&tile.id, proposed, &VerifierIdentity::community("admin"));
            if proposed < kind {
                prop_assert!(result.is_err());
            }
            let stored = storage.get(&tile.id).unwrap();
            prop_assert!(stored.verification.kind >= kind);
            kind = stored.verification.kind;
        }
    }
}
