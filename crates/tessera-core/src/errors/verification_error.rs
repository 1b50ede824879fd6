use crate::tile::MarkKind;

/// Verification mark errors.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("mark regression rejected on tile {tile_id}: {current} -> {proposed}")]
    MarkRegression {
        tile_id: String,
        current: MarkKind,
        proposed: MarkKind,
    },

    #[error("caller {caller} is not authenticated")]
    Unauthenticated { caller: String },

    #[error("mark {proposed} is not justified by the verification history of tile {tile_id}")]
    Unjustified { tile_id: String, proposed: MarkKind },
}
