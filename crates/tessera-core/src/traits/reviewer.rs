use serde::{Deserialize, Serialize};

use crate::errors::VerificationError;

/// An authenticated reviewer as seen by the mark manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifierIdentity {
    pub verifier_id: String,
    /// Authenticated as an expert for the tile's domain.
    pub is_expert: bool,
}

impl VerifierIdentity {
    pub fn expert(verifier_id: impl Into<String>) -> Self {
        Self {
            verifier_id: verifier_id.into(),
            is_expert: true,
        }
    }

    pub fn community(verifier_id: impl Into<String>) -> Self {
        Self {
            verifier_id: verifier_id.into(),
            is_expert: false,
        }
    }
}

/// Resolves an authenticated caller to a verifier identity. Authentication itself
/// happens outside the core.
pub trait IReviewerProvider: Send + Sync {
    fn resolve(&self, caller: &str, domain: &str) -> Result<VerifierIdentity, VerificationError>;
}
