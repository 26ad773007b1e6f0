//! Nested verification capability.
//!
//! The registry contract accepts proofs produced by other parties as part of
//! its own checks. It does so through [`NestedVerifier`] so the contract
//! does not depend on how proofs are checked.

use std::sync::Arc;

use crate::artifact::ProofArtifact;
use crate::setup::CircuitKeys;
use crate::verify::{verify_artifact, verify_batch, VerifyError, VerifyingKeys};

/// Verify a previously generated proof inside another check.
pub trait NestedVerifier: Send + Sync {
    fn verify_nested(&self, artifact: &ProofArtifact) -> Result<bool, VerifyError>;
}

impl<T: NestedVerifier + ?Sized> NestedVerifier for Arc<T> {
    fn verify_nested(&self, artifact: &ProofArtifact) -> Result<bool, VerifyError> {
        (**self).verify_nested(artifact)
    }
}

/// Groth16 over BN254 with a fixed set of verifying keys.
#[derive(Clone, Debug)]
pub struct Groth16Backend {
    keys: VerifyingKeys,
}

impl Groth16Backend {
    pub fn new(keys: VerifyingKeys) -> Self {
        Self { keys }
    }

    pub fn from_keys(keys: &CircuitKeys) -> Self {
        Self::new(keys.verifying_keys())
    }

    pub fn verifying_keys(&self) -> &VerifyingKeys {
        &self.keys
    }

    pub fn verify_all(&self, artifacts: &[ProofArtifact]) -> Vec<Result<bool, VerifyError>> {
        verify_batch(&self.keys, artifacts)
    }
}

impl NestedVerifier for Groth16Backend {
    fn verify_nested(&self, artifact: &ProofArtifact) -> Result<bool, VerifyError> {
        verify_artifact(&self.keys, artifact)
    }
}
