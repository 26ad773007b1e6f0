//! Signed proof envelopes.
//!
//! An envelope carries a proof artifact together with the identity that
//! vouches for it. The signature covers the artifact's field encoding, so a
//! verifier checks who produced the proof without re-running it.

use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mvs_prover::{ArtifactError, NestedVerifier, ProofArtifact, VerifyError};

use crate::identity::{signature_hex, Identity, IdentityError, IdentitySigner};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("artifact encoding failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Signature(#[from] IdentityError),
    #[error("nested proof could not be checked: {0}")]
    Verification(#[from] VerifyError),
    #[error("nested proof is invalid")]
    ProofRejected,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedProofEnvelope {
    pub artifact: ProofArtifact,
    pub signer: Identity,
    #[serde(with = "signature_hex")]
    pub signature: Signature,
}

impl SignedProofEnvelope {
    /// Sign `artifact` with `signer`.
    pub fn seal(signer: &IdentitySigner, artifact: ProofArtifact) -> Result<Self, EnvelopeError> {
        let message = artifact.field_bytes()?;
        Ok(Self {
            signature: signer.sign(&message),
            signer: signer.identity(),
            artifact,
        })
    }

    /// Check the signature only.
    pub fn verify_signature(&self) -> Result<(), EnvelopeError> {
        let message = self.artifact.field_bytes()?;
        self.signer.verify(&message, &self.signature)?;
        Ok(())
    }

    /// Check the signature, then the nested proof.
    pub fn open(&self, verifier: &dyn NestedVerifier) -> Result<&ProofArtifact, EnvelopeError> {
        self.verify_signature()?;
        if !verifier.verify_nested(&self.artifact)? {
            return Err(EnvelopeError::ProofRejected);
        }
        Ok(&self.artifact)
    }
}
