//! Proof generation library for the user record registry.
//!
//! This crate provides utilities for:
//! - Trusted setup (generating, saving and loading circuit keys)
//! - Proof generation for the insertion-validity and membership circuits
//! - Proof artifacts with byte and field encodings
//! - Verification, single and batched, and the nested verification backend

pub mod artifact;
pub mod backend;
pub mod prove;
pub mod setup;
pub mod verify;


pub use artifact::{ArtifactError, CircuitKind, ProofArtifact};
pub use backend::{Groth16Backend, NestedVerifier};
pub use prove::{prove_insertion, prove_membership, ProveError};
pub use setup::{load_or_setup, setup_all_circuits, CircuitKeyPair, CircuitKeys, SetupError};
pub use verify::{
    verify_artifact, verify_batch, verify_insertion, verify_membership, VerifyError,
    VerifyingKeys,
};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;
