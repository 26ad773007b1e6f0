//! ZK circuits and Merkle commitment for the user record registry.
//!
//! This crate provides:
//! - `poseidon`: the hash used for fingerprints and Merkle nodes
//! - `schema`: record types and their field encoding
//! - `smt`: sparse Merkle commitment, natively and as R1CS gadgets
//! - `InsertionValidityCircuit`: prove a slot is empty and admission passed
//! - `MembershipCircuit`: prove a fingerprint is committed under a root

pub mod insertion;
pub mod membership;
pub mod poseidon;
pub mod schema;
pub mod smt;

#[cfg(test)]
mod tests;

pub use insertion::InsertionValidityCircuit;
pub use membership::MembershipCircuit;
pub use poseidon::{hash_many, hash_two, poseidon_config};
pub use schema::{
    BoundedString, ProofRecord, PublicKeyBytes, Schema, SchemaError, UserData, UserSession,
};
pub use smt::{
    is_empty_leaf, is_member, is_vacant, PathStep, SlotPath, SmtError, SparseMerkleTree, EMPTY_LEAF,
    MERKLE_HEIGHT,
};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
