//! Sparse Merkle commitment over record fingerprints.
//!
//! This module provides:
//! - Native tree maintenance and witness extraction
//! - Slot paths (flat sibling/direction arrays) and root recomputation
//! - Membership and non-membership checks, natively and in-circuit

mod error;
mod gadgets;
mod path;
mod tree;


use ark_bn254::Fr;
use ark_ff::{MontFp, Zero};

pub use error::SmtError;
pub use gadgets::{compute_root_var, enforce_membership, enforce_non_membership, SlotPathVar};
pub use path::{PathStep, SlotPath};
pub use tree::SparseMerkleTree;

/// Height of the registry tree. Every witness carries exactly this many
/// steps and the circuits are compiled for it; changing it invalidates all
/// issued witnesses and keys.
pub const MERKLE_HEIGHT: usize = 20;

/// Leaf value of an unoccupied slot.
pub const EMPTY_LEAF: Fr = MontFp!("0");

/// Native membership check: `leaf` sits at the path's index under `root`.
pub fn is_member(root: Fr, leaf: Fr, path: &SlotPath) -> bool {
    path.calculate_root(leaf) == root
}

/// Native non-membership check: the path's slot is empty under `root`.
pub fn is_vacant(root: Fr, path: &SlotPath) -> bool {
    is_member(root, EMPTY_LEAF, path)
}

/// Whether `value` is the reserved empty-slot sentinel.
pub fn is_empty_leaf(value: &Fr) -> bool {
    value.is_zero()
}
