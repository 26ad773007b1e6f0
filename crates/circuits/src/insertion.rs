//! Insertion-validity circuit.
//!
//! Proves that a slot path leads to an empty slot under a committed root
//! and that the admission check attached to the request came out positive.
//!
//! Public inputs: the slot path (siblings, then direction bits)
//! Private inputs: committed root, admission check result
//!
//! The root is private so a verifier learns which slot is being claimed but
//! has to compare the path against its own current root.

use ark_bn254::Fr;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::smt::{enforce_non_membership, is_vacant, SlotPath, SlotPathVar, MERKLE_HEIGHT};

#[derive(Clone)]
pub struct InsertionValidityCircuit {
    /// Path to the slot being claimed (public)
    pub path: Option<SlotPath>,

    /// Root the path is checked against (witness)
    pub committed_root: Option<Fr>,

    /// Outcome of the off-circuit admission check (witness)
    pub ml_result: Option<bool>,
}

impl InsertionValidityCircuit {
    /// Circuit shape used for key generation.
    pub fn empty() -> Self {
        Self {
            path: Some(SlotPath::placeholder(MERKLE_HEIGHT)),
            committed_root: Some(Fr::from(0u64)),
            ml_result: Some(true),
        }
    }

    pub fn new(path: SlotPath, committed_root: Fr, ml_result: bool) -> Self {
        Self {
            path: Some(path),
            committed_root: Some(committed_root),
            ml_result: Some(ml_result),
        }
    }

    /// Public inputs in allocation order.
    pub fn public_inputs(path: &SlotPath) -> Vec<Fr> {
        path.public_inputs()
    }

    /// Evaluate the constraints natively.
    pub fn is_valid(&self) -> bool {
        match (&self.path, self.committed_root, self.ml_result) {
            (Some(path), Some(root), Some(ml_result)) => {
                path.height() == MERKLE_HEIGHT && ml_result && is_vacant(root, path)
            }
            _ => false,
        }
    }
}

impl ConstraintSynthesizer<Fr> for InsertionValidityCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        if path.height() != MERKLE_HEIGHT {
            return Err(SynthesisError::Unsatisfiable);
        }

        // === Allocate public input ===
        let path_var = SlotPathVar::new_input(cs.clone(), path)?;

        // === Allocate witnesses ===
        let root_var = FpVar::new_witness(cs.clone(), || {
            self.committed_root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let ml_result_var = Boolean::new_witness(cs.clone(), || {
            self.ml_result.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Constraint 1: slot is empty under the committed root ===
        enforce_non_membership(cs.clone(), &root_var, &path_var)?;

        // === Constraint 2: admission check passed ===
        ml_result_var.enforce_equal(&Boolean::TRUE)?;

        Ok(())
    }
}
