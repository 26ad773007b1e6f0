//! Membership circuit.
//!
//! Proves that a fingerprint occupies some slot under a root without
//! revealing which one.
//!
//! Public inputs: [root, fingerprint]
//! Private inputs: slot path

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::smt::{enforce_membership, is_member, SlotPath, SlotPathVar, MERKLE_HEIGHT};

#[derive(Clone)]
pub struct MembershipCircuit {
    /// Commitment root (public)
    pub root: Option<Fr>,

    /// Record fingerprint (public)
    pub fingerprint: Option<Fr>,

    /// Path to the record's slot (witness)
    pub path: Option<SlotPath>,
}

impl MembershipCircuit {
    /// Circuit shape used for key generation.
    pub fn empty() -> Self {
        Self {
            root: Some(Fr::from(0u64)),
            fingerprint: Some(Fr::from(0u64)),
            path: Some(SlotPath::placeholder(MERKLE_HEIGHT)),
        }
    }

    pub fn new(root: Fr, fingerprint: Fr, path: SlotPath) -> Self {
        Self {
            root: Some(root),
            fingerprint: Some(fingerprint),
            path: Some(path),
        }
    }

    pub fn public_inputs(root: Fr, fingerprint: Fr) -> Vec<Fr> {
        vec![root, fingerprint]
    }

    /// Evaluate the constraint natively.
    pub fn is_valid(&self) -> bool {
        match (self.root, self.fingerprint, &self.path) {
            (Some(root), Some(fingerprint), Some(path)) => {
                path.height() == MERKLE_HEIGHT && is_member(root, fingerprint, path)
            }
            _ => false,
        }
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate public inputs ===
        let root_var = FpVar::new_input(cs.clone(), || {
            self.root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let fingerprint_var = FpVar::new_input(cs.clone(), || {
            self.fingerprint.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate witness ===
        let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        if path.height() != MERKLE_HEIGHT {
            return Err(SynthesisError::Unsatisfiable);
        }
        let path_var = SlotPathVar::new_witness(cs.clone(), path)?;

        enforce_membership(cs, &root_var, &fingerprint_var, &path_var)
    }
}
