//! In-circuit slot path verification.

use ark_bn254::Fr;
use ark_r1cs_std::{alloc::AllocationMode, boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::path::SlotPath;
use super::EMPTY_LEAF;
use crate::poseidon::hash_two_var;

/// Circuit variable representation of a [`SlotPath`].
#[derive(Clone)]
pub struct SlotPathVar {
    siblings: Vec<FpVar<Fr>>,
    directions: Vec<Boolean<Fr>>,
}

impl SlotPathVar {
    /// Allocate the path as private witnesses.
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, path: &SlotPath) -> Result<Self, SynthesisError> {
        Self::alloc(cs, path, AllocationMode::Witness)
    }

    /// Allocate the path as public inputs, in the order of
    /// [`SlotPath::public_inputs`]: siblings first, then direction bits.
    pub fn new_input(cs: ConstraintSystemRef<Fr>, path: &SlotPath) -> Result<Self, SynthesisError> {
        Self::alloc(cs, path, AllocationMode::Input)
    }

    fn alloc(
        cs: ConstraintSystemRef<Fr>,
        path: &SlotPath,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let siblings = path
            .steps()
            .iter()
            .map(|step| FpVar::new_variable(cs.clone(), || Ok(step.sibling), mode))
            .collect::<Result<Vec<_>, _>>()?;

        let directions = path
            .steps()
            .iter()
            .map(|step| Boolean::new_variable(cs.clone(), || Ok(step.is_right), mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            siblings,
            directions,
        })
    }

    pub fn height(&self) -> usize {
        self.siblings.len()
    }
}

/// Recompute the root from `leaf` and `path` in-circuit.
pub fn compute_root_var(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &SlotPathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.siblings.iter().zip(path.directions.iter()) {
        // is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = hash_two_var(cs.clone(), &left, &right)?;
    }

    Ok(current)
}

/// Constrain `leaf` to occupy the path's slot under `root`.
pub fn enforce_membership(
    cs: ConstraintSystemRef<Fr>,
    root: &FpVar<Fr>,
    leaf: &FpVar<Fr>,
    path: &SlotPathVar,
) -> Result<(), SynthesisError> {
    let computed_root = compute_root_var(cs, leaf, path)?;
    computed_root.enforce_equal(root)
}

/// Constrain the path's slot to be empty under `root`.
pub fn enforce_non_membership(
    cs: ConstraintSystemRef<Fr>,
    root: &FpVar<Fr>,
    path: &SlotPathVar,
) -> Result<(), SynthesisError> {
    let empty = FpVar::constant(EMPTY_LEAF);
    enforce_membership(cs, root, &empty, path)
}

#[cfg(test)]
mod gadget_tests {
    use super::*;
    use crate::smt::{SparseMerkleTree, MERKLE_HEIGHT};
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn test_root_matches_native() {
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        tree.set_leaf(9, Fr::from(90u64)).unwrap();
        let path = tree.witness(9).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(90u64))).unwrap();
        let path_var = SlotPathVar::new_witness(cs.clone(), &path).unwrap();
        let computed = compute_root_var(cs.clone(), &leaf_var, &path_var).unwrap();

        assert_eq!(computed.value().unwrap(), tree.root());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_membership_wrong_leaf() {
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        tree.set_leaf(1, Fr::from(100u64)).unwrap();
        let path = tree.witness(1).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let root_var = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let leaf_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(99u64))).unwrap();
        let path_var = SlotPathVar::new_witness(cs.clone(), &path).unwrap();

        enforce_membership(cs.clone(), &root_var, &leaf_var, &path_var).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_non_membership_of_occupied_slot() {
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        tree.set_leaf(5, Fr::from(55u64)).unwrap();
        let path = tree.witness(5).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let root_var = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let path_var = SlotPathVar::new_witness(cs.clone(), &path).unwrap();

        enforce_non_membership(cs.clone(), &root_var, &path_var).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_input_allocation_order() {
        let mut tree = SparseMerkleTree::new(4);
        tree.set_leaf(3, Fr::from(3u64)).unwrap();
        let path = tree.witness(6).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let path_var = SlotPathVar::new_input(cs.clone(), &path).unwrap();
        assert_eq!(path_var.height(), 4);

        // Instance slot 0 is the constant one.
        let cs = cs.borrow().unwrap();
        assert_eq!(&cs.instance_assignment[1..], path.public_inputs().as_slice());
    }

    #[test]
    fn test_constraint_count() {
        let tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        let path = tree.witness(0).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let root_var = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let path_var = SlotPathVar::new_witness(cs.clone(), &path).unwrap();
        enforce_non_membership(cs.clone(), &root_var, &path_var).unwrap();

        let num_constraints = cs.num_constraints();
        println!(
            "Poseidon SMT non-membership constraints (height {}): {}",
            MERKLE_HEIGHT, num_constraints
        );

        // 20 node hashes at under 300 constraints each, plus selects.
        assert!(num_constraints < MERKLE_HEIGHT * 320);
        assert!(cs.is_satisfied().unwrap());
    }
}
