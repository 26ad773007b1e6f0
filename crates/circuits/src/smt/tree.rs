//! Sparse Merkle tree native implementation.
//!
//! Slots hold record fingerprints; an unoccupied slot holds [`EMPTY_LEAF`].
//! Only occupied leaves and their ancestors are stored, every other node is
//! the precomputed hash of an empty subtree of the same height.

use std::collections::{BTreeMap, HashMap};

use ark_bn254::Fr;

use super::error::SmtError;
use super::path::{PathStep, SlotPath};
use super::{is_empty_leaf, EMPTY_LEAF};
use crate::poseidon::hash_two;

/// Sparse Merkle tree keyed by slot index.
#[derive(Clone, Debug)]
pub struct SparseMerkleTree {
    /// Number of levels between the leaves and the root
    height: usize,

    /// Stored nodes: (level, index) -> hash. Level 0 = leaves, level `height` = root
    nodes: HashMap<(usize, u64), Fr>,

    /// Occupied slots: index -> fingerprint
    leaves: BTreeMap<u64, Fr>,

    /// defaults[0] = EMPTY_LEAF, defaults[i] = H(defaults[i-1], defaults[i-1])
    defaults: Vec<Fr>,
}

impl SparseMerkleTree {
    /// Create an empty tree of the given height.
    pub fn new(height: usize) -> Self {
        assert!(height > 0 && height < 64, "tree height must be in 1..64");

        Self {
            height,
            nodes: HashMap::new(),
            leaves: BTreeMap::new(),
            defaults: Self::compute_defaults(height),
        }
    }

    /// Root of a tree of `height` with every slot empty.
    pub fn empty_root(height: usize) -> Fr {
        Self::compute_defaults(height)[height]
    }

    fn compute_defaults(height: usize) -> Vec<Fr> {
        let mut defaults = Vec::with_capacity(height + 1);
        let mut current = EMPTY_LEAF;
        defaults.push(current);

        for _ in 0..height {
            current = hash_two(current, current);
            defaults.push(current);
        }

        defaults
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of addressable slots (`2^height`).
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    fn check_index(&self, index: u64) -> Result<(), SmtError> {
        if index >= self.capacity() {
            return Err(SmtError::IndexOutOfRange {
                index,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Value stored at `index`, or [`EMPTY_LEAF`].
    pub fn leaf(&self, index: u64) -> Fr {
        self.leaves.get(&index).copied().unwrap_or(EMPTY_LEAF)
    }

    /// Write `value` at `index` and return the new root. Writing
    /// [`EMPTY_LEAF`] clears the slot.
    pub fn set_leaf(&mut self, index: u64, value: Fr) -> Result<Fr, SmtError> {
        self.check_index(index)?;

        if is_empty_leaf(&value) {
            self.leaves.remove(&index);
            self.nodes.remove(&(0, index));
        } else {
            self.leaves.insert(index, value);
            self.nodes.insert((0, index), value);
        }

        Ok(self.recompute_path(index))
    }

    fn recompute_path(&mut self, index: u64) -> Fr {
        let mut current_index = index;
        let mut current_hash = self.node(0, index);

        for level in 0..self.height {
            let sibling_hash = self.node(level, current_index ^ 1);

            current_hash = if current_index & 1 == 0 {
                hash_two(current_hash, sibling_hash)
            } else {
                hash_two(sibling_hash, current_hash)
            };
            current_index >>= 1;

            if current_hash == self.defaults[level + 1] {
                self.nodes.remove(&(level + 1, current_index));
            } else {
                self.nodes.insert((level + 1, current_index), current_hash);
            }
        }

        current_hash
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.defaults[level])
    }

    pub fn root(&self) -> Fr {
        self.node(self.height, 0)
    }

    /// Slot path for `index` against the current root.
    pub fn witness(&self, index: u64) -> Result<SlotPath, SmtError> {
        self.check_index(index)?;

        let mut steps = Vec::with_capacity(self.height);
        let mut current_index = index;
        for level in 0..self.height {
            steps.push(PathStep {
                sibling: self.node(level, current_index ^ 1),
                is_right: current_index & 1 == 1,
            });
            current_index >>= 1;
        }

        Ok(SlotPath::new(steps))
    }

    /// Occupied slots in index order.
    pub fn leaves(&self) -> impl Iterator<Item = (u64, Fr)> + '_ {
        self.leaves.iter().map(|(&index, &value)| (index, value))
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;
    use crate::smt::{is_member, is_vacant, MERKLE_HEIGHT};

    #[test]
    fn test_empty_tree() {
        let tree = SparseMerkleTree::new(MERKLE_HEIGHT);

        assert!(tree.is_empty());
        assert_eq!(tree.leaf(0), EMPTY_LEAF);
        assert_eq!(tree.root(), SparseMerkleTree::empty_root(MERKLE_HEIGHT));
    }

    #[test]
    fn test_insert_changes_root() {
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);

        let root0 = tree.root();
        let root1 = tree.set_leaf(0, Fr::from(99u64)).unwrap();

        assert_ne!(root0, root1);
        assert_eq!(tree.root(), root1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_clearing_restores_empty_root() {
        let mut tree = SparseMerkleTree::new(8);
        let empty = tree.root();

        tree.set_leaf(5, Fr::from(1u64)).unwrap();
        tree.set_leaf(5, EMPTY_LEAF).unwrap();

        assert_eq!(tree.root(), empty);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_witness_against_root() {
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        tree.set_leaf(3, Fr::from(30u64)).unwrap();
        tree.set_leaf(700, Fr::from(7000u64)).unwrap();

        let path = tree.witness(700).unwrap();
        assert_eq!(path.height(), MERKLE_HEIGHT);
        assert_eq!(path.index(), Some(700));
        assert!(is_member(tree.root(), Fr::from(7000u64), &path));
        assert!(!is_member(tree.root(), Fr::from(7001u64), &path));

        let vacant = tree.witness(4).unwrap();
        assert!(is_vacant(tree.root(), &vacant));
    }

    #[test]
    fn test_witness_survives_own_leaf_write() {
        // Siblings do not depend on the slot's own value, so the witness taken
        // before an insertion also proves membership afterwards.
        let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
        tree.set_leaf(1, Fr::from(11u64)).unwrap();

        let path = tree.witness(2).unwrap();
        let before = tree.root();
        let after = tree.set_leaf(2, Fr::from(22u64)).unwrap();

        assert!(is_vacant(before, &path));
        assert!(is_member(after, Fr::from(22u64), &path));
        assert!(!is_vacant(after, &path));
    }

    #[test]
    fn test_order_independence() {
        let mut a = SparseMerkleTree::new(MERKLE_HEIGHT);
        a.set_leaf(1, Fr::from(100u64)).unwrap();
        a.set_leaf(42, Fr::from(50u64)).unwrap();

        let mut b = SparseMerkleTree::new(MERKLE_HEIGHT);
        b.set_leaf(42, Fr::from(50u64)).unwrap();
        b.set_leaf(1, Fr::from(100u64)).unwrap();

        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut tree = SparseMerkleTree::new(4);

        assert_eq!(
            tree.set_leaf(16, Fr::from(1u64)),
            Err(SmtError::IndexOutOfRange { index: 16, height: 4 })
        );
        assert!(tree.witness(16).is_err());
        assert!(tree.set_leaf(15, Fr::from(1u64)).is_ok());
    }
}
