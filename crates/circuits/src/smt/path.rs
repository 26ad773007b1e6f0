//! Slot paths: the witness that places a leaf under a root.

use ark_bn254::Fr;
use ark_ff::{One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::error::SmtError;
use crate::poseidon::hash_two;

/// One level of a slot path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PathStep {
    /// Hash of the sibling subtree at this level
    pub sibling: Fr,
    /// True when the node on the path is the right child
    pub is_right: bool,
}

/// Ordered steps from the leaf level up to the child of the root.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SlotPath {
    steps: Vec<PathStep>,
}

impl SlotPath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Build a path from separate sibling and direction arrays.
    pub fn from_parts(siblings: Vec<Fr>, directions: Vec<bool>) -> Result<Self, SmtError> {
        if siblings.len() != directions.len() {
            return Err(SmtError::MalformedPath {
                siblings: siblings.len(),
                directions: directions.len(),
            });
        }
        let steps = siblings
            .into_iter()
            .zip(directions)
            .map(|(sibling, is_right)| PathStep { sibling, is_right })
            .collect();
        Ok(Self { steps })
    }

    /// All-zero path of the given height, used to shape circuits at setup.
    pub fn placeholder(height: usize) -> Self {
        Self {
            steps: vec![
                PathStep {
                    sibling: Fr::zero(),
                    is_right: false,
                };
                height
            ],
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn height(&self) -> usize {
        self.steps.len()
    }

    pub fn ensure_height(&self, expected: usize) -> Result<(), SmtError> {
        if self.height() != expected {
            return Err(SmtError::HeightMismatch {
                expected,
                actual: self.height(),
            });
        }
        Ok(())
    }

    /// Slot index encoded by the direction bits (leaf level is the low bit).
    /// `None` when a right turn sits at level 64 or above.
    pub fn index(&self) -> Option<u64> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_right)
            .try_fold(0u64, |acc, (level, _)| {
                let bit = u32::try_from(level).ok().and_then(|shift| 1u64.checked_shl(shift))?;
                Some(acc | bit)
            })
    }

    /// Recompute the root with `leaf` at this path's slot.
    pub fn calculate_root(&self, leaf: Fr) -> Fr {
        self.steps.iter().fold(leaf, |current, step| {
            if step.is_right {
                hash_two(step.sibling, current)
            } else {
                hash_two(current, step.sibling)
            }
        })
    }

    /// Field encoding used as circuit public input: all siblings, then all
    /// direction bits as 0/1.
    pub fn public_inputs(&self) -> Vec<Fr> {
        let siblings = self.steps.iter().map(|step| step.sibling);
        let directions = self.steps.iter().map(|step| {
            if step.is_right {
                Fr::one()
            } else {
                Fr::zero()
            }
        });
        siblings.chain(directions).collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SmtError> {
        let mut bytes = Vec::new();
        self.serialize_compressed(&mut bytes)
            .map_err(|e| SmtError::Encoding(e.to_string()))?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmtError> {
        Self::deserialize_compressed(bytes).map_err(|e| SmtError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;

    #[test]
    fn test_from_parts_rejects_uneven_arrays() {
        let result = SlotPath::from_parts(vec![Fr::from(1u64); 3], vec![false; 2]);
        assert_eq!(
            result,
            Err(SmtError::MalformedPath {
                siblings: 3,
                directions: 2
            })
        );
    }

    #[test]
    fn test_index_from_directions() {
        let path = SlotPath::from_parts(
            vec![Fr::zero(); 4],
            vec![true, false, true, true],
        )
        .unwrap();
        assert_eq!(path.index(), Some(0b1101));
    }

    #[test]
    fn test_index_of_deep_path() {
        let full = SlotPath::from_parts(vec![Fr::zero(); 64], vec![true; 64]).unwrap();
        assert_eq!(full.index(), Some(u64::MAX));

        let too_deep = SlotPath::from_parts(vec![Fr::zero(); 65], vec![true; 65]).unwrap();
        assert_eq!(too_deep.index(), None);

        // Left turns above level 63 do not change the index
        let mut directions = vec![false; 70];
        directions[2] = true;
        let left_heavy = SlotPath::from_parts(vec![Fr::zero(); 70], directions).unwrap();
        assert_eq!(left_heavy.index(), Some(4));
    }

    #[test]
    fn test_different_leaves_different_roots() {
        let path = SlotPath::from_parts(
            vec![Fr::from(1u64), Fr::from(2u64)],
            vec![false, true],
        )
        .unwrap();

        assert_ne!(path.calculate_root(Fr::from(100u64)), path.calculate_root(Fr::from(101u64)));
    }

    #[test]
    fn test_public_input_layout() {
        let path = SlotPath::from_parts(
            vec![Fr::from(7u64), Fr::from(8u64)],
            vec![true, false],
        )
        .unwrap();

        assert_eq!(
            path.public_inputs(),
            vec![Fr::from(7u64), Fr::from(8u64), Fr::one(), Fr::zero()]
        );
    }

    #[test]
    fn test_bytes_round_trip() {
        let path = SlotPath::from_parts(
            vec![Fr::from(3u64), Fr::from(4u64), Fr::from(5u64)],
            vec![false, true, true],
        )
        .unwrap();

        let decoded = SlotPath::from_bytes(&path.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, path);
    }

    #[test]
    fn test_ensure_height() {
        let path = SlotPath::placeholder(5);
        assert!(path.ensure_height(5).is_ok());
        assert_eq!(
            path.ensure_height(20),
            Err(SmtError::HeightMismatch {
                expected: 20,
                actual: 5
            })
        );
    }
}
