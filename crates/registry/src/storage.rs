//! Off-chain record storage.
//!
//! The contract only ever sees a root and witnesses. Storage keeps the
//! records themselves, assigns their slots and hands out witnesses against
//! its own tree, which mirrors the contract root as long as every accepted
//! insertion is written back.

use std::collections::{BTreeMap, HashMap};

use ark_bn254::Fr;
use thiserror::Error;

use mvs_circuits::{Schema, SchemaError, SlotPath, SmtError, SparseMerkleTree, EMPTY_LEAF};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("a record with {key} = {value} already exists")]
    DuplicateAttribute { key: String, value: String },
    #[error("storage is full ({capacity} slots)")]
    Full { capacity: u64 },
    #[error("stored record at slot {index} does not match its fingerprint")]
    Corrupt { index: u64 },
    #[error("slot {index} is not the most recent insertion")]
    NotRemovable { index: u64 },
    #[error(transparent)]
    Tree(#[from] SmtError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A stored record, not yet decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRef {
    pub index: u64,
    pub fingerprint: Fr,
    bytes: Vec<u8>,
}

impl RecordRef {
    /// Decode the record and check it still hashes to its leaf.
    pub fn load<R: Schema>(&self) -> Result<R, StorageError> {
        let record = R::decode(&self.bytes)?;
        if record.fingerprint() != self.fingerprint {
            return Err(StorageError::Corrupt { index: self.index });
        }
        Ok(record)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Record storage backed by a sparse Merkle tree.
pub trait StorageAdapter: Send + Sync {
    /// Store `record` in the next free slot and return that slot.
    fn insert<R: Schema>(&mut self, record: &R) -> Result<u64, StorageError>;

    /// Undo the most recent insertion, which must have gone to `index`.
    fn remove(&mut self, index: u64) -> Result<(), StorageError>;

    fn find_by_attribute(&self, key: &str, value: &str) -> Option<RecordRef>;

    fn witness_for_index(&self, index: u64) -> Result<SlotPath, StorageError>;

    fn current_root(&self) -> Fr;

    /// Slot the next insertion will use.
    fn next_index(&self) -> u64;

    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory storage with sequential slot allocation.
#[derive(Clone, Debug)]
pub struct InMemoryStorage {
    tree: SparseMerkleTree,
    records: BTreeMap<u64, RecordRef>,
    by_attribute: HashMap<(String, String), u64>,
}

impl InMemoryStorage {
    pub fn new(height: usize) -> Self {
        Self {
            tree: SparseMerkleTree::new(height),
            records: BTreeMap::new(),
            by_attribute: HashMap::new(),
        }
    }

    pub fn get(&self, index: u64) -> Option<&RecordRef> {
        self.records.get(&index)
    }

    pub fn tree(&self) -> &SparseMerkleTree {
        &self.tree
    }
}

impl StorageAdapter for InMemoryStorage {
    fn insert<R: Schema>(&mut self, record: &R) -> Result<u64, StorageError> {
        let (key, value) = record.index();
        let attribute = (key.to_string(), value);
        if self.by_attribute.contains_key(&attribute) {
            return Err(StorageError::DuplicateAttribute {
                key: attribute.0,
                value: attribute.1,
            });
        }

        let index = self.next_index();
        if index >= self.tree.capacity() {
            return Err(StorageError::Full {
                capacity: self.tree.capacity(),
            });
        }

        let bytes = record.encode()?;
        let fingerprint = record.fingerprint();
        self.tree.set_leaf(index, fingerprint)?;

        self.records.insert(
            index,
            RecordRef {
                index,
                fingerprint,
                bytes,
            },
        );
        self.by_attribute.insert(attribute, index);
        Ok(index)
    }

    fn remove(&mut self, index: u64) -> Result<(), StorageError> {
        if index.checked_add(1) != Some(self.next_index()) {
            return Err(StorageError::NotRemovable { index });
        }

        self.tree.set_leaf(index, EMPTY_LEAF)?;
        self.records.remove(&index);
        self.by_attribute.retain(|_, slot| *slot != index);
        Ok(())
    }

    fn find_by_attribute(&self, key: &str, value: &str) -> Option<RecordRef> {
        self.by_attribute
            .get(&(key.to_string(), value.to_string()))
            .and_then(|index| self.records.get(index))
            .cloned()
    }

    fn witness_for_index(&self, index: u64) -> Result<SlotPath, StorageError> {
        Ok(self.tree.witness(index)?)
    }

    fn current_root(&self) -> Fr {
        self.tree.root()
    }

    fn next_index(&self) -> u64 {
        self.records.len() as u64
    }

    fn len(&self) -> u64 {
        self.records.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvs_circuits::{is_member, ProofRecord, PublicKeyBytes, UserData, UserSession, MERKLE_HEIGHT};

    fn user(tag: u8) -> UserData {
        UserData {
            user_address: PublicKeyBytes([tag; 32]),
            session: UserSession::new("dave", "dave@example.com", "").unwrap(),
        }
    }

    #[test]
    fn test_sequential_insert_and_lookup() {
        let mut storage = InMemoryStorage::new(MERKLE_HEIGHT);
        assert!(storage.is_empty());

        assert_eq!(storage.insert(&user(1)).unwrap(), 0);
        assert_eq!(storage.insert(&user(2)).unwrap(), 1);
        assert_eq!(storage.next_index(), 2);

        let (key, value) = user(2).index();
        let found = storage.find_by_attribute(key, &value).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.load::<UserData>().unwrap(), user(2));

        let witness = storage.witness_for_index(1).unwrap();
        assert!(is_member(storage.current_root(), found.fingerprint, &witness));
    }

    #[test]
    fn test_missing_attribute() {
        let storage = InMemoryStorage::new(MERKLE_HEIGHT);
        assert!(storage.find_by_attribute("userAddress", "0x00").is_none());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut storage = InMemoryStorage::new(MERKLE_HEIGHT);
        storage.insert(&user(1)).unwrap();
        let root = storage.current_root();

        assert!(matches!(
            storage.insert(&user(1)),
            Err(StorageError::DuplicateAttribute { .. })
        ));
        assert_eq!(storage.current_root(), root);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_full_storage() {
        let mut storage = InMemoryStorage::new(1);
        storage.insert(&user(1)).unwrap();
        storage.insert(&user(2)).unwrap();

        assert_eq!(
            storage.insert(&user(3)),
            Err(StorageError::Full { capacity: 2 })
        );
    }

    #[test]
    fn test_remove_last_insertion() {
        let mut storage = InMemoryStorage::new(MERKLE_HEIGHT);
        storage.insert(&user(1)).unwrap();
        let root = storage.current_root();
        storage.insert(&user(2)).unwrap();

        // Only the most recent slot can be taken back
        assert_eq!(storage.remove(0), Err(StorageError::NotRemovable { index: 0 }));
        assert_eq!(storage.remove(2), Err(StorageError::NotRemovable { index: 2 }));

        storage.remove(1).unwrap();
        assert_eq!(storage.current_root(), root);
        assert_eq!(storage.next_index(), 1);
        let (key, value) = user(2).index();
        assert!(storage.find_by_attribute(key, &value).is_none());

        // The slot is reused
        assert_eq!(storage.insert(&user(2)).unwrap(), 1);
    }

    #[test]
    fn test_load_with_wrong_schema() {
        let mut storage = InMemoryStorage::new(MERKLE_HEIGHT);
        storage.insert(&user(1)).unwrap();

        let record = storage.get(0).unwrap();
        assert!(record.load::<ProofRecord>().is_err());
    }

    #[test]
    fn test_witness_out_of_range() {
        let storage = InMemoryStorage::new(4);
        assert!(matches!(
            storage.witness_for_index(16),
            Err(StorageError::Tree(SmtError::IndexOutOfRange { .. }))
        ));
    }
}
