//! Registrar: keeps the contract and the record storage in step.
//!
//! An insertion is staged on the contract, written to storage and only then
//! committed. A failure at any step leaves neither side changed.

use ark_bn254::{Bn254, Fr};
use ark_groth16::ProvingKey;
use thiserror::Error;
use tracing::{info, warn};

use mvs_circuits::Schema;
use mvs_prover::{prove_insertion, prove_membership, ProofArtifact, ProveError};

use crate::config::RegistryConfig;
use crate::contract::{Contract, RegistryError};
use crate::envelope::SignedProofEnvelope;
use crate::identity::Identity;
use crate::storage::{RecordRef, StorageAdapter, StorageError};

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Prove(#[from] ProveError),
    #[error("a record with {key} = {value} already exists")]
    Duplicate { key: String, value: String },
    #[error("no record with {key} = {value}")]
    NotFound { key: String, value: String },
    #[error("insertion failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: RegistryError },
    #[error("storage diverged from the contract: {0}")]
    Diverged(String),
}

/// Result of a successful registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub index: u64,
    pub root: Fr,
    pub record_count: u64,
}

pub struct Registrar<S: StorageAdapter> {
    contract: Contract,
    storage: S,
    config: RegistryConfig,
}

impl<S: StorageAdapter> Registrar<S> {
    pub fn new(contract: Contract, storage: S, config: RegistryConfig) -> Self {
        Self {
            contract,
            storage,
            config,
        }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Initialize the contract with the storage root.
    pub fn bootstrap(&mut self, caller: &Identity) -> Result<Fr, RegistrarError> {
        let root = self.storage.current_root();
        self.contract.initialize(caller, root)?;
        Ok(root)
    }

    /// Insert `record` into the next free slot.
    ///
    /// A witness that is stale against the contract root is fetched again,
    /// up to `max_insert_attempts` times in total.
    pub fn register<R: Schema>(
        &mut self,
        caller: &Identity,
        record: &R,
        attestation: Option<&ProofArtifact>,
    ) -> Result<Registration, RegistrarError> {
        let (key, value) = record.index();
        if self.storage.find_by_attribute(key, &value).is_some() {
            return Err(RegistrarError::Duplicate {
                key: key.to_string(),
                value,
            });
        }

        let fingerprint = record.fingerprint();
        let max_attempts = self.config.max_insert_attempts;
        let mut attempt = 0;

        let (index, staged) = loop {
            attempt += 1;
            let index = self.storage.next_index();
            let witness = self.storage.witness_for_index(index)?;

            match self
                .contract
                .stage_insertion(caller, fingerprint, &witness, attestation)
            {
                Ok(staged) => break (index, staged),
                Err(RegistryError::SlotOccupied) if attempt < max_attempts => {
                    warn!(attempt, slot = index, "stale witness, retrying");
                }
                Err(RegistryError::SlotOccupied) => {
                    return Err(RegistrarError::RetriesExhausted {
                        attempts: attempt,
                        last: RegistryError::SlotOccupied,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        };

        // Storage is written before the contract commits; a failed write
        // leaves both untouched.
        let stored = self.storage.insert(record)?;
        if stored != index || self.storage.current_root() != staged.new_root() {
            self.storage.remove(stored)?;
            return Err(RegistrarError::Diverged(format!(
                "contract staged slot {index}, storage used slot {stored}"
            )));
        }

        let root = match self.contract.commit_insertion(staged) {
            Ok(root) => root,
            Err(e) => {
                self.storage.remove(stored)?;
                return Err(e.into());
            }
        };

        info!(%key, %value, slot = index, "registered record");
        Ok(Registration {
            index,
            root,
            record_count: self.contract.record_count(),
        })
    }

    /// Prove that the next free slot is empty under the contract root and
    /// that the admission check passed.
    pub fn prove_admission(
        &self,
        pk: &ProvingKey<Bn254>,
        ml_result: bool,
    ) -> Result<ProofArtifact, RegistrarError> {
        let index = self.storage.next_index();
        let witness = self.storage.witness_for_index(index)?;
        Ok(prove_insertion(pk, &witness, self.contract.root(), ml_result)?)
    }

    /// Look a record up by attribute.
    pub fn find(&self, key: &str, value: &str) -> Result<RecordRef, RegistrarError> {
        self.storage
            .find_by_attribute(key, value)
            .ok_or_else(|| RegistrarError::NotFound {
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    /// Check a stored record against the contract root, optionally with an
    /// envelope.
    pub fn check_membership(
        &self,
        key: &str,
        value: &str,
        envelope: Option<&SignedProofEnvelope>,
    ) -> Result<RecordRef, RegistrarError> {
        let record = self.find(key, value)?;
        let witness = self.storage.witness_for_index(record.index)?;
        self.contract
            .verify_membership(record.fingerprint, &witness, envelope)?;
        Ok(record)
    }

    /// Prove a stored record is committed under the contract root.
    pub fn prove_record_membership(
        &self,
        pk: &ProvingKey<Bn254>,
        key: &str,
        value: &str,
    ) -> Result<ProofArtifact, RegistrarError> {
        let record = self.find(key, value)?;
        let witness = self.storage.witness_for_index(record.index)?;
        Ok(prove_membership(
            pk,
            self.contract.root(),
            record.fingerprint,
            &witness,
        )?)
    }
}
