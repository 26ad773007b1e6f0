//! Merkle-anchored user record registry.
//!
//! This crate provides:
//! - `Contract`: the commitment controller state machine
//! - `SignedProofEnvelope`: proofs vouched for by an Ed25519 identity
//! - `StorageAdapter` and `InMemoryStorage`: off-chain records and witnesses
//! - `Registrar`: contract and storage driven together, with bounded retries
//! - `RegistryConfig`: access policy and limits

pub mod config;
pub mod contract;
pub mod envelope;
pub mod identity;
pub mod registrar;
pub mod storage;


pub use config::{ConfigError, RegistryConfig};
pub use contract::{
    AccessPolicy, Contract, ErrorKind, LedgerLayout, Phase, RegistryError, StagedInsertion,
};
pub use envelope::{EnvelopeError, SignedProofEnvelope};
pub use identity::{Identity, IdentityError, IdentitySigner};
pub use registrar::{Registrar, RegistrarError, Registration};
pub use storage::{InMemoryStorage, RecordRef, StorageAdapter, StorageError};
