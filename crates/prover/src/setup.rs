//! Trusted setup utilities for generating proving and verifying keys.

use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use mvs_circuits::{InsertionValidityCircuit, MembershipCircuit};

use crate::verify::VerifyingKeys;

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    fn save(&self, dir: &Path, name: &str) -> Result<(), SetupError> {
        std::fs::write(dir.join(format!("{name}.pk")), self.serialize_pk()?)?;
        std::fs::write(dir.join(format!("{name}.vk")), self.serialize_vk()?)?;
        Ok(())
    }

    fn load(dir: &Path, name: &str) -> Result<Self, SetupError> {
        Ok(Self {
            proving_key: Self::deserialize_pk(&std::fs::read(dir.join(format!("{name}.pk")))?)?,
            verifying_key: Self::deserialize_vk(&std::fs::read(dir.join(format!("{name}.vk")))?)?,
        })
    }
}

/// All circuit keys
#[derive(Clone)]
pub struct CircuitKeys {
    pub insertion: CircuitKeyPair,
    pub membership: CircuitKeyPair,
}

impl CircuitKeys {
    const INSERTION: &'static str = "insertion";
    const MEMBERSHIP: &'static str = "membership";

    /// Save all keys to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;
        self.insertion.save(dir, Self::INSERTION)?;
        self.membership.save(dir, Self::MEMBERSHIP)?;
        Ok(())
    }

    /// Load all keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        Ok(Self {
            insertion: CircuitKeyPair::load(dir, Self::INSERTION)?,
            membership: CircuitKeyPair::load(dir, Self::MEMBERSHIP)?,
        })
    }

    /// Whether a complete key set exists in `dir`.
    pub fn exists_in(dir: &Path) -> bool {
        [Self::INSERTION, Self::MEMBERSHIP].iter().all(|name| {
            dir.join(format!("{name}.pk")).is_file() && dir.join(format!("{name}.vk")).is_file()
        })
    }

    pub fn verifying_keys(&self) -> VerifyingKeys {
        VerifyingKeys {
            insertion: self.insertion.verifying_key.clone(),
            membership: self.membership.verifying_key.clone(),
        }
    }
}

/// Run trusted setup for all circuits.
///
/// The seed makes setup reproducible; anyone who knows it can forge proofs,
/// so production deployments must not reuse a published seed.
pub fn setup_all_circuits(seed: u64) -> Result<CircuitKeys, SetupError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let insertion = setup_insertion(&mut rng)?;
    let membership = setup_membership(&mut rng)?;

    Ok(CircuitKeys {
        insertion,
        membership,
    })
}

/// Load keys from `dir`, or run setup and save them there.
pub fn load_or_setup(dir: &Path, seed: u64) -> Result<CircuitKeys, SetupError> {
    if CircuitKeys::exists_in(dir) {
        return CircuitKeys::load_from_directory(dir);
    }

    let keys = setup_all_circuits(seed)?;
    keys.save_to_directory(dir)?;
    Ok(keys)
}

/// Setup InsertionValidityCircuit
pub fn setup_insertion(rng: &mut StdRng) -> Result<CircuitKeyPair, SetupError> {
    let circuit = InsertionValidityCircuit::empty();
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}

/// Setup MembershipCircuit
pub fn setup_membership(rng: &mut StdRng) -> Result<CircuitKeyPair, SetupError> {
    let circuit = MembershipCircuit::empty();
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}
