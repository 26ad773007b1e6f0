//! Proof verification.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use rayon::prelude::*;
use thiserror::Error;

use mvs_circuits::{InsertionValidityCircuit, MembershipCircuit, SlotPath, MERKLE_HEIGHT};

use crate::artifact::{CircuitKind, ProofArtifact};

/// Errors during verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Verification failed: {0}")]
    Verification(String),
    #[error("Invalid public inputs: expected {expected}, got {actual}")]
    InvalidInputs { expected: usize, actual: usize },
}

/// Verifying keys for every circuit
#[derive(Clone, Debug)]
pub struct VerifyingKeys {
    pub insertion: VerifyingKey<Bn254>,
    pub membership: VerifyingKey<Bn254>,
}

impl VerifyingKeys {
    pub fn for_circuit(&self, circuit: CircuitKind) -> &VerifyingKey<Bn254> {
        match circuit {
            CircuitKind::Insertion => &self.insertion,
            CircuitKind::Membership => &self.membership,
        }
    }
}

/// Number of public inputs each circuit exposes.
pub fn public_input_count(circuit: CircuitKind) -> usize {
    match circuit {
        CircuitKind::Insertion => 2 * MERKLE_HEIGHT,
        CircuitKind::Membership => 2,
    }
}

fn groth16_verify(
    vk: &VerifyingKey<Bn254>,
    public_inputs: &[Fr],
    proof: &Proof<Bn254>,
) -> Result<bool, VerifyError> {
    Groth16::<Bn254>::verify(vk, public_inputs, proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}

/// Verify an insertion-validity proof for `path`.
pub fn verify_insertion(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    path: &SlotPath,
) -> Result<bool, VerifyError> {
    if path.height() != MERKLE_HEIGHT {
        return Err(VerifyError::InvalidInputs {
            expected: public_input_count(CircuitKind::Insertion),
            actual: 2 * path.height(),
        });
    }
    groth16_verify(vk, &InsertionValidityCircuit::public_inputs(path), proof)
}

/// Verify a membership proof for `fingerprint` under `root`.
pub fn verify_membership(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    root: Fr,
    fingerprint: Fr,
) -> Result<bool, VerifyError> {
    groth16_verify(vk, &MembershipCircuit::public_inputs(root, fingerprint), proof)
}

/// Verify an artifact against the key for its circuit.
pub fn verify_artifact(keys: &VerifyingKeys, artifact: &ProofArtifact) -> Result<bool, VerifyError> {
    let expected = public_input_count(artifact.circuit);
    if artifact.public_inputs.len() != expected {
        return Err(VerifyError::InvalidInputs {
            expected,
            actual: artifact.public_inputs.len(),
        });
    }

    groth16_verify(
        keys.for_circuit(artifact.circuit),
        &artifact.public_inputs,
        &artifact.proof,
    )
}

/// Verify independent artifacts in parallel. Results keep input order.
pub fn verify_batch(
    keys: &VerifyingKeys,
    artifacts: &[ProofArtifact],
) -> Vec<Result<bool, VerifyError>> {
    artifacts
        .par_iter()
        .map(|artifact| verify_artifact(keys, artifact))
        .collect()
}
