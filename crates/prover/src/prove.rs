//! Proof generation for the registry circuits.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use mvs_circuits::{InsertionValidityCircuit, MembershipCircuit, SlotPath, MERKLE_HEIGHT};

use crate::artifact::{CircuitKind, ProofArtifact};

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    /// The claim does not hold, so no valid proof exists for it
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),
}

/// Synthesize `circuit` on a fresh constraint system and check it is
/// satisfied before handing it to the prover.
fn ensure_satisfied<C: ConstraintSynthesizer<Fr>>(circuit: C, name: &str) -> Result<(), ProveError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit
        .generate_constraints(cs.clone())
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    let satisfied = cs
        .is_satisfied()
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;
    if !satisfied {
        let failing = cs
            .which_is_unsatisfied()
            .ok()
            .flatten()
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ProveError::ConstraintViolation(format!(
            "{name} circuit unsatisfied at {failing}"
        )));
    }
    Ok(())
}

fn check_height(path: &SlotPath) -> Result<(), ProveError> {
    path.ensure_height(MERKLE_HEIGHT)
        .map_err(|e| ProveError::InvalidWitness(e.to_string()))
}

/// Generate an insertion-validity proof: `path` leads to an empty slot under
/// `committed_root` and the admission check returned `ml_result`.
pub fn prove_insertion(
    pk: &ProvingKey<Bn254>,
    path: &SlotPath,
    committed_root: Fr,
    ml_result: bool,
) -> Result<ProofArtifact, ProveError> {
    check_height(path)?;

    // Verify the claim is valid
    if !ml_result {
        return Err(ProveError::ConstraintViolation(
            "admission check result is false".to_string(),
        ));
    }
    let circuit = InsertionValidityCircuit::new(path.clone(), committed_root, ml_result);
    if !circuit.is_valid() {
        return Err(ProveError::ConstraintViolation(
            "slot is not empty under the committed root".to_string(),
        ));
    }
    ensure_satisfied(circuit.clone(), "insertion")?;

    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    Ok(ProofArtifact::new(
        CircuitKind::Insertion,
        proof,
        InsertionValidityCircuit::public_inputs(path),
    ))
}

/// Generate a membership proof: `fingerprint` occupies the slot `path`
/// leads to under `root`.
pub fn prove_membership(
    pk: &ProvingKey<Bn254>,
    root: Fr,
    fingerprint: Fr,
    path: &SlotPath,
) -> Result<ProofArtifact, ProveError> {
    check_height(path)?;

    let circuit = MembershipCircuit::new(root, fingerprint, path.clone());
    if !circuit.is_valid() {
        return Err(ProveError::ConstraintViolation(
            "fingerprint is not committed under the root".to_string(),
        ));
    }
    ensure_satisfied(circuit.clone(), "membership")?;

    let mut rng = StdRng::from_entropy();
    let proof = Groth16::<Bn254>::prove(pk, circuit, &mut rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    Ok(ProofArtifact::new(
        CircuitKind::Membership,
        proof,
        MembershipCircuit::public_inputs(root, fingerprint),
    ))
}
