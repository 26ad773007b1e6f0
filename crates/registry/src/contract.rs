//! Commitment controller.
//!
//! Holds the registry root, the record counter, the controller identity and
//! the initialization lock, and guards every change to them. A transition
//! either passes all of its checks and commits, or returns an error with the
//! state untouched.

use std::fmt;
use std::sync::Arc;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use mvs_circuits::schema::serde_fr;
use mvs_circuits::{is_empty_leaf, is_member, is_vacant, SlotPath, SmtError, MERKLE_HEIGHT};
use mvs_prover::{CircuitKind, NestedVerifier, ProofArtifact};

use crate::envelope::{EnvelopeError, SignedProofEnvelope};
use crate::identity::Identity;

/// Who may insert records once the contract is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Only the controller inserts; an insertion proof is optional.
    #[default]
    ControllerOnly,
    /// Anyone inserts with an insertion proof bound to the witness.
    ProofGated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Active,
}

/// How a rejected transition should be handled by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong phase, wrong caller, or a required input is missing
    PreconditionViolation,
    /// A membership, non-membership or proof check failed
    ProofConstraintViolation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("contract is already initialized")]
    AlreadyInitialized,
    #[error("contract is not initialized")]
    NotInitialized,
    #[error("caller {caller} is not the controller")]
    Unauthorized { caller: Identity },
    #[error("insertion proof required by policy")]
    AttestationRequired,
    #[error("cannot insert the empty-slot sentinel")]
    EmptyFingerprint,
    #[error("invalid witness: {0}")]
    InvalidWitness(#[from] SmtError),
    #[error("witness does not lead to an empty slot under the current root")]
    SlotOccupied,
    #[error("record is not committed under the current root")]
    NotAMember,
    #[error("expected a {expected} proof, got {actual}")]
    WrongCircuit {
        expected: CircuitKind,
        actual: CircuitKind,
    },
    #[error("proof is bound to a different slot or record")]
    AttestationMismatch,
    #[error("insertion proof rejected: {0}")]
    AttestationRejected(String),
    #[error("envelope rejected: {0}")]
    EnvelopeRejected(#[from] EnvelopeError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::AlreadyInitialized
            | RegistryError::NotInitialized
            | RegistryError::Unauthorized { .. }
            | RegistryError::AttestationRequired
            | RegistryError::EmptyFingerprint => ErrorKind::PreconditionViolation,
            RegistryError::InvalidWitness(_)
            | RegistryError::SlotOccupied
            | RegistryError::NotAMember
            | RegistryError::WrongCircuit { .. }
            | RegistryError::AttestationMismatch
            | RegistryError::AttestationRejected(_)
            | RegistryError::EnvelopeRejected(_) => ErrorKind::ProofConstraintViolation,
        }
    }
}

/// The four persisted slots of the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLayout {
    #[serde(with = "serde_fr")]
    pub root: Fr,
    #[serde(with = "serde_fr")]
    pub record_count: Fr,
    pub controller: Option<Identity>,
    pub initialized: bool,
}

/// An insertion that passed every check against `prior_root` and has not
/// been applied yet.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagedInsertion {
    prior_root: Fr,
    new_root: Fr,
    slot: Option<u64>,
}

impl StagedInsertion {
    /// Root the contract will hold once this insertion is committed.
    pub fn new_root(&self) -> Fr {
        self.new_root
    }
}

pub struct Contract {
    policy: AccessPolicy,
    root: Fr,
    record_count: u64,
    controller: Option<Identity>,
    phase: Phase,
    verifier: Arc<dyn NestedVerifier>,
}

impl Contract {
    /// Deploy an uninitialized contract. Root and counter start at zero.
    pub fn deploy(policy: AccessPolicy, verifier: Arc<dyn NestedVerifier>) -> Self {
        Self {
            policy,
            root: Fr::from(0u64),
            record_count: 0,
            controller: None,
            phase: Phase::Uninitialized,
            verifier,
        }
    }

    /// Deploy with the controller fixed up front; only it may initialize.
    pub fn deploy_with_controller(
        policy: AccessPolicy,
        verifier: Arc<dyn NestedVerifier>,
        controller: Identity,
    ) -> Self {
        Self {
            controller: Some(controller),
            ..Self::deploy(policy, verifier)
        }
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn root(&self) -> Fr {
        self.root
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn controller(&self) -> Option<Identity> {
        self.controller
    }

    pub fn verifier(&self) -> &dyn NestedVerifier {
        self.verifier.as_ref()
    }

    pub fn layout(&self) -> LedgerLayout {
        LedgerLayout {
            root: self.root,
            record_count: Fr::from(self.record_count),
            controller: self.controller,
            initialized: self.phase == Phase::Active,
        }
    }

    /// Set the initial root and take the lock. The caller becomes the
    /// controller unless one was fixed at deployment.
    pub fn initialize(&mut self, caller: &Identity, root: Fr) -> Result<(), RegistryError> {
        if self.phase != Phase::Uninitialized {
            warn!(%caller, "initialize rejected: already initialized");
            return Err(RegistryError::AlreadyInitialized);
        }
        if let Some(controller) = self.controller {
            if controller != *caller {
                warn!(%caller, "initialize rejected: caller is not the deployed controller");
                return Err(RegistryError::Unauthorized { caller: *caller });
            }
        }

        self.controller = Some(*caller);
        self.root = root;
        self.record_count = 0;
        self.phase = Phase::Active;

        info!(controller = %caller, policy = ?self.policy, "registry initialized");
        Ok(())
    }

    /// Place `fingerprint` in the empty slot `witness` leads to and return
    /// the new root.
    pub fn insert_record(
        &mut self,
        caller: &Identity,
        fingerprint: Fr,
        witness: &SlotPath,
        attestation: Option<&ProofArtifact>,
    ) -> Result<Fr, RegistryError> {
        let staged = self.stage_insertion(caller, fingerprint, witness, attestation)?;
        self.commit_insertion(staged)
    }

    /// Run every insertion check without changing any state. The result is
    /// applied with [`Contract::commit_insertion`].
    pub fn stage_insertion(
        &self,
        caller: &Identity,
        fingerprint: Fr,
        witness: &SlotPath,
        attestation: Option<&ProofArtifact>,
    ) -> Result<StagedInsertion, RegistryError> {
        match self.check_insertion(caller, fingerprint, witness, attestation) {
            Ok(new_root) => Ok(StagedInsertion {
                prior_root: self.root,
                new_root,
                slot: witness.index(),
            }),
            Err(e) => {
                warn!(%caller, height = witness.height(), error = %e, "insertion rejected");
                Err(e)
            }
        }
    }

    /// Apply a staged insertion. Fails with `SlotOccupied` if the root moved
    /// since staging.
    pub fn commit_insertion(&mut self, staged: StagedInsertion) -> Result<Fr, RegistryError> {
        if self.phase != Phase::Active {
            return Err(RegistryError::NotInitialized);
        }
        if staged.prior_root != self.root {
            warn!("staged insertion is stale");
            return Err(RegistryError::SlotOccupied);
        }

        self.root = staged.new_root;
        self.record_count += 1;

        info!(
            slot = ?staged.slot,
            record_count = self.record_count,
            "record inserted"
        );
        Ok(staged.new_root)
    }

    /// Every insertion check, with no side effects. Returns the root the
    /// insertion would commit.
    fn check_insertion(
        &self,
        caller: &Identity,
        fingerprint: Fr,
        witness: &SlotPath,
        attestation: Option<&ProofArtifact>,
    ) -> Result<Fr, RegistryError> {
        if self.phase != Phase::Active {
            return Err(RegistryError::NotInitialized);
        }

        match self.policy {
            AccessPolicy::ControllerOnly => {
                if self.controller != Some(*caller) {
                    return Err(RegistryError::Unauthorized { caller: *caller });
                }
            }
            AccessPolicy::ProofGated => {
                if attestation.is_none() {
                    return Err(RegistryError::AttestationRequired);
                }
            }
        }

        if is_empty_leaf(&fingerprint) {
            return Err(RegistryError::EmptyFingerprint);
        }
        witness.ensure_height(MERKLE_HEIGHT)?;

        if let Some(artifact) = attestation {
            self.check_attestation(artifact, witness)?;
        }

        if !is_vacant(self.root, witness) {
            return Err(RegistryError::SlotOccupied);
        }

        Ok(witness.calculate_root(fingerprint))
    }

    fn check_attestation(&self, artifact: &ProofArtifact, witness: &SlotPath) -> Result<(), RegistryError> {
        if artifact.circuit != CircuitKind::Insertion {
            return Err(RegistryError::WrongCircuit {
                expected: CircuitKind::Insertion,
                actual: artifact.circuit,
            });
        }
        if artifact.public_inputs != witness.public_inputs() {
            return Err(RegistryError::AttestationMismatch);
        }

        match self.verifier.verify_nested(artifact) {
            Ok(true) => {
                debug!(slot = ?witness.index(), "insertion proof accepted");
                Ok(())
            }
            Ok(false) => Err(RegistryError::AttestationRejected(
                "proof does not verify".to_string(),
            )),
            Err(e) => Err(RegistryError::AttestationRejected(e.to_string())),
        }
    }

    /// Check that `fingerprint` sits in the slot `witness` leads to under the
    /// current root. With an envelope, its signature and nested proof must
    /// also hold, and the proof must be about this record.
    pub fn verify_membership(
        &self,
        fingerprint: Fr,
        witness: &SlotPath,
        envelope: Option<&SignedProofEnvelope>,
    ) -> Result<(), RegistryError> {
        if self.phase != Phase::Active {
            return Err(RegistryError::NotInitialized);
        }
        witness.ensure_height(MERKLE_HEIGHT)?;

        if !is_member(self.root, fingerprint, witness) {
            debug!(slot = ?witness.index(), "membership check failed");
            return Err(RegistryError::NotAMember);
        }

        if let Some(envelope) = envelope {
            let artifact = envelope.open(self.verifier.as_ref())?;
            if !Self::concerns_record(artifact, fingerprint, witness) {
                return Err(RegistryError::AttestationMismatch);
            }
            debug!(signer = %envelope.signer, "envelope accepted");
        }

        Ok(())
    }

    /// Whether a nested proof is about the record at `witness`. Insertion
    /// proofs name the slot through their direction bits; membership proofs
    /// name the fingerprint. Either may predate the current root.
    fn concerns_record(artifact: &ProofArtifact, fingerprint: Fr, witness: &SlotPath) -> bool {
        let inputs = &artifact.public_inputs;
        match artifact.circuit {
            CircuitKind::Insertion => {
                let height = witness.height();
                inputs.len() == 2 * height
                    && inputs[height..] == witness.public_inputs()[height..]
            }
            CircuitKind::Membership => inputs.len() == 2 && inputs[1] == fingerprint,
        }
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .field("root", &self.root)
            .field("record_count", &self.record_count)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
