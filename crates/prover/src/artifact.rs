//! Proof artifacts: a proof together with the circuit and public inputs it
//! was produced for.

use std::fmt;

use ark_bn254::{Bn254, Fr};
use ark_groth16::Proof;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mvs_circuits::schema::{
    decode_hex, field_to_usize, fr_to_hex, pack_with_length, serde_fr_vec, unpack_with_length,
};

/// Errors while encoding or decoding an artifact
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Unknown circuit tag: {0}")]
    UnknownCircuit(u8),
    #[error("Malformed artifact: {0}")]
    Malformed(String),
}

/// Circuits a proof can be produced for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    Insertion,
    Membership,
}

impl CircuitKind {
    fn tag(self) -> u8 {
        match self {
            CircuitKind::Insertion => 1,
            CircuitKind::Membership => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, ArtifactError> {
        match tag {
            1 => Ok(CircuitKind::Insertion),
            2 => Ok(CircuitKind::Membership),
            other => Err(ArtifactError::UnknownCircuit(other)),
        }
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitKind::Insertion => f.write_str("insertion"),
            CircuitKind::Membership => f.write_str("membership"),
        }
    }
}

/// A proof with its public inputs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArtifactWire", into = "ArtifactWire")]
pub struct ProofArtifact {
    pub circuit: CircuitKind,
    pub proof: Proof<Bn254>,
    pub public_inputs: Vec<Fr>,
}

impl ProofArtifact {
    pub fn new(circuit: CircuitKind, proof: Proof<Bn254>, public_inputs: Vec<Fr>) -> Self {
        Self {
            circuit,
            proof,
            public_inputs,
        }
    }

    /// Serialize proof to bytes
    pub fn proof_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ArtifactError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ArtifactError::Serialization(e.to_string()))
    }

    /// Canonical bytes: circuit tag, proof, public inputs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let mut bytes = vec![self.circuit.tag()];
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        self.public_inputs
            .serialize_compressed(&mut bytes)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let (tag, body) = bytes
            .split_first()
            .ok_or_else(|| ArtifactError::Malformed("empty input".to_string()))?;
        let circuit = CircuitKind::from_tag(*tag)?;

        let mut reader = body;
        let proof = Proof::deserialize_compressed(&mut reader)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        let public_inputs = Vec::<Fr>::deserialize_compressed(&mut reader)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        if !reader.is_empty() {
            return Err(ArtifactError::Malformed(format!(
                "{} trailing bytes",
                reader.len()
            )));
        }

        Ok(Self {
            circuit,
            proof,
            public_inputs,
        })
    }

    /// Field encoding: public inputs followed by the length-prefixed packing
    /// of the proof bytes. Envelope signatures are computed over this.
    pub fn to_fields(&self) -> Result<Vec<Fr>, ArtifactError> {
        let mut fields = Vec::with_capacity(self.public_inputs.len() + 8);
        fields.push(Fr::from(self.circuit.tag() as u64));
        fields.push(Fr::from(self.public_inputs.len() as u64));
        fields.extend_from_slice(&self.public_inputs);
        fields.extend(pack_with_length(&self.proof_bytes()?));
        Ok(fields)
    }

    /// Canonical bytes of [`ProofArtifact::to_fields`].
    pub fn field_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let mut bytes = Vec::new();
        self.to_fields()?
            .serialize_compressed(&mut bytes)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Inverse of [`ProofArtifact::to_fields`].
    pub fn from_fields(fields: &[Fr]) -> Result<Self, ArtifactError> {
        let malformed = |what: &str| ArtifactError::Malformed(what.to_string());

        let (tag, rest) = fields.split_first().ok_or_else(|| malformed("missing tag"))?;
        let tag = u8::try_from(field_to_usize(tag).ok_or_else(|| malformed("bad tag"))?)
            .map_err(|_| malformed("bad tag"))?;
        let circuit = CircuitKind::from_tag(tag)?;

        let (count, rest) = rest.split_first().ok_or_else(|| malformed("missing count"))?;
        let count = field_to_usize(count)
            .filter(|count| *count <= rest.len())
            .ok_or_else(|| malformed("bad input count"))?;
        let (public_inputs, proof_fields) = rest.split_at(count);

        let proof_bytes =
            unpack_with_length(proof_fields).map_err(|e| ArtifactError::Malformed(e.to_string()))?;

        Ok(Self {
            circuit,
            proof: Self::deserialize_proof(&proof_bytes)?,
            public_inputs: public_inputs.to_vec(),
        })
    }
}

/// JSON shape of an artifact: hex proof bytes and hex field elements
#[derive(Serialize, Deserialize)]
struct ArtifactWire {
    circuit: CircuitKind,
    proof: String,
    #[serde(with = "serde_fr_vec")]
    public_inputs: Vec<Fr>,
}

impl From<ProofArtifact> for ArtifactWire {
    fn from(artifact: ProofArtifact) -> Self {
        let mut proof = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = artifact.proof.serialize_compressed(&mut proof);
        Self {
            circuit: artifact.circuit,
            proof: format!("0x{}", hex::encode(proof)),
            public_inputs: artifact.public_inputs,
        }
    }
}

impl TryFrom<ArtifactWire> for ProofArtifact {
    type Error = ArtifactError;

    fn try_from(wire: ArtifactWire) -> Result<Self, Self::Error> {
        let bytes = decode_hex(&wire.proof).map_err(|e| ArtifactError::Malformed(e.to_string()))?;
        Ok(Self {
            circuit: wire.circuit,
            proof: Self::deserialize_proof(&bytes)?,
            public_inputs: wire.public_inputs,
        })
    }
}

impl fmt::Display for ProofArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} proof", self.circuit)?;
        if let Some(first) = self.public_inputs.first() {
            write!(f, " ({} inputs, first {})", self.public_inputs.len(), fr_to_hex(first))?;
        }
        Ok(())
    }
}
