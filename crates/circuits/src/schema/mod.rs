//! Record schema: field encoding and fingerprints of registry records.
//!
//! Every record flattens into a vector of field elements. The Poseidon hash
//! of that vector is the record's fingerprint and the value placed in its
//! Merkle slot, so two records with the same fingerprint are the same record
//! as far as membership is concerned.

mod encoding;
mod error;
mod primitives;
mod records;


use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::poseidon::hash_many;

pub use encoding::{
    decode_hex, field_to_usize, fr_from_hex, fr_to_hex, pack_bytes, pack_with_length, serde_fr, serde_fr_vec,
    unpack_bytes, unpack_with_length, CHUNK_BYTES,
};
pub use error::SchemaError;
pub use primitives::{BoundedString, PublicKeyBytes, MAX_STRING_BYTES};
pub use records::{ProofRecord, UserData, UserSession};

/// A record type that can live in the registry.
pub trait Schema: Sized {
    /// Attribute name the record is looked up by.
    const INDEX_KEY: &'static str;

    fn to_fields(&self) -> Vec<Fr>;

    fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError>;

    /// Value of the [`Schema::INDEX_KEY`] attribute.
    fn index_value(&self) -> String;

    fn index(&self) -> (&'static str, String) {
        (Self::INDEX_KEY, self.index_value())
    }

    fn fingerprint(&self) -> Fr {
        hash_many(&self.to_fields())
    }

    /// Canonical bytes of the field vector.
    fn encode(&self) -> Result<Vec<u8>, SchemaError> {
        let mut bytes = Vec::new();
        self.to_fields()
            .serialize_compressed(&mut bytes)
            .map_err(|e| SchemaError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Self, SchemaError> {
        let fields = Vec::<Fr>::deserialize_compressed(bytes)
            .map_err(|e| SchemaError::Serialization(e.to_string()))?;
        Self::from_fields(&fields)
    }
}
