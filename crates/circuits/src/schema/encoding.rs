//! Lossless packing between bytes and field elements.
//!
//! Bytes are split into 31-byte chunks, each read as a little-endian
//! integer, so every chunk is strictly below the BN254 scalar modulus.
//! Unpacking rejects any element that does not fit in 31 bytes.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::error::SchemaError;

/// Bytes carried by one field element.
pub const CHUNK_BYTES: usize = 31;

/// Number of field elements needed to carry `len` bytes.
pub const fn chunks_for(len: usize) -> usize {
    (len + CHUNK_BYTES - 1) / CHUNK_BYTES
}

/// Pack `bytes` into field elements. The byte length is not recorded.
pub fn pack_bytes(bytes: &[u8]) -> Vec<Fr> {
    bytes
        .chunks(CHUNK_BYTES)
        .map(Fr::from_le_bytes_mod_order)
        .collect()
}

/// Unpack field elements into exactly `len` bytes. Padding beyond `len`
/// must be zero.
pub fn unpack_bytes(fields: &[Fr], len: usize) -> Result<Vec<u8>, SchemaError> {
    if fields.len() * CHUNK_BYTES < len {
        return Err(SchemaError::FieldCount {
            expected: chunks_for(len),
            actual: fields.len(),
        });
    }

    let mut bytes = Vec::with_capacity(fields.len() * CHUNK_BYTES);
    for field in fields {
        let chunk = field.into_bigint().to_bytes_le();
        if chunk[CHUNK_BYTES..].iter().any(|b| *b != 0) {
            return Err(SchemaError::NonCanonicalChunk);
        }
        bytes.extend_from_slice(&chunk[..CHUNK_BYTES]);
    }

    if bytes[len..].iter().any(|b| *b != 0) {
        return Err(SchemaError::NonCanonicalChunk);
    }
    bytes.truncate(len);
    Ok(bytes)
}

/// Pack `bytes` behind a length prefix so they can be recovered without
/// knowing their size.
pub fn pack_with_length(bytes: &[u8]) -> Vec<Fr> {
    let mut fields = Vec::with_capacity(1 + chunks_for(bytes.len()));
    fields.push(Fr::from(bytes.len() as u64));
    fields.extend(pack_bytes(bytes));
    fields
}

/// Inverse of [`pack_with_length`].
pub fn unpack_with_length(fields: &[Fr]) -> Result<Vec<u8>, SchemaError> {
    let (prefix, body) = fields.split_first().ok_or(SchemaError::InvalidLength)?;
    let len = field_to_usize(prefix).ok_or(SchemaError::InvalidLength)?;
    if body.len() != chunks_for(len) {
        return Err(SchemaError::FieldCount {
            expected: chunks_for(len),
            actual: body.len(),
        });
    }
    unpack_bytes(body, len)
}

/// Read a small field element back as an integer.
pub fn field_to_usize(field: &Fr) -> Option<usize> {
    let limbs = field.into_bigint().0;
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return None;
    }
    usize::try_from(limbs[0]).ok()
}

/// Canonical compressed encoding of a field element as `0x` hex.
pub fn fr_to_hex(value: &Fr) -> String {
    let mut bytes = Vec::with_capacity(32);
    // Writing into a Vec cannot fail.
    let _ = value.serialize_compressed(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// Parse a field element written by [`fr_to_hex`]. Non-canonical values are
/// rejected.
pub fn fr_from_hex(text: &str) -> Result<Fr, SchemaError> {
    let bytes = decode_hex(text)?;
    if bytes.len() != 32 {
        return Err(SchemaError::InvalidHex(
            "field element must be 32 bytes".to_string(),
        ));
    }
    Fr::deserialize_compressed(bytes.as_slice())
        .map_err(|e| SchemaError::InvalidHex(e.to_string()))
}

/// Decode hex with an optional `0x` prefix.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, SchemaError> {
    hex::decode(text.trim_start_matches("0x")).map_err(|e| SchemaError::InvalidHex(e.to_string()))
}

/// Serde adapter for a single field element as hex.
pub mod serde_fr {
    use ark_bn254::Fr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::fr_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::fr_from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a vector of field elements as hex strings.
pub mod serde_fr_vec {
    use ark_bn254::Fr;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&super::fr_to_hex(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .iter()
            .map(|text| super::fr_from_hex(text).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod encoding_tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let bytes: Vec<u8> = (0..100u8).collect();
        let fields = pack_bytes(&bytes);

        assert_eq!(fields.len(), 4);
        assert_eq!(unpack_bytes(&fields, bytes.len()).unwrap(), bytes);
    }

    #[test]
    fn test_length_prefixed() {
        let bytes = b"registry proof bytes".repeat(9);
        let fields = pack_with_length(&bytes);

        assert_eq!(fields[0], Fr::from(bytes.len() as u64));
        assert_eq!(unpack_with_length(&fields).unwrap(), bytes);
    }

    #[test]
    fn test_trailing_zero_bytes_survive() {
        let bytes = vec![1u8, 0, 0, 0];
        assert_eq!(unpack_with_length(&pack_with_length(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_rejects_wide_element() {
        // -1 occupies all 32 bytes
        let fields = vec![-Fr::from(1u64)];
        assert_eq!(unpack_bytes(&fields, 31), Err(SchemaError::NonCanonicalChunk));
    }

    #[test]
    fn test_rejects_nonzero_padding() {
        let fields = pack_bytes(&[7u8, 8, 9]);
        assert_eq!(unpack_bytes(&fields, 2), Err(SchemaError::NonCanonicalChunk));
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        let mut fields = pack_with_length(&[1u8; 40]);
        fields[0] = Fr::from(100u64);
        assert!(unpack_with_length(&fields).is_err());
        assert_eq!(unpack_with_length(&[]), Err(SchemaError::InvalidLength));
    }

    #[test]
    fn test_hex_round_trip() {
        let value = Fr::from(0xdead_beef_u64);
        let text = fr_to_hex(&value);

        assert!(text.starts_with("0x"));
        assert_eq!(fr_from_hex(&text).unwrap(), value);
        assert!(fr_from_hex("0x1234").is_err());
        assert!(fr_from_hex("zz").is_err());
    }
}
