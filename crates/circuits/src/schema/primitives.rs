//! Fixed-width primitive fields shared by the record types.

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use super::encoding::{chunks_for, decode_hex, field_to_usize, pack_bytes, unpack_bytes};
use super::error::SchemaError;

/// Longest string a record field may hold, in UTF-8 bytes.
pub const MAX_STRING_BYTES: usize = 128;

/// UTF-8 string with a bounded byte length.
///
/// Encoded as a length element followed by enough chunks to carry
/// [`MAX_STRING_BYTES`], so every value has the same field width.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundedString(String);

impl BoundedString {
    pub const FIELD_WIDTH: usize = 1 + chunks_for(MAX_STRING_BYTES);

    pub fn new(value: impl Into<String>) -> Result<Self, SchemaError> {
        let value = value.into();
        if value.len() > MAX_STRING_BYTES {
            return Err(SchemaError::StringTooLong {
                len: value.len(),
                max: MAX_STRING_BYTES,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_fields(&self) -> Vec<Fr> {
        let mut fields = Vec::with_capacity(Self::FIELD_WIDTH);
        fields.push(Fr::from(self.0.len() as u64));
        fields.extend(pack_bytes(self.0.as_bytes()));
        fields.resize(Self::FIELD_WIDTH, Fr::from(0u64));
        fields
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError> {
        if fields.len() != Self::FIELD_WIDTH {
            return Err(SchemaError::FieldCount {
                expected: Self::FIELD_WIDTH,
                actual: fields.len(),
            });
        }

        let len = field_to_usize(&fields[0])
            .filter(|len| *len <= MAX_STRING_BYTES)
            .ok_or(SchemaError::InvalidLength)?;
        let bytes = unpack_bytes(&fields[1..], len)?;
        let value = String::from_utf8(bytes).map_err(|_| SchemaError::InvalidUtf8)?;
        Ok(Self(value))
    }
}

impl TryFrom<String> for BoundedString {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BoundedString {
    type Error = SchemaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BoundedString> for String {
    fn from(value: BoundedString) -> Self {
        value.0
    }
}

impl fmt::Display for BoundedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw 32-byte public key as stored in a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKeyBytes(pub [u8; 32]);

impl PublicKeyBytes {
    pub const FIELD_WIDTH: usize = chunks_for(32);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn to_fields(&self) -> Vec<Fr> {
        pack_bytes(&self.0)
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError> {
        if fields.len() != Self::FIELD_WIDTH {
            return Err(SchemaError::FieldCount {
                expected: Self::FIELD_WIDTH,
                actual: fields.len(),
            });
        }
        let bytes = unpack_bytes(fields, 32)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }
}

impl From<[u8; 32]> for PublicKeyBytes {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for PublicKeyBytes {
    type Err = SchemaError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(text)?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SchemaError::InvalidHex("public key must be 32 bytes".to_string()))?;
        Ok(Self(key))
    }
}

impl TryFrom<String> for PublicKeyBytes {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PublicKeyBytes> for String {
    fn from(value: PublicKeyBytes) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
