//! Record types stored in the registry.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use super::encoding::{field_to_usize, pack_with_length, serde_fr_vec, unpack_with_length};
use super::error::SchemaError;
use super::primitives::{BoundedString, PublicKeyBytes};
use super::Schema;

fn expect_width(fields: &[Fr], expected: usize) -> Result<(), SchemaError> {
    if fields.len() != expected {
        return Err(SchemaError::FieldCount {
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

/// Profile data attached to a registered user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub name: BoundedString,
    pub email: BoundedString,
    pub image: BoundedString,
}

impl UserSession {
    pub const FIELD_WIDTH: usize = 3 * BoundedString::FIELD_WIDTH;

    pub fn new(name: &str, email: &str, image: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            name: BoundedString::new(name)?,
            email: BoundedString::new(email)?,
            image: BoundedString::new(image)?,
        })
    }

    pub fn to_fields(&self) -> Vec<Fr> {
        let mut fields = Vec::with_capacity(Self::FIELD_WIDTH);
        fields.extend(self.name.to_fields());
        fields.extend(self.email.to_fields());
        fields.extend(self.image.to_fields());
        fields
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError> {
        expect_width(fields, Self::FIELD_WIDTH)?;
        let (name, rest) = fields.split_at(BoundedString::FIELD_WIDTH);
        let (email, image) = rest.split_at(BoundedString::FIELD_WIDTH);
        Ok(Self {
            name: BoundedString::from_fields(name)?,
            email: BoundedString::from_fields(email)?,
            image: BoundedString::from_fields(image)?,
        })
    }
}

/// A user registered under their address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_address: PublicKeyBytes,
    pub session: UserSession,
}

impl Schema for UserData {
    const INDEX_KEY: &'static str = "userAddress";

    fn to_fields(&self) -> Vec<Fr> {
        let mut fields = self.user_address.to_fields();
        fields.extend(self.session.to_fields());
        fields
    }

    fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError> {
        expect_width(fields, PublicKeyBytes::FIELD_WIDTH + UserSession::FIELD_WIDTH)?;
        let (address, session) = fields.split_at(PublicKeyBytes::FIELD_WIDTH);
        Ok(Self {
            user_address: PublicKeyBytes::from_fields(address)?,
            session: UserSession::from_fields(session)?,
        })
    }

    fn index_value(&self) -> String {
        self.user_address.to_hex()
    }
}

/// A serialized proof kept in the registry next to its owner.
///
/// `proof` holds the length-prefixed byte packing of the proof so the record
/// stays a flat field vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub user_id: BoundedString,
    pub user_pub_key: PublicKeyBytes,
    #[serde(with = "serde_fr_vec")]
    pub proof: Vec<Fr>,
}

impl ProofRecord {
    const HEADER_WIDTH: usize = BoundedString::FIELD_WIDTH + PublicKeyBytes::FIELD_WIDTH;

    pub fn from_proof_bytes(
        user_id: BoundedString,
        user_pub_key: PublicKeyBytes,
        proof: &[u8],
    ) -> Self {
        Self {
            user_id,
            user_pub_key,
            proof: pack_with_length(proof),
        }
    }

    /// Recover the proof bytes stored by [`ProofRecord::from_proof_bytes`].
    pub fn proof_bytes(&self) -> Result<Vec<u8>, SchemaError> {
        unpack_with_length(&self.proof)
    }
}

impl Schema for ProofRecord {
    const INDEX_KEY: &'static str = "userId";

    fn to_fields(&self) -> Vec<Fr> {
        let mut fields = Vec::with_capacity(Self::HEADER_WIDTH + 1 + self.proof.len());
        fields.extend(self.user_id.to_fields());
        fields.extend(self.user_pub_key.to_fields());
        fields.push(Fr::from(self.proof.len() as u64));
        fields.extend_from_slice(&self.proof);
        fields
    }

    fn from_fields(fields: &[Fr]) -> Result<Self, SchemaError> {
        if fields.len() <= Self::HEADER_WIDTH {
            return Err(SchemaError::FieldCount {
                expected: Self::HEADER_WIDTH + 1,
                actual: fields.len(),
            });
        }

        let (user_id, rest) = fields.split_at(BoundedString::FIELD_WIDTH);
        let (user_pub_key, rest) = rest.split_at(PublicKeyBytes::FIELD_WIDTH);
        let (count, proof) = rest.split_first().ok_or(SchemaError::InvalidLength)?;

        if field_to_usize(count) != Some(proof.len()) {
            return Err(SchemaError::InvalidLength);
        }

        Ok(Self {
            user_id: BoundedString::from_fields(user_id)?,
            user_pub_key: PublicKeyBytes::from_fields(user_pub_key)?,
            proof: proof.to_vec(),
        })
    }

    fn index_value(&self) -> String {
        self.user_id.as_str().to_string()
    }
}
