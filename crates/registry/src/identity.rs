//! Ed25519 identities for controllers and proof signers.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, OsRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mvs_circuits::schema::decode_hex;
use mvs_circuits::PublicKeyBytes;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    #[error("signature verification failed")]
    BadSignature,
}

/// Public identity of a controller or signer.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(VerifyingKey);

impl Identity {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, IdentityError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Record encoding of this key.
    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        PublicKeyBytes(self.to_bytes())
    }

    /// Strict Ed25519 verification of `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), IdentityError> {
        self.0
            .verify_strict(message, signature)
            .map_err(|_| IdentityError::BadSignature)
    }
}

impl TryFrom<PublicKeyBytes> for Identity {
    type Error = IdentityError;

    fn try_from(value: PublicKeyBytes) -> Result<Self, Self::Error> {
        Self::from_bytes(value.as_bytes())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(text).map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidKey("expected 32 bytes".to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.to_hex())
    }
}

/// Holder of an Ed25519 secret key.
#[derive(Clone)]
pub struct IdentitySigner {
    secret_key: SigningKey,
}

impl IdentitySigner {
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self {
            secret_key: SigningKey::generate(rng),
        }
    }

    /// Deterministic signer, for tests and local deployments.
    pub fn from_seed(seed: u64) -> Self {
        Self::generate(&mut ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn random() -> Self {
        Self::generate(&mut OsRng)
    }

    pub fn identity(&self) -> Identity {
        Identity(self.secret_key.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.secret_key.sign(message)
    }
}

impl fmt::Debug for IdentitySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySigner")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Serde adapter for a signature as `0x` hex.
pub mod signature_hex {
    use ed25519_dalek::Signature;
    use serde::{Deserialize, Deserializer, Serializer};

    use mvs_circuits::schema::decode_hex;

    pub fn serialize<S: Serializer>(signature: &Signature, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(signature.to_bytes())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = decode_hex(&text).map_err(serde::de::Error::custom)?;
        Signature::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}
