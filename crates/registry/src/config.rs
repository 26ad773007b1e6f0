//! Registry configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mvs_circuits::MERKLE_HEIGHT;

use crate::contract::AccessPolicy;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("merkle_height {configured} does not match the compiled circuit height {compiled}")]
    HeightMismatch { configured: usize, compiled: usize },
    #[error("max_insert_attempts must be at least 1")]
    ZeroAttempts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub access_policy: AccessPolicy,
    pub merkle_height: usize,
    /// Insert attempts before a stale witness is reported to the caller
    pub max_insert_attempts: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            access_policy: AccessPolicy::ControllerOnly,
            merkle_height: MERKLE_HEIGHT,
            max_insert_attempts: 3,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merkle_height != MERKLE_HEIGHT {
            return Err(ConfigError::HeightMismatch {
                configured: self.merkle_height,
                compiled: MERKLE_HEIGHT,
            });
        }
        if self.max_insert_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}
