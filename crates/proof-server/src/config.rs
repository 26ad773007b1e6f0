//! Server configuration.
//!
//! Read from `config/server.json` when present, then overridden by
//! `MVS_`-prefixed environment variables (nested keys use `__`, for example
//! `MVS_REGISTRY__ACCESS_POLICY=proof_gated`).

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use mvs_registry::RegistryConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub keys_dir: PathBuf,
    /// Seed for key generation when no keys are found in `keys_dir`
    pub setup_seed: u64,
    /// Seed for the controller key; a random key is used when unset
    pub controller_seed: Option<u64>,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            keys_dir: PathBuf::from("keys"),
            setup_seed: 42,
            controller_seed: None,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config/server.json")
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MVS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("configuration build error: {e}"))?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("configuration deserialize error: {e}"))?;

        config.registry.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use mvs_registry::AccessPolicy;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load_from("does/not/exist.json").unwrap();

        assert_eq!(config.listen_addr.port(), 3001);
        assert_eq!(config.setup_seed, 42);
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"listen_addr": "127.0.0.1:8080", "controller_seed": 7,
                "registry": {{"access_policy": "proof_gated"}}}}"#
        )
        .unwrap();

        let config = ServerConfig::load_from(path.to_str().unwrap()).unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.controller_seed, Some(7));
        assert_eq!(config.registry.access_policy, AccessPolicy::ProofGated);
        assert_eq!(config.registry.max_insert_attempts, 3);
    }

    #[test]
    fn test_invalid_registry_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(&path, r#"{"registry": {"merkle_height": 8}}"#).unwrap();

        assert!(ServerConfig::load_from(path.to_str().unwrap()).is_err());
    }
}
