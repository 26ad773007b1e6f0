//! HTTP API server for the user record registry.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod routes;

#[cfg(test)]
mod tests;

use mvs_prover::{load_or_setup, CircuitKeys, Groth16Backend};
use mvs_registry::{Contract, IdentitySigner, InMemoryStorage, Registrar, RegistrarError};

use crate::config::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub keys: Arc<CircuitKeys>,
    pub backend: Groth16Backend,
    pub registrar: Registrar<InMemoryStorage>,
    /// Controller identity; also signs membership envelopes
    pub signer: IdentitySigner,
}

impl AppState {
    /// Deploy a fresh contract over empty storage and initialize it as the
    /// controller.
    pub fn new(config: &ServerConfig, keys: CircuitKeys) -> Result<Self, RegistrarError> {
        let signer = match config.controller_seed {
            Some(seed) => IdentitySigner::from_seed(seed),
            None => IdentitySigner::random(),
        };

        let backend = Groth16Backend::from_keys(&keys);
        let contract = Contract::deploy(config.registry.access_policy, Arc::new(backend.clone()));
        let storage = InMemoryStorage::new(config.registry.merkle_height);

        let mut registrar = Registrar::new(contract, storage, config.registry.clone());
        let root = registrar.bootstrap(&signer.identity())?;
        info!(
            controller = %signer.identity(),
            root = %mvs_circuits::schema::fr_to_hex(&root),
            policy = ?config.registry.access_policy,
            "registry initialized"
        );

        Ok(Self {
            keys: Arc::new(keys),
            backend,
            registrar,
            signer,
        })
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load()?;
    info!(keys_dir = %config.keys_dir.display(), "starting registry proof server");

    let keys = load_or_setup(&config.keys_dir, config.setup_seed)
        .with_context(|| format!("loading circuit keys from {}", config.keys_dir.display()))?;

    let state = AppState::new(&config, keys)?;
    let app = routes::app(Arc::new(RwLock::new(state)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
