//! HTTP request handlers for the record registry.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use mvs_circuits::schema::fr_to_hex;
use mvs_circuits::{PublicKeyBytes, Schema, UserData, UserSession};
use mvs_prover::{NestedVerifier, ProofArtifact};
use mvs_registry::{
    AccessPolicy, LedgerLayout, RegistrarError, SignedProofEnvelope, StorageAdapter,
};

use crate::error::ApiError;
use crate::AppState;

type SharedState = State<Arc<RwLock<AppState>>>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn parse_address(text: &str) -> Result<PublicKeyBytes, ApiError> {
    PublicKeyBytes::from_str(text)
        .map_err(|e| ApiError::BadRequest(format!("invalid user_address: {e}")))
}

// ============ Registry State ============

#[derive(Serialize)]
pub struct RegistryStateResponse {
    #[serde(flatten)]
    pub layout: LedgerLayout,
    pub policy: AccessPolicy,
    pub next_slot: u64,
}

pub async fn registry_state(State(state): SharedState) -> Json<RegistryStateResponse> {
    let state = state.read().await;
    let contract = state.registrar.contract();

    Json(RegistryStateResponse {
        layout: contract.layout(),
        policy: contract.policy(),
        next_slot: state.registrar.storage().next_index(),
    })
}

// ============ Insertion Validity ============

#[derive(Deserialize)]
pub struct InsertionRequest {
    pub ml_result: bool,
}

#[derive(Serialize)]
pub struct InsertionResponse {
    pub slot: u64,
    pub artifact: ProofArtifact,
}

pub async fn prove_insertion(
    State(state): SharedState,
    payload: Result<Json<InsertionRequest>, JsonRejection>,
) -> Result<Json<InsertionResponse>, ApiError> {
    let Json(req) = payload?;
    let state = state.read().await;

    let artifact = state
        .registrar
        .prove_admission(&state.keys.insertion.proving_key, req.ml_result)?;

    Ok(Json(InsertionResponse {
        slot: state.registrar.storage().next_index(),
        artifact,
    }))
}

// ============ Records ============

#[derive(Deserialize)]
pub struct RecordRequest {
    pub user_address: String,
    pub name: String,
    pub email: String,
    pub image: String,
    #[serde(default)]
    pub attestation: Option<ProofArtifact>,
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub slot: u64,
    pub root: String,
    pub record_count: u64,
}

pub async fn register_record(
    State(state): SharedState,
    payload: Result<Json<RecordRequest>, JsonRejection>,
) -> Result<Json<RecordResponse>, ApiError> {
    let Json(req) = payload?;

    let session = UserSession::new(&req.name, &req.email, &req.image)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let record = UserData {
        user_address: parse_address(&req.user_address)?,
        session,
    };

    let mut state = state.write().await;
    let caller = state.signer.identity();
    let registration = state
        .registrar
        .register(&caller, &record, req.attestation.as_ref())?;

    Ok(Json(RecordResponse {
        slot: registration.index,
        root: fr_to_hex(&registration.root),
        record_count: registration.record_count,
    }))
}

#[derive(Deserialize)]
pub struct VerifyRecordRequest {
    pub user_address: String,
    #[serde(default)]
    pub envelope: Option<SignedProofEnvelope>,
}

#[derive(Serialize)]
pub struct VerifyRecordResponse {
    pub valid: bool,
    pub slot: u64,
    pub fingerprint: String,
    pub record: UserData,
}

pub async fn verify_record(
    State(state): SharedState,
    payload: Result<Json<VerifyRecordRequest>, JsonRejection>,
) -> Result<Json<VerifyRecordResponse>, ApiError> {
    let Json(req) = payload?;
    let address = parse_address(&req.user_address)?;

    let state = state.read().await;
    let found = state.registrar.check_membership(
        UserData::INDEX_KEY,
        &address.to_hex(),
        req.envelope.as_ref(),
    )?;
    let record = found
        .load::<UserData>()
        .map_err(RegistrarError::from)?;

    Ok(Json(VerifyRecordResponse {
        valid: true,
        slot: found.index,
        fingerprint: fr_to_hex(&found.fingerprint),
        record,
    }))
}

// ============ Membership ============

#[derive(Deserialize)]
pub struct MembershipRequest {
    pub user_address: String,
}

pub async fn prove_membership(
    State(state): SharedState,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> Result<Json<SignedProofEnvelope>, ApiError> {
    let Json(req) = payload?;
    let address = parse_address(&req.user_address)?;

    let state = state.read().await;
    let artifact = state.registrar.prove_record_membership(
        &state.keys.membership.proving_key,
        UserData::INDEX_KEY,
        &address.to_hex(),
    )?;

    let envelope = SignedProofEnvelope::seal(&state.signer, artifact)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(envelope))
}

// ============ Verification ============

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub artifact: ProofArtifact,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

pub async fn verify(
    State(state): SharedState,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(req) = payload?;
    let state = state.read().await;

    let valid = state.backend.verify_nested(&req.artifact)?;
    Ok(Json(VerifyResponse { valid }))
}
