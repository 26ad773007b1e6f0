//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use mvs_circuits::schema::fr_to_hex;
use mvs_circuits::{SparseMerkleTree, MERKLE_HEIGHT};
use mvs_prover::{setup_all_circuits, CircuitKeys};
use mvs_registry::AccessPolicy;

use crate::config::ServerConfig;
use crate::{routes, AppState};

const ALICE: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
const BOB: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";

fn keys() -> CircuitKeys {
    static KEYS: OnceLock<CircuitKeys> = OnceLock::new();
    KEYS.get_or_init(|| setup_all_circuits(42).unwrap()).clone()
}

fn app_with(policy: AccessPolicy) -> Router {
    let mut config = ServerConfig {
        controller_seed: Some(7),
        ..ServerConfig::default()
    };
    config.registry.access_policy = policy;

    let state = AppState::new(&config, keys()).unwrap();
    routes::app(Arc::new(RwLock::new(state)))
}

fn app() -> Router {
    app_with(AccessPolicy::ControllerOnly)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn alice_record() -> Value {
    json!({
        "user_address": ALICE,
        "name": "Alice",
        "email": "alice@example.com",
        "image": "https://example.com/alice.png",
    })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_initial_state() {
    let (status, body) = get(&app(), "/api/registry/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initialized"], true);
    assert_eq!(body["policy"], "controller_only");
    assert_eq!(body["next_slot"], 0);
    assert_eq!(
        body["root"],
        fr_to_hex(&SparseMerkleTree::empty_root(MERKLE_HEIGHT))
    );
}

#[tokio::test]
async fn test_register_and_verify_record() {
    let app = app();

    let (status, body) = post(&app, "/api/records", alice_record()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], 0);
    assert_eq!(body["record_count"], 1);
    let root = body["root"].clone();

    let (_, state) = get(&app, "/api/registry/state").await;
    assert_eq!(state["root"], root);
    assert_eq!(state["next_slot"], 1);

    let (status, body) = post(&app, "/api/records/verify", json!({ "user_address": ALICE })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["slot"], 0);
    assert_eq!(body["record"]["session"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_duplicate_record_conflicts() {
    let app = app();

    let (status, _) = post(&app, "/api/records", alice_record()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/records", alice_record()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_unknown_record_not_found() {
    let (status, _) = post(&app(), "/api/records/verify", json!({ "user_address": BOB })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let app = app();

    let mut record = alice_record();
    record["user_address"] = json!("0x1234");
    let (status, _) = post(&app, "/api/records", record).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut record = alice_record();
    record["name"] = json!("x".repeat(200));
    let (status, _) = post(&app, "/api/records", record).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/prove/insertion", json!({ "ml_result": "yes" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_membership_envelope_round_trip() {
    let app = app();
    post(&app, "/api/records", alice_record()).await;

    let (status, envelope) =
        post(&app, "/api/prove/membership", json!({ "user_address": ALICE })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/verify", json!({ "artifact": envelope["artifact"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, body) = post(
        &app,
        "/api/records/verify",
        json!({ "user_address": ALICE, "envelope": envelope }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_envelope_outlives_root_but_not_record() {
    let app = app();
    post(&app, "/api/records", alice_record()).await;
    let (_, envelope) = post(&app, "/api/prove/membership", json!({ "user_address": ALICE })).await;

    // A second record moves the root past the one the envelope proves.
    let mut bob = alice_record();
    bob["user_address"] = json!(BOB);
    post(&app, "/api/records", bob).await;

    let (status, _) = post(
        &app,
        "/api/records/verify",
        json!({ "user_address": ALICE, "envelope": envelope }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/records/verify",
        json!({ "user_address": BOB, "envelope": envelope }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_insertion_proof() {
    let app = app();

    let (status, _) = post(&app, "/api/prove/insertion", json!({ "ml_result": false })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post(&app, "/api/prove/insertion", json!({ "ml_result": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], 0);

    let (status, body) = post(&app, "/api/verify", json!({ "artifact": body["artifact"] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_proof_gated_registration() {
    let app = app_with(AccessPolicy::ProofGated);

    let (status, _) = post(&app, "/api/records", alice_record()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, proof) = post(&app, "/api/prove/insertion", json!({ "ml_result": true })).await;
    let mut record = alice_record();
    record["attestation"] = proof["artifact"].clone();

    let (status, body) = post(&app, "/api/records", record.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], 0);

    // The attestation was bound to slot 0 under the old root.
    record["user_address"] = json!(BOB);
    let (status, _) = post(&app, "/api/records", record).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
