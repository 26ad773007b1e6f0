//! Mapping of registry errors to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use mvs_prover::{ProveError, VerifyError};
use mvs_registry::{ErrorKind, RegistrarError, StorageError};

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Precondition not met: wrong phase, caller, or stale state
    #[error("{0}")]
    Conflict(String),
    /// A membership or proof check failed
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ProveError> for ApiError {
    fn from(e: ProveError) -> Self {
        match e {
            ProveError::ConstraintViolation(_) | ProveError::InvalidWitness(_) => {
                ApiError::Unprocessable(e.to_string())
            }
            ProveError::ProofGeneration(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::InvalidInputs { .. } => ApiError::BadRequest(e.to_string()),
            VerifyError::Verification(_) => ApiError::Unprocessable(e.to_string()),
        }
    }
}

impl From<RegistrarError> for ApiError {
    fn from(e: RegistrarError) -> Self {
        match e {
            RegistrarError::Registry(ref inner) => match inner.kind() {
                ErrorKind::PreconditionViolation => ApiError::Conflict(e.to_string()),
                ErrorKind::ProofConstraintViolation => ApiError::Unprocessable(e.to_string()),
            },
            RegistrarError::Prove(inner) => inner.into(),
            RegistrarError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            RegistrarError::Duplicate { .. } | RegistrarError::RetriesExhausted { .. } => {
                ApiError::Conflict(e.to_string())
            }
            RegistrarError::Storage(StorageError::DuplicateAttribute { .. })
            | RegistrarError::Storage(StorageError::Full { .. }) => ApiError::Conflict(e.to_string()),
            RegistrarError::Storage(_) | RegistrarError::Diverged(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
