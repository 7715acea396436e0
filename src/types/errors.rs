use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("RPC endpoint unreachable: {0}")]
    Connectivity(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Signature missing")]
    SignatureMissing,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Contract not registered: {0}")]
    ContractUnresolved(String),

    #[error("Blockchain error: {0}")]
    Blockchain(String),

    #[error("Transaction reverted: {tx_hash}")]
    TransactionReverted { tx_hash: String },

    #[error("Timed out waiting for transaction receipt")]
    Timeout { tx_hash: Option<String> },

    #[error("Inconsistent read: {0}")]
    InconsistentRead(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            RelayError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                msg.clone(),
            ),
            RelayError::Connectivity(msg) => {
                (StatusCode::BAD_GATEWAY, "rpc_unreachable", msg.clone())
            }
            RelayError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            RelayError::SignatureMissing => (
                StatusCode::BAD_REQUEST,
                "signature_missing",
                "A manufacturer signature is required".to_string(),
            ),
            RelayError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                "Signature verification failed".to_string(),
            ),
            RelayError::ContractUnresolved(name) => (
                StatusCode::NOT_FOUND,
                "contract_unresolved",
                format!("Registry has no address for {}", name),
            ),
            RelayError::Blockchain(msg) => {
                (StatusCode::BAD_GATEWAY, "blockchain_error", msg.clone())
            }
            RelayError::TransactionReverted { tx_hash } => (
                StatusCode::BAD_GATEWAY,
                "transaction_reverted",
                format!("Transaction {} was mined but reverted", tx_hash),
            ),
            RelayError::Timeout { .. } => (
                StatusCode::GATEWAY_TIMEOUT,
                "receipt_timeout",
                "Transaction was not mined within the deadline".to_string(),
            ),
            RelayError::InconsistentRead(msg) => {
                (StatusCode::BAD_GATEWAY, "inconsistent_read", msg.clone())
            }
        };

        let tx_hash = match &self {
            RelayError::TransactionReverted { tx_hash } => Some(tx_hash.clone()),
            RelayError::Timeout { tx_hash } => tx_hash.clone(),
            _ => None,
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
            tx_hash,
        };

        (status, Json(body)).into_response()
    }
}
