use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::types::{RelayError, UpdateRecord, UpdateRegistrationRequest};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chain_id: u64,
    pub registry_address: String,
    pub wallet_mode: String,
    pub account: String,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.chain_id,
        registry_address: format!("{:?}", state.config.registry_address),
        wallet_mode: state.config.key_mode().as_str().to_string(),
        account: format!("{:?}", state.config.credentials.account),
    })
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub uid: String,
    pub tx_hash: String,
    pub status: String,
    pub submitted_at: u64,
}

/// POST /updates
///
/// Signature-gated write path. Fails hard: any stage error aborts this
/// request (the relay itself stays available).
pub async fn register_update(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), RelayError> {
    if request.uid.trim().is_empty() {
        return Err(RelayError::InvalidRequest(
            "uid must not be empty".to_string(),
        ));
    }

    info!("Update registration requested for '{}'", request.uid);

    let tx_hash = state.relay.register(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            uid: request.uid,
            tx_hash,
            status: "committed".to_string(),
            submitted_at: chrono::Utc::now().timestamp() as u64,
        }),
    ))
}

/// GET /updates/:uid
///
/// Lenient read path: always answers with a well-formed record, degraded if
/// the lookup failed.
pub async fn get_update(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Json<UpdateRecord> {
    Json(state.relay.get_details(&uid).await)
}
