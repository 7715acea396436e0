use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Result;
use url::Url;

use crate::artifact::DeploymentArtifact;
use crate::wallet::{Credentials, KeyMode};

/// Application configuration.
///
/// Loaded once at startup and passed into components at construction;
/// nothing reads ambient process state after this point.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// JSON-RPC endpoint of the ledger node
    pub rpc_url: Url,
    /// Address of the on-chain address registry
    pub registry_address: Address,
    /// PEM file holding the manufacturer's ECDSA public key
    pub manufacturer_pubkey_path: PathBuf,
    /// Signing identity (private key, mnemonic, or node-held account)
    pub credentials: Credentials,
    /// Bounded wait for transaction receipts
    pub receipt_timeout: Duration,
    /// API key for service-to-service authentication (optional)
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;

        let rpc_url = env::var("WEB3_PROVIDER")
            .unwrap_or_else(|_| "http://localhost:8545".to_string());
        let rpc_url = Url::parse(&rpc_url)
            .map_err(|e| anyhow::anyhow!("Invalid WEB3_PROVIDER url: {}", e))?;

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            rpc_url,

            registry_address: resolve_registry_address()?,

            manufacturer_pubkey_path: env::var("MANUFACTURER_PUBKEY_PATH")
                .unwrap_or_else(|_| "keys/ecdsa_public_key.pem".to_string())
                .into(),

            credentials,

            receipt_timeout: Duration::from_secs(
                env::var("RECEIPT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            ),

            // If set, register requests must include a matching X-API-Key header
            api_key: env::var("API_KEY").ok(),
        })
    }

    /// Label of the configured key mode
    pub fn key_mode(&self) -> KeyMode {
        self.credentials.mode
    }
}

/// The registry address comes either from REGISTRY_ADDRESS directly, or from
/// the deployment artifact written by the deploy flow (REGISTRY_ARTIFACT,
/// default `registry-service/registry_address.json`).
fn resolve_registry_address() -> Result<Address> {
    if let Ok(raw) = env::var("REGISTRY_ADDRESS") {
        return Address::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid REGISTRY_ADDRESS: {}", e));
    }

    let artifact_path = env::var("REGISTRY_ARTIFACT")
        .unwrap_or_else(|_| "registry-service/registry_address.json".to_string());
    let artifact = DeploymentArtifact::load(Path::new(&artifact_path))
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    artifact.parsed_address().map_err(|e| anyhow::anyhow!("{}", e))
}
