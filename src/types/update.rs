use serde::{Deserialize, Serialize};

/// A state-changing registration request from the manufacturer backend.
///
/// `signature` is a hex-encoded ECDSA signature (optional `0x` prefix) over
/// the canonical message `uid:ipfsHash:encryptedKey:hashOfUpdate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub uid: String,
    pub ipfs_hash: String,
    pub encrypted_key: String,
    pub hash_of_update: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub signature: String,
}

/// An update record as exposed by the update contract's `getUpdateInfo`.
///
/// `is_authorized` is caller-scoped on-chain; through this relay it reflects
/// the relay's configured account.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub uid: String,
    pub ipfs_hash: String,
    pub encrypted_key: String,
    pub hash_of_update: String,
    pub description: String,
    pub price: u64,
    pub version: String,
    pub is_authorized: bool,
}

impl UpdateRecord {
    /// Default record returned for an empty or malformed uid.
    pub fn unknown() -> Self {
        Self {
            uid: "unknown".to_string(),
            ipfs_hash: String::new(),
            encrypted_key: String::new(),
            hash_of_update: String::new(),
            description: "no details available".to_string(),
            price: 0,
            version: "0.0.0".to_string(),
            is_authorized: false,
        }
    }

    /// Degraded record returned when the read path exhausted its retries.
    /// All fields are safe zero-values; `description` carries a short
    /// diagnostic for the caller.
    pub fn degraded(uid: &str, diagnostic: &str) -> Self {
        let short: String = diagnostic.chars().take(120).collect();
        Self {
            uid: uid.to_string(),
            ipfs_hash: String::new(),
            encrypted_key: String::new(),
            hash_of_update: String::new(),
            description: format!("lookup failed: {}", short),
            price: 0,
            version: "0.0.0".to_string(),
            is_authorized: false,
        }
    }
}
