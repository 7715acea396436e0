//! Manufacturer signature verification.
//!
//! The public key is loaded once at startup from a PEM (SPKI) file. A
//! missing or unparseable key file is a configuration fault and aborts
//! startup; a signature that fails to verify is a per-request rejection.

use std::fs;
use std::path::Path;

use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};
use k256::pkcs8::DecodePublicKey;
use tracing::debug;

use crate::types::RelayError;

/// Verifies detached ECDSA signatures (secp256k1, SHA-256 digest) against
/// the manufacturer's registered public key.
#[derive(Debug)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Load the manufacturer public key from a PEM file.
    pub fn from_pem_file(path: &Path) -> Result<Self, RelayError> {
        let pem = fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!(
                "Manufacturer public key file {} unreadable: {}",
                path.display(),
                e
            ))
        })?;

        let key = VerifyingKey::from_public_key_pem(&pem).map_err(|e| {
            RelayError::Configuration(format!(
                "Manufacturer public key file {} is not a valid SPKI PEM: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self { key })
    }

    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Verify `signature_hex` over `message`. Returns a plain boolean; a
    /// malformed signature is a `false`, never a fault.
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        let Some(bytes) = decode_signature_hex(signature_hex) else {
            debug!("Signature is not valid hex");
            return false;
        };

        let Some(signature) = parse_signature(&bytes) else {
            debug!("Signature bytes are neither 64-byte r||s nor DER");
            return false;
        };

        self.key.verify(message, &signature).is_ok()
    }
}

/// Canonical byte sequence the manufacturer signs for an update registration.
///
/// Fields are joined with literal colons and are NOT escaped, matching what
/// the update contract expects. A colon inside a field would let two
/// different payloads share one signed message; kept as-is because the
/// contract side defines the format.
pub fn canonical_message(
    uid: &str,
    ipfs_hash: &str,
    encrypted_key: &str,
    hash_of_update: &str,
) -> String {
    format!("{}:{}:{}:{}", uid, ipfs_hash, encrypted_key, hash_of_update)
}

/// Decode a hex signature with optional `0x` prefix.
pub fn decode_signature_hex(signature_hex: &str) -> Option<Vec<u8>> {
    let stripped = signature_hex
        .strip_prefix("0x")
        .unwrap_or(signature_hex)
        .trim();
    if stripped.is_empty() {
        return None;
    }
    hex::decode(stripped).ok()
}

fn parse_signature(bytes: &[u8]) -> Option<Signature> {
    if bytes.len() == 64 {
        Signature::from_slice(bytes).ok()
    } else {
        Signature::from_der(bytes).ok()
    }
}
