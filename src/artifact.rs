//! Deployment discovery artifacts.
//!
//! The deploy flow (out of scope here) writes one small JSON document per
//! contract, `{"address": "0x...", "abi": [...]}`. The relay only needs the
//! registry's address from it; the interfaces themselves are compiled in.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::types::RelayError;

#[derive(Debug, Deserialize)]
pub struct DeploymentArtifact {
    pub address: String,
    #[allow(dead_code)]
    pub abi: serde_json::Value,
}

impl DeploymentArtifact {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!(
                "Deployment artifact {} unreadable: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            RelayError::Configuration(format!(
                "Deployment artifact {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn parsed_address(&self) -> Result<Address, RelayError> {
        Address::from_str(&self.address).map_err(|e| {
            RelayError::Configuration(format!(
                "Deployment artifact holds an invalid address {}: {}",
                self.address, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("relay-artifact-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_artifact() {
        let path = write_temp(
            "ok.json",
            r#"{"address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", "abi": []}"#,
        );
        let artifact = DeploymentArtifact::load(&path).unwrap();
        assert_eq!(
            artifact.parsed_address().unwrap(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_configuration_fault() {
        let err = DeploymentArtifact::load(Path::new("/nonexistent/registry.json")).unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }

    #[test]
    fn test_bad_address_rejected() {
        let path = write_temp("bad.json", r#"{"address": "not-an-address", "abi": []}"#);
        let artifact = DeploymentArtifact::load(&path).unwrap();
        assert!(artifact.parsed_address().is_err());
        std::fs::remove_file(&path).ok();
    }
}
