//! Signing credentials.
//!
//! Three key modes:
//! - `private_key`: sign locally with PRIVATE_KEY
//! - `mnemonic`: sign locally with a key derived from MNEMONIC
//! - `none`: no local key; writes fall back to the node's own account
//!   (`eth_sendTransaction`), which requires ACCOUNT_ADDRESS and a node
//!   that holds that key. Development topologies only.

use std::env;
use std::str::FromStr;

use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use tracing::info;

/// Key mode for credential initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    PrivateKey,
    Mnemonic,
    None,
}

impl KeyMode {
    /// Detect key mode from environment
    pub fn from_env() -> Self {
        if let Ok(mode) = env::var("KEY_MODE") {
            match mode.to_lowercase().as_str() {
                "mnemonic" => return KeyMode::Mnemonic,
                "private_key" | "privatekey" | "key" => return KeyMode::PrivateKey,
                "none" | "unsigned" => return KeyMode::None,
                _ => {} // Fall through to auto-detect
            }
        }

        if env::var("MNEMONIC").is_ok() {
            KeyMode::Mnemonic
        } else if env::var("PRIVATE_KEY").is_ok() {
            KeyMode::PrivateKey
        } else {
            KeyMode::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::PrivateKey => "private_key",
            KeyMode::Mnemonic => "mnemonic",
            KeyMode::None => "none",
        }
    }
}

/// Immutable process-wide signing identity, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub mode: KeyMode,
    pub account: Address,
    private_key: Option<String>,
}

impl Credentials {
    /// Initialize credentials from environment variables.
    ///
    /// Supported env vars:
    /// - `KEY_MODE`: optional; "mnemonic", "private_key" or "none". Auto-detects if unset.
    /// - `PRIVATE_KEY`: hex-encoded private key for private_key mode.
    /// - `MNEMONIC` + `DERIVATION_INDEX`: BIP-39 phrase and HD index for mnemonic mode.
    /// - `ACCOUNT_ADDRESS`: submitting account; required in mode "none",
    ///   derived from the key otherwise.
    pub fn from_env() -> anyhow::Result<Self> {
        let mode = KeyMode::from_env();

        match mode {
            KeyMode::Mnemonic => {
                let mnemonic = env::var("MNEMONIC")
                    .map_err(|_| anyhow::anyhow!("MNEMONIC env var required for mnemonic mode"))?;

                let index: u32 = env::var("DERIVATION_INDEX")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .unwrap_or(0);

                let (private_key, account) = derive_from_mnemonic(&mnemonic, index)?;

                info!(
                    "Credentials initialized from mnemonic (index: {}, account: {})",
                    index, account
                );

                Ok(Self {
                    mode,
                    account,
                    private_key: Some(private_key),
                })
            }
            KeyMode::PrivateKey => {
                let private_key = env::var("PRIVATE_KEY").map_err(|_| {
                    anyhow::anyhow!("PRIVATE_KEY env var required for private_key mode")
                })?;

                let account = derive_address(&private_key)?;

                info!(
                    "Credentials initialized from private key (account: {})",
                    account
                );

                Ok(Self {
                    mode,
                    account,
                    private_key: Some(private_key),
                })
            }
            KeyMode::None => {
                let raw = env::var("ACCOUNT_ADDRESS").map_err(|_| {
                    anyhow::anyhow!(
                        "ACCOUNT_ADDRESS env var required when no signing key is configured"
                    )
                })?;
                let account = Address::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("Invalid ACCOUNT_ADDRESS: {}", e))?;

                info!(
                    "No signing key configured; transactions will be handed to the node unsigned (account: {})",
                    account
                );

                Ok(Self {
                    mode,
                    account,
                    private_key: None,
                })
            }
        }
    }

    /// Unsigned-mode credentials for tests.
    #[cfg(test)]
    pub(crate) fn unsigned_for_tests(account: Address) -> Self {
        Self {
            mode: KeyMode::None,
            account,
            private_key: None,
        }
    }

    /// Check if local signing is available
    pub fn can_sign(&self) -> bool {
        self.private_key.is_some()
    }

    /// Build a local signer from the configured key.
    pub fn signer(&self) -> anyhow::Result<PrivateKeySigner> {
        let key = self
            .private_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No signing key configured"))?;
        let key = key.strip_prefix("0x").unwrap_or(key);
        key.parse()
            .map_err(|e| anyhow::anyhow!("Invalid private key: {}", e))
    }
}

/// Derive private key and account address from a BIP-39 mnemonic.
///
/// Uses the standard Ethereum derivation path: m/44'/60'/0'/0/{index}
fn derive_from_mnemonic(mnemonic: &str, index: u32) -> anyhow::Result<(String, Address)> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(index)
        .map_err(|e| anyhow::anyhow!("Invalid derivation index: {}", e))?
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to derive from mnemonic: {}", e))?;

    let private_key = format!("0x{}", hex::encode(signer.credential().to_bytes()));
    let address = signer.address();

    Ok((private_key, address))
}

/// Derive the account address from a private key
fn derive_address(private_key: &str) -> anyhow::Result<Address> {
    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let signer: PrivateKeySigner = key
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid private key: {}", e))?;

    Ok(signer.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_from_mnemonic() {
        // Standard test mnemonic (DO NOT USE IN PRODUCTION)
        let mnemonic = "test test test test test test test test test test test junk";
        let (private_key, address) = derive_from_mnemonic(mnemonic, 0).unwrap();

        assert!(private_key.starts_with("0x"));
        assert_eq!(private_key.len(), 66); // 0x + 64 hex chars
        assert_eq!(
            format!("{:?}", address).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_derive_address() {
        // Known test key (first hardhat/ganache dev account)
        let private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let address = derive_address(private_key).unwrap();

        assert_eq!(
            format!("{:?}", address).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_key_mode_labels() {
        assert_eq!(KeyMode::PrivateKey.as_str(), "private_key");
        assert_eq!(KeyMode::Mnemonic.as_str(), "mnemonic");
        assert_eq!(KeyMode::None.as_str(), "none");
    }

    #[test]
    fn test_signer_requires_key() {
        let creds = Credentials {
            mode: KeyMode::None,
            account: Address::ZERO,
            private_key: None,
        };
        assert!(!creds.can_sign());
        assert!(creds.signer().is_err());
    }
}
