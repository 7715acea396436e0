use alloy::primitives::Address;
use tracing::{debug, error};
use url::Url;

use crate::abi::IAddressRegistry::IAddressRegistryInstance;
use crate::blockchain::http_provider;
use crate::types::RelayError;

/// Resolves logical contract names through the on-chain address registry.
///
/// Every resolution is a fresh view call; the underlying address can change
/// whenever the registry is updated, so nothing is cached here.
pub struct RegistryResolver {
    rpc_url: Url,
    registry_address: Address,
}

impl RegistryResolver {
    pub fn new(rpc_url: Url, registry_address: Address) -> Self {
        Self {
            rpc_url,
            registry_address,
        }
    }

    /// Look up the current address registered under `name`.
    ///
    /// Both a revert (registries that fault on unknown names) and a returned
    /// all-zero address (registries that return a sentinel instead) surface
    /// as `ContractUnresolved`; a zero address is never handed to a caller.
    pub async fn resolve(&self, name: &str) -> Result<Address, RelayError> {
        debug!("Resolving contract address for '{}'", name);

        let provider = http_provider(&self.rpc_url);
        let registry = IAddressRegistryInstance::new(self.registry_address, provider);

        match registry.getContractAddress(name.to_string()).call().await {
            Ok(ret) => {
                if ret._0.is_zero() {
                    Err(RelayError::ContractUnresolved(name.to_string()))
                } else {
                    debug!("Resolved '{}' to {}", name, ret._0);
                    Ok(ret._0)
                }
            }
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("revert") || err_str.contains("reverted") {
                    Err(RelayError::ContractUnresolved(name.to_string()))
                } else {
                    error!("getContractAddress call failed: {}", err_str);
                    Err(RelayError::Blockchain(format!(
                        "getContractAddress failed: {}",
                        err_str
                    )))
                }
            }
        }
    }
}
