pub mod resolver;
pub mod retry;
pub mod submitter;

use std::time::Duration;

use alloy::{
    network::Ethereum,
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use tracing::{info, warn};
use url::Url;

use crate::types::RelayError;

pub type HttpProvider = RootProvider<Http<Client>, Ethereum>;

/// Create a fresh read-only provider. Providers are request-scoped on
/// purpose; nothing is cached across operations.
pub fn http_provider(rpc_url: &Url) -> HttpProvider {
    ProviderBuilder::new().on_http(rpc_url.clone())
}

/// Startup connectivity probe. Distinct from the per-call read retry: this
/// runs once before the service accepts requests, and exhaustion is fatal.
pub async fn connect_with_retry(
    rpc_url: &Url,
    max_attempts: u32,
    delay: Duration,
) -> Result<u64, RelayError> {
    let provider = http_provider(rpc_url);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match provider.get_chain_id().await {
            Ok(chain_id) => {
                info!("Connected to {} (chain id: {})", rpc_url, chain_id);
                return Ok(chain_id);
            }
            Err(e) => {
                warn!(
                    "RPC connection attempt {}/{} failed: {}",
                    attempt, max_attempts, e
                );
                last_error = e.to_string();
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(delay).await;
        }
    }

    Err(RelayError::Connectivity(format!(
        "Could not reach {} after {} attempts. Last error: {}",
        rpc_url, max_attempts, last_error
    )))
}
