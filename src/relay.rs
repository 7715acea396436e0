//! Request orchestration.
//!
//! Register: signature gate -> registry resolution -> transaction
//! submission. The gate runs first so a bad request costs zero network
//! calls. GetDetails: registry resolution -> retried view call, degrading
//! to a default record instead of failing; detail lookups are probed
//! speculatively by callers and must not abort them.

use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolCall;
use tracing::{info, warn};
use url::Url;

use crate::abi::ISoftwareUpdate;
use crate::blockchain::http_provider;
use crate::blockchain::resolver::RegistryResolver;
use crate::blockchain::retry::{read_with_retry, RetryPolicy};
use crate::blockchain::submitter::{TransactionSubmitter, GAS_LIMIT_REGISTER_UPDATE};
use crate::signature::{canonical_message, decode_signature_hex, SignatureVerifier};
use crate::types::{RelayError, UpdateRecord, UpdateRegistrationRequest};

/// Logical name the update contract is registered under.
pub const UPDATE_CONTRACT_NAME: &str = "SoftwareUpdateContract";

pub struct UpdateRelay {
    verifier: SignatureVerifier,
    resolver: RegistryResolver,
    submitter: TransactionSubmitter,
    rpc_url: Url,
    retry: RetryPolicy,
}

impl UpdateRelay {
    pub fn new(
        verifier: SignatureVerifier,
        resolver: RegistryResolver,
        submitter: TransactionSubmitter,
        rpc_url: Url,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            verifier,
            resolver,
            submitter,
            rpc_url,
            retry,
        }
    }

    /// Register a new update on-chain. Returns the transaction hash of the
    /// mined, status-success transaction.
    pub async fn register(
        &self,
        request: &UpdateRegistrationRequest,
    ) -> Result<String, RelayError> {
        if request.signature.trim().is_empty() {
            warn!("Registration for '{}' carried no signature", request.uid);
            return Err(RelayError::SignatureMissing);
        }

        let message = canonical_message(
            &request.uid,
            &request.ipfs_hash,
            &request.encrypted_key,
            &request.hash_of_update,
        );

        if !self.verifier.verify(message.as_bytes(), &request.signature) {
            warn!("Signature verification failed for '{}'", request.uid);
            return Err(RelayError::InvalidSignature);
        }
        info!("Signature verified for '{}'", request.uid);

        // Verification already decoded this hex once.
        let signature_bytes =
            decode_signature_hex(&request.signature).ok_or(RelayError::InvalidSignature)?;

        let contract_address = self.resolver.resolve(UPDATE_CONTRACT_NAME).await?;

        let call = ISoftwareUpdate::registerUpdateCall {
            uid: request.uid.clone(),
            ipfsHash: request.ipfs_hash.clone(),
            encryptedKey: request.encrypted_key.clone(),
            hashOfUpdate: request.hash_of_update.clone(),
            description: request.description.clone(),
            price: U256::from(request.price),
            version: request.version.clone(),
            signature: Bytes::from(signature_bytes),
        };

        let receipt = self
            .submitter
            .submit(
                contract_address,
                call.abi_encode(),
                None,
                GAS_LIMIT_REGISTER_UPDATE,
            )
            .await?;

        let tx_hash = format!("0x{}", hex::encode(receipt.transaction_hash.as_slice()));
        info!(
            "Update '{}' registered (tx: {}, block: {})",
            request.uid,
            tx_hash,
            receipt.block_number.unwrap_or_default()
        );

        Ok(tx_hash)
    }

    /// Fetch the details of a registered update. Never faults: an empty uid
    /// or an exhausted read degrades to a default-shaped record carrying a
    /// diagnostic description.
    pub async fn get_details(&self, uid: &str) -> UpdateRecord {
        if uid.trim().is_empty() {
            warn!("Detail lookup with empty uid");
            return UpdateRecord::unknown();
        }

        let contract_address = match self.resolver.resolve(UPDATE_CONTRACT_NAME).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Detail lookup for '{}' could not resolve contract: {}", uid, e);
                return UpdateRecord::degraded(uid, &e.to_string());
            }
        };

        let result = read_with_retry(
            self.retry,
            || {
                let provider = http_provider(&self.rpc_url);
                let contract =
                    ISoftwareUpdate::ISoftwareUpdateInstance::new(contract_address, provider);
                let uid = uid.to_string();
                async move {
                    contract
                        .getUpdateInfo(uid)
                        .call()
                        .await
                        .map_err(|e| RelayError::Blockchain(format!("getUpdateInfo failed: {}", e)))
                }
            },
            // A record with no content yet: the write is not indexed on the
            // node this read hit.
            |info| info.ipfsHash.is_empty() && info.hashOfUpdate.is_empty() && info.version.is_empty(),
        )
        .await;

        match result {
            Ok(info) => {
                info!("Update info fetched for '{}' (version: {})", uid, info.version);
                let price = u64::try_from(info.price).unwrap_or_else(|_| {
                    warn!(
                        "On-chain price for '{}' exceeds u64 range ({}), clamping",
                        uid, info.price
                    );
                    u64::MAX
                });
                UpdateRecord {
                    uid: uid.to_string(),
                    ipfs_hash: info.ipfsHash,
                    encrypted_key: info.encryptedKey,
                    hash_of_update: info.hashOfUpdate,
                    description: info.description,
                    price,
                    version: info.version,
                    is_authorized: info.isAuthorized,
                }
            }
            Err(e) => {
                warn!("Detail lookup for '{}' exhausted retries: {}", uid, e);
                UpdateRecord::degraded(uid, &e.to_string())
            }
        }
    }
}
