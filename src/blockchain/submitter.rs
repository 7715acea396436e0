use std::time::Duration;

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::types::RelayError;
use crate::wallet::Credentials;

/// Fixed gas price policy: 50 gwei.
pub const GAS_PRICE_WEI: u128 = 50_000_000_000;

/// Conservative ceiling for `registerUpdate` calls.
pub const GAS_LIMIT_REGISTER_UPDATE: u128 = 2_000_000;

/// Builds, signs and confirms state-changing contract calls.
///
/// Two modes, chosen by whether a local signing key is configured:
/// signed (build, sign locally, `eth_sendRawTransaction`) or unsigned
/// (hand the intent to the node, which signs with an account it holds;
/// development topologies only).
pub struct TransactionSubmitter {
    rpc_url: Url,
    credentials: Credentials,
    receipt_timeout: Duration,
    // Nonce acquisition and submission must serialize per account, or two
    // concurrent submissions would fetch the same transaction count.
    nonce_lock: Mutex<()>,
}

impl TransactionSubmitter {
    pub fn new(rpc_url: Url, credentials: Credentials, receipt_timeout: Duration) -> Self {
        Self {
            rpc_url,
            credentials,
            receipt_timeout,
            nonce_lock: Mutex::new(()),
        }
    }

    /// Submit a call to `to` and block until it is mined or the receipt
    /// deadline passes. A mined-but-reverted transaction is an error, never
    /// a success.
    pub async fn submit(
        &self,
        to: Address,
        call_data: Vec<u8>,
        value: Option<U256>,
        gas_limit: u128,
    ) -> Result<TransactionReceipt, RelayError> {
        let from = self.credentials.account;

        // Both providers outlive the pending-transaction builder, which
        // borrows whichever one sent the transaction.
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let signed_provider = if self.credentials.can_sign() {
            let signer = self
                .credentials
                .signer()
                .map_err(|e| RelayError::Configuration(e.to_string()))?;
            Some(
                ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .on_http(self.rpc_url.clone()),
            )
        } else {
            None
        };

        let pending = {
            // Held across nonce fetch + send; released before the receipt wait.
            let _guard = self.nonce_lock.lock().await;

            let chain_id = provider
                .get_chain_id()
                .await
                .map_err(|e| RelayError::Blockchain(format!("chain id fetch failed: {}", e)))?;

            // Fresh per submission; a cached nonce would collide under
            // sequential use.
            let nonce = provider
                .get_transaction_count(from)
                .await
                .map_err(|e| RelayError::Blockchain(format!("nonce fetch failed: {}", e)))?;

            debug!(
                "Building transaction (from: {}, to: {}, nonce: {}, gas: {})",
                from, to, nonce, gas_limit
            );

            let mut tx = TransactionRequest::default()
                .with_from(from)
                .with_to(to)
                .with_input(Bytes::from(call_data))
                .with_nonce(nonce)
                .with_gas_limit(gas_limit)
                .with_gas_price(GAS_PRICE_WEI)
                .with_chain_id(chain_id);
            if let Some(value) = value {
                tx = tx.with_value(value);
            }

            match &signed_provider {
                Some(signed) => signed
                    .send_transaction(tx)
                    .await
                    .map_err(|e| RelayError::Blockchain(format!("send failed: {}", e)))?,
                None => {
                    // No local key: the node signs with an account it controls.
                    provider
                        .send_transaction(tx)
                        .await
                        .map_err(|e| RelayError::Blockchain(format!("send failed: {}", e)))?
                }
            }
        };

        let tx_hash = format!("0x{}", hex::encode(pending.tx_hash().as_slice()));
        info!("Transaction sent: {}", tx_hash);

        let receipt = match tokio::time::timeout(self.receipt_timeout, pending.get_receipt()).await
        {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                return Err(RelayError::Blockchain(format!(
                    "receipt fetch for {} failed: {}",
                    tx_hash, e
                )))
            }
            Err(_) => {
                // The transaction may still mine later; callers must
                // re-query by hash if they care.
                warn!(
                    "Receipt for {} not observed within {:?}",
                    tx_hash, self.receipt_timeout
                );
                return Err(RelayError::Timeout {
                    tx_hash: Some(tx_hash),
                });
            }
        };

        if !receipt.status() {
            return Err(RelayError::TransactionReverted { tx_hash });
        }

        info!(
            "Transaction {} mined (block: {})",
            tx_hash,
            receipt.block_number.unwrap_or_default()
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Credentials;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const NONCE_BASE: u64 = 5;

    /// Minimal node double: hands out nonces that advance as transactions
    /// are accepted, mines accepted transactions into polled blocks, and
    /// serves their receipts.
    struct ChainSim {
        block_height: AtomicU64,
        sent_nonces: StdMutex<Vec<u64>>,
        sent_hashes: StdMutex<Vec<String>>,
        receipt_status: &'static str,
        mine: bool,
    }

    impl ChainSim {
        fn new(receipt_status: &'static str, mine: bool) -> Arc<Self> {
            Arc::new(Self {
                block_height: AtomicU64::new(1),
                sent_nonces: StdMutex::new(Vec::new()),
                sent_hashes: StdMutex::new(Vec::new()),
                receipt_status,
                mine,
            })
        }

        fn nonces(&self) -> Vec<u64> {
            self.sent_nonces.lock().unwrap().clone()
        }

        fn hashes(&self) -> Vec<String> {
            self.sent_hashes.lock().unwrap().clone()
        }

        fn handle(&self, method: &str, params: &serde_json::Value) -> serde_json::Value {
            match method {
                "eth_chainId" => json!("0x7a69"),
                "eth_getTransactionCount" => {
                    // Accepted transactions advance the pending nonce, as a
                    // node's mempool would.
                    let sent = self.sent_hashes.lock().unwrap().len() as u64;
                    json!(format!("0x{:x}", NONCE_BASE + sent))
                }
                "eth_sendTransaction" => {
                    let nonce = params[0]["nonce"]
                        .as_str()
                        .and_then(|n| u64::from_str_radix(n.trim_start_matches("0x"), 16).ok())
                        .unwrap_or(u64::MAX);
                    self.sent_nonces.lock().unwrap().push(nonce);
                    let mut hashes = self.sent_hashes.lock().unwrap();
                    let hash = format!("0x{:064x}", 0xfeed_0000u64 + hashes.len() as u64);
                    hashes.push(hash.clone());
                    json!(hash)
                }
                "eth_blockNumber" => {
                    let height = self.block_height.fetch_add(1, Ordering::SeqCst);
                    json!(format!("0x{:x}", height))
                }
                "eth_getBlockByNumber" => {
                    let number = params[0].as_str().unwrap_or("0x1");
                    let mined = if self.mine { self.hashes() } else { Vec::new() };
                    block_json(number, mined)
                }
                "eth_getTransactionReceipt" => {
                    if !self.mine {
                        return serde_json::Value::Null;
                    }
                    let hash = params[0].as_str().unwrap_or_default();
                    receipt_json(hash, self.receipt_status)
                }
                _ => serde_json::Value::Null,
            }
        }
    }

    struct Rpc(Arc<ChainSim>);

    impl Respond for Rpc {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: serde_json::Value =
                serde_json::from_slice(&request.body).unwrap_or_default();
            let id = body.get("id").cloned().unwrap_or(json!(1));
            let rpc_method = body.get("method").and_then(|m| m.as_str()).unwrap_or("");
            let params = body.get("params").cloned().unwrap_or_default();
            let result = self.0.handle(rpc_method, &params);
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }))
        }
    }

    fn block_json(number: &str, transactions: Vec<String>) -> serde_json::Value {
        let zero32 = format!("0x{}", "00".repeat(32));
        let block_num = u64::from_str_radix(number.trim_start_matches("0x"), 16).unwrap_or(1);
        json!({
            "hash": format!("0x{:064x}", block_num),
            "parentHash": zero32,
            "sha3Uncles": zero32,
            "miner": format!("0x{}", "00".repeat(20)),
            "stateRoot": zero32,
            "transactionsRoot": zero32,
            "receiptsRoot": zero32,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "difficulty": "0x0",
            "number": number,
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x5208",
            "timestamp": "0x64",
            "extraData": "0x",
            "mixHash": zero32,
            "nonce": "0x0000000000000000",
            "baseFeePerGas": "0x3b9aca00",
            "totalDifficulty": "0x0",
            "size": "0x220",
            "transactions": transactions,
            "uncles": [],
        })
    }

    fn receipt_json(tx_hash: &str, status: &str) -> serde_json::Value {
        json!({
            "type": "0x0",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": format!("0x{:064x}", 2),
            "blockNumber": "0x2",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0xba43b7400",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "contractAddress": null,
        })
    }

    async fn sim_submitter(
        sim: Arc<ChainSim>,
        receipt_timeout: Duration,
    ) -> (MockServer, TransactionSubmitter) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(Rpc(sim))
            .mount(&server)
            .await;
        let credentials = Credentials::unsigned_for_tests(Address::repeat_byte(0x11));
        let submitter =
            TransactionSubmitter::new(server.uri().parse().unwrap(), credentials, receipt_timeout);
        (server, submitter)
    }

    #[tokio::test]
    async fn test_submit_returns_mined_receipt() {
        let sim = ChainSim::new("0x1", true);
        let (_server, submitter) = sim_submitter(sim.clone(), Duration::from_secs(10)).await;

        let receipt = submitter
            .submit(
                Address::repeat_byte(0x42),
                vec![0xab, 0xcd],
                None,
                GAS_LIMIT_REGISTER_UPDATE,
            )
            .await
            .unwrap();

        assert!(receipt.status());
        let sent = sim.hashes();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            format!("0x{}", hex::encode(receipt.transaction_hash)),
            sent[0]
        );
        assert_eq!(sim.nonces(), vec![NONCE_BASE]);
    }

    #[tokio::test]
    async fn test_submit_reverted_carries_tx_hash() {
        let sim = ChainSim::new("0x0", true);
        let (_server, submitter) = sim_submitter(sim.clone(), Duration::from_secs(10)).await;

        let err = submitter
            .submit(
                Address::repeat_byte(0x42),
                vec![0xab],
                None,
                GAS_LIMIT_REGISTER_UPDATE,
            )
            .await
            .unwrap_err();

        match err {
            RelayError::TransactionReverted { tx_hash } => assert_eq!(tx_hash, sim.hashes()[0]),
            other => panic!("expected TransactionReverted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_times_out_without_receipt() {
        // Transactions are accepted but never mined.
        let sim = ChainSim::new("0x1", false);
        let (_server, submitter) = sim_submitter(sim.clone(), Duration::from_millis(600)).await;

        let err = submitter
            .submit(
                Address::repeat_byte(0x42),
                vec![0xab],
                None,
                GAS_LIMIT_REGISTER_UPDATE,
            )
            .await
            .unwrap_err();

        match err {
            RelayError::Timeout { tx_hash } => {
                assert_eq!(tx_hash.as_deref(), Some(sim.hashes()[0].as_str()));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_submits_use_distinct_nonces() {
        let sim = ChainSim::new("0x1", true);
        let (_server, submitter) = sim_submitter(sim.clone(), Duration::from_secs(10)).await;

        let to = Address::repeat_byte(0x42);
        let (a, b) = tokio::join!(
            submitter.submit(to, vec![0x01], None, GAS_LIMIT_REGISTER_UPDATE),
            submitter.submit(to, vec![0x02], None, GAS_LIMIT_REGISTER_UPDATE),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(sim.nonces(), vec![NONCE_BASE, NONCE_BASE + 1]);
    }
}
