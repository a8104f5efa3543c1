//! JSON-RPC implementation of [`LedgerClient`].

use crate::codec::{
    decode_data, decode_hash, decode_u256, decode_u64, encode_address, encode_data, BlockHeader,
    CallObject, ReceiptObject,
};
use async_trait::async_trait;
use relay_core::{
    Address, CallRequest, Eip1559Fees, FeeStrategy, LedgerClient, LedgerError, Receipt,
    SigningIdentity, TransactionRequest, TxHash, FALLBACK_GAS_PRICE_WEI, U256,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Consecutive failed receipt polls tolerated before giving up.
const MAX_POLL_ERRORS: u32 = 5;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Connection settings for [`JsonRpcLedger`].
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub url: String,
    pub chain_id: u64,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Delay between receipt polls.
    pub receipt_poll_interval: Duration,
}

impl RpcSettings {
    pub fn new(url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            url: url.into(),
            chain_id,
            request_timeout: Duration::from_secs(10),
            receipt_poll_interval: Duration::from_millis(500),
        }
    }
}

/// Ledger client talking to an Ethereum-compatible node over HTTP.
pub struct JsonRpcLedger {
    http_client: reqwest::Client,
    settings: RpcSettings,
    request_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(settings: RpcSettings) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.without_url().to_string()))?;

        Ok(Self {
            http_client,
            settings,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.settings.chain_id
    }

    /// Make a JSON-RPC call whose result may legitimately be `null`.
    async fn call_optional<P: Serialize + Send, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<Option<R>, LedgerError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        // The URL may embed an API key, so it is stripped from errors.
        let response = self
            .http_client
            .post(&self.settings.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.without_url().to_string()))?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("{method}: {}", e.without_url())))?;

        if let Some(error) = rpc_response.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(rpc_response.result)
    }

    async fn call_rpc<P: Serialize + Send, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| LedgerError::MissingResult(method.to_string()))
    }

    async fn quantity(
        &self,
        method: &str,
        params: impl Serialize + Send,
    ) -> Result<U256, LedgerError> {
        let result: String = self.call_rpc(method, params).await?;
        decode_u256(&result)
    }

    async fn receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, LedgerError> {
        let result: Option<ReceiptObject> = self
            .call_optional("eth_getTransactionReceipt", [hash.to_hex()])
            .await?;
        match result {
            Some(obj) => obj.into_receipt(),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn get_balance(&self, address: &Address) -> Result<U256, LedgerError> {
        self.quantity("eth_getBalance", (encode_address(address), "latest"))
            .await
    }

    async fn get_pending_nonce(&self, address: &Address) -> Result<u64, LedgerError> {
        let result: String = self
            .call_rpc(
                "eth_getTransactionCount",
                (encode_address(address), "pending"),
            )
            .await?;
        decode_u64(&result)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, LedgerError> {
        let result: String = self
            .call_rpc("eth_estimateGas", [CallObject::from(call)])
            .await?;
        decode_u64(&result)
    }

    async fn estimate_fees(&self) -> Result<Option<Eip1559Fees>, LedgerError> {
        let block: BlockHeader = self
            .call_rpc("eth_getBlockByNumber", ("latest", false))
            .await?;
        let Some(base_fee) = block.base_fee_per_gas.as_deref() else {
            return Ok(None);
        };
        let base_fee = decode_u256(base_fee)?;
        let priority = self
            .quantity("eth_maxPriorityFeePerGas", Vec::<()>::new())
            .await?;

        // 20% headroom over the current base fee.
        let max_fee = base_fee.saturating_mul(U256::from(12u64)) / U256::from(10u64);
        Ok(Some(Eip1559Fees {
            max_fee_per_gas: max_fee.saturating_add(priority),
            max_priority_fee_per_gas: priority,
        }))
    }

    async fn gas_price(&self) -> Result<U256, LedgerError> {
        self.quantity("eth_gasPrice", Vec::<()>::new()).await
    }

    async fn submit(
        &self,
        signer: &SigningIdentity,
        tx: TransactionRequest,
    ) -> Result<TxHash, LedgerError> {
        let tx = if tx.fees == FeeStrategy::Unspecified {
            let gas_price = match self.gas_price().await {
                Ok(price) => price,
                Err(e) => {
                    warn!(error = %e, "Gas price unavailable at signing, using 1 gwei");
                    U256::from(FALLBACK_GAS_PRICE_WEI)
                }
            };
            tx.with_resolved_fees(FeeStrategy::Legacy { gas_price })
        } else {
            tx
        };

        let signed = tx.sign(self.settings.chain_id, signer)?;
        let result: String = self
            .call_rpc("eth_sendRawTransaction", [encode_data(&signed.raw)])
            .await?;
        let hash = decode_hash(&result)?;
        if hash != signed.hash {
            warn!(local = %signed.hash, remote = %hash, "Node returned unexpected transaction hash");
        }
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: &TxHash) -> Result<Receipt, LedgerError> {
        let mut errors = 0;
        loop {
            match self.receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => errors = 0,
                Err(e) => {
                    errors += 1;
                    if errors >= MAX_POLL_ERRORS {
                        return Err(e);
                    }
                    debug!(tx_hash = %hash, error = %e, "Receipt poll failed");
                }
            }
            tokio::time::sleep(self.settings.receipt_poll_interval).await;
        }
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, LedgerError> {
        let result: String = self
            .call_rpc("eth_call", (CallObject::from(call), "latest"))
            .await?;
        decode_data(&result)
    }
}
