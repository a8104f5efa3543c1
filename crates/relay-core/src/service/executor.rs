//! Single-transaction executor.
//!
//! Runs one contract call end to end for one identity:
//! nonce → gas limit → fee strategy → affordability → submit → confirm.
//! Callers must guarantee the identity is not used concurrently.

use crate::config::RelayConfig;
use crate::domain::fees::{apply_gas_multiplier, multiplier_x100};
use crate::domain::{
    Address, ContractCall, ExecutionError, FeeStrategy, HitTracker, Receipt, RelayRequest,
    SigningIdentity, TransactionRequest, TxHash,
};
use crate::ports::LedgerClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builds, signs, submits and confirms transactions.
pub struct TransactionExecutor {
    ledger: Arc<dyn LedgerClient>,
    contract: HitTracker,
    mult_x100: u64,
    fallback_gas_limit: u64,
    confirmation_deadline: Option<Duration>,
    enforce_affordability: bool,
}

impl TransactionExecutor {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: &RelayConfig) -> Self {
        Self {
            ledger,
            contract: HitTracker::new(config.contract_address),
            mult_x100: multiplier_x100(config.gas_multiplier),
            fallback_gas_limit: config.fallback_gas_limit,
            confirmation_deadline: config.confirmation_deadline(),
            enforce_affordability: config.enforce_affordability,
        }
    }

    pub fn contract(&self) -> HitTracker {
        self.contract
    }

    /// Record one hit, signed by `identity`.
    pub async fn execute(
        &self,
        identity: &SigningIdentity,
        request: &RelayRequest,
    ) -> Result<TxHash, ExecutionError> {
        let call = self.contract.record_hit(request);
        self.execute_call(identity, &call).await
    }

    /// Submit `call` from `identity` and wait until it is confirmed.
    pub async fn execute_call(
        &self,
        identity: &SigningIdentity,
        call: &ContractCall,
    ) -> Result<TxHash, ExecutionError> {
        let from = identity.address();

        let nonce = self
            .ledger
            .get_pending_nonce(&from)
            .await
            .map_err(ExecutionError::Nonce)?;
        let gas_limit = self.gas_limit(call, from).await;
        let fees = self.fee_strategy().await;
        self.check_affordability(&from, gas_limit, &fees).await?;

        debug!(
            from = %from,
            function = call.function,
            nonce,
            gas_limit,
            fees = fees.label(),
            "Submitting transaction"
        );
        let tx = TransactionRequest {
            to: call.to,
            data: call.data.clone(),
            nonce,
            gas_limit,
            fees,
        };
        let tx_hash = self
            .ledger
            .submit(identity, tx)
            .await
            .map_err(ExecutionError::Submission)?;
        info!(tx_hash = %tx_hash, from = %from, function = call.function, "Transaction submitted");

        let receipt = self.confirm(tx_hash).await?;
        if !receipt.success {
            warn!(tx_hash = %tx_hash, block = receipt.block_number, "Transaction reverted");
            return Err(ExecutionError::Reverted { tx_hash });
        }
        info!(
            tx_hash = %tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(tx_hash)
    }

    async fn gas_limit(&self, call: &ContractCall, from: Address) -> u64 {
        match self.ledger.estimate_gas(&call.as_call_request(from)).await {
            Ok(estimate) => apply_gas_multiplier(estimate, self.mult_x100),
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = self.fallback_gas_limit,
                    "Gas estimation failed, using fallback limit"
                );
                self.fallback_gas_limit
            }
        }
    }

    /// Dynamic fees, else a legacy gas price, else leave it to the adapter.
    async fn fee_strategy(&self) -> FeeStrategy {
        match self.ledger.estimate_fees().await {
            Ok(Some(fees)) => return FeeStrategy::Dynamic(fees),
            Ok(None) => debug!("Network reports no base fee"),
            Err(e) => warn!(error = %e, "Fee estimation failed, trying gas price"),
        }
        match self.ledger.gas_price().await {
            Ok(gas_price) => FeeStrategy::Legacy { gas_price },
            Err(e) => {
                warn!(error = %e, "Gas price query failed, leaving fees unspecified");
                FeeStrategy::Unspecified
            }
        }
    }

    async fn check_affordability(
        &self,
        from: &Address,
        gas_limit: u64,
        fees: &FeeStrategy,
    ) -> Result<(), ExecutionError> {
        let required = fees.required_funds(gas_limit);
        let available = match self.ledger.get_balance(from).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(from = %from, error = %e, "Pre-flight balance check failed");
                return Ok(());
            }
        };
        if available >= required {
            return Ok(());
        }
        if self.enforce_affordability {
            return Err(ExecutionError::InsufficientFunds {
                required,
                available,
            });
        }
        warn!(
            from = %from,
            available = %available,
            required = %required,
            "Balance may not cover gas, submitting anyway"
        );
        Ok(())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<Receipt, ExecutionError> {
        let wait = self.ledger.wait_for_confirmation(&tx_hash);
        let result = match self.confirmation_deadline {
            Some(deadline) => tokio::time::timeout(deadline, wait).await.map_err(|_| {
                ExecutionError::ConfirmationTimeout {
                    tx_hash,
                    timeout_ms: deadline.as_millis() as u64,
                }
            })?,
            None => wait.await,
        };
        result.map_err(|source| ExecutionError::Confirmation { tx_hash, source })
    }
}
