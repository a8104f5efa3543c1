//! Start-up authorization of relayer identities.
//!
//! The contract only accepts `recordHit` from authorized relayers. Before
//! traffic is served, every identity is checked and, if needed, authorized
//! by the primary (owner) identity. Identities are processed one at a time
//! because every authorization is signed by the same primary identity.

use crate::domain::abi::decode_bool;
use crate::domain::{Address, ExecutionError, HitTracker, LedgerError, SigningIdentity};
use crate::ports::LedgerClient;
use crate::service::executor::TransactionExecutor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Why one identity could not be authorized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("authorization check failed: {0}")]
    Check(#[from] LedgerError),

    #[error("authorization transaction failed: {0}")]
    Authorize(#[from] ExecutionError),
}

/// Outcome of one bootstrap pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub already_authorized: Vec<Address>,
    pub newly_authorized: Vec<Address>,
    pub failed: Vec<(Address, BootstrapError)>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct BootstrapAuthorizer {
    ledger: Arc<dyn LedgerClient>,
    executor: Arc<TransactionExecutor>,
    contract: HitTracker,
}

impl BootstrapAuthorizer {
    pub fn new(ledger: Arc<dyn LedgerClient>, executor: Arc<TransactionExecutor>) -> Self {
        let contract = executor.contract();
        Self {
            ledger,
            executor,
            contract,
        }
    }

    /// Authorize `primary`, then each of `relayers`, in order.
    ///
    /// A failure is recorded and the pass moves on to the next identity.
    pub async fn authorize_all(
        &self,
        primary: &SigningIdentity,
        relayers: &[Address],
    ) -> BootstrapReport {
        let mut targets = vec![primary.address()];
        for address in relayers {
            if !targets.contains(address) {
                targets.push(*address);
            }
        }

        let mut report = BootstrapReport::default();
        for address in targets {
            match self.ensure_authorized(primary, address).await {
                Ok(false) => {
                    info!(address = %address, "Relayer already authorized");
                    report.already_authorized.push(address);
                }
                Ok(true) => {
                    info!(address = %address, "Relayer authorized");
                    report.newly_authorized.push(address);
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Relayer authorization failed");
                    report.failed.push((address, e));
                }
            }
        }

        info!(
            already = report.already_authorized.len(),
            added = report.newly_authorized.len(),
            failed = report.failed.len(),
            "Relayer bootstrap finished"
        );
        report
    }

    /// Returns `true` if an authorization transaction was confirmed.
    async fn ensure_authorized(
        &self,
        primary: &SigningIdentity,
        address: Address,
    ) -> Result<bool, BootstrapError> {
        let data = self
            .ledger
            .call(&self.contract.is_authorized_relayer(&address))
            .await?;
        if decode_bool(&data).map_err(LedgerError::from)? {
            return Ok(false);
        }

        info!(address = %address, "Authorizing relayer");
        let call = self.contract.add_authorized_relayer(&address);
        self.executor.execute_call(primary, &call).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::testing::{identity, MockLedger};

    fn setup() -> (BootstrapAuthorizer, Arc<MockLedger>) {
        let ledger = Arc::new(MockLedger::new());
        let executor = Arc::new(TransactionExecutor::new(
            ledger.clone(),
            &RelayConfig::default(),
        ));
        (BootstrapAuthorizer::new(ledger.clone(), executor), ledger)
    }

    #[tokio::test]
    async fn test_authorizes_primary_then_relayers() {
        let (bootstrap, ledger) = setup();
        let primary = identity(1);
        let relayers = [identity(2).address(), identity(3).address()];

        let report = bootstrap.authorize_all(&primary, &relayers).await;

        assert!(report.is_complete());
        assert_eq!(
            report.newly_authorized,
            vec![primary.address(), relayers[0], relayers[1]]
        );
        // Every authorization is signed by the primary identity.
        let subs = ledger.submissions();
        assert_eq!(subs.len(), 3);
        assert!(subs.iter().all(|s| s.signer == primary.address()));
        let nonces: Vec<u64> = subs.iter().map(|s| s.tx.nonce).collect();
        assert_eq!(nonces, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_skips_already_authorized() {
        let (bootstrap, ledger) = setup();
        let primary = identity(1);
        let relayer = identity(2).address();
        ledger.authorize(primary.address());
        ledger.authorize(relayer);

        let report = bootstrap.authorize_all(&primary, &[relayer]).await;

        assert_eq!(report.already_authorized, vec![primary.address(), relayer]);
        assert!(report.newly_authorized.is_empty());
        assert_eq!(ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_listed_once() {
        let (bootstrap, ledger) = setup();
        let primary = identity(1);

        let report = bootstrap
            .authorize_all(&primary, &[primary.address()])
            .await;

        assert_eq!(report.newly_authorized, vec![primary.address()]);
        assert_eq!(ledger.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_check_does_not_stop_pass() {
        let (bootstrap, ledger) = setup();
        ledger.fail_calls(LedgerError::Transport("connection refused".into()));
        let primary = identity(1);
        let relayers = [identity(2).address()];

        let report = bootstrap.authorize_all(&primary, &relayers).await;

        assert_eq!(report.failed.len(), 2);
        assert!(matches!(report.failed[0].1, BootstrapError::Check(_)));
        assert_eq!(report.failed[1].0, relayers[0]);
    }

    #[tokio::test]
    async fn test_failed_authorization_is_reported() {
        let (bootstrap, ledger) = setup();
        let primary = identity(1);
        ledger.authorize(primary.address());
        ledger.revert_from(primary.address());
        let relayer = identity(2).address();

        let report = bootstrap.authorize_all(&primary, &[relayer]).await;

        assert_eq!(report.already_authorized, vec![primary.address()]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].1,
            BootstrapError::Authorize(ExecutionError::Reverted { .. })
        ));
        assert!(!ledger.is_authorized(&relayer));
    }
}
