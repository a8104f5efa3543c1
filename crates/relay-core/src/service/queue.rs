//! FIFO relay queue.
//!
//! `enqueue` appends to the backlog and makes sure a drain task is running.
//! The drain task pairs the oldest request with the next available identity
//! and spawns its execution, so identities work in parallel while each one
//! handles a single transaction at a time.

use crate::config::RelayConfig;
use crate::domain::{Address, ExecutionError, RelayRequest, TxHash};
use crate::service::executor::TransactionExecutor;
use crate::service::pool::{IdentityLease, IdentityPool};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Successful relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelayReceipt {
    pub tx_hash: TxHash,
    /// Identity whose transaction was confirmed.
    pub identity: Address,
    /// 1, or 2 if the first attempt failed.
    pub attempts: u32,
}

/// Failed relay, carrying the error of the last attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct RelayFailure {
    pub error: ExecutionError,
    pub attempts: u32,
}

pub type RelayOutcome = Result<RelayReceipt, RelayFailure>;

/// Resolves once the request has been relayed or has failed.
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<RelayOutcome>,
}

impl CompletionHandle {
    pub async fn wait(self) -> RelayOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RelayFailure {
                error: ExecutionError::Abandoned,
                attempts: 0,
            }),
        }
    }
}

struct Pending {
    request: RelayRequest,
    reply: oneshot::Sender<RelayOutcome>,
    enqueued_at: Instant,
}

struct QueueInner {
    backlog: Mutex<VecDeque<Pending>>,
    draining: AtomicBool,
    pool: Arc<IdentityPool>,
    executor: Arc<TransactionExecutor>,
    poll_interval: Duration,
}

/// Cloneable handle to the shared queue.
#[derive(Clone)]
pub struct RelayQueue {
    inner: Arc<QueueInner>,
}

impl RelayQueue {
    pub fn new(
        pool: Arc<IdentityPool>,
        executor: Arc<TransactionExecutor>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                backlog: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                pool,
                executor,
                poll_interval: config.poll_interval,
            }),
        }
    }

    /// Append `request` to the backlog.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, request: RelayRequest) -> CompletionHandle {
        let (reply, rx) = oneshot::channel();
        let depth = {
            let mut backlog = self.inner.backlog.lock();
            backlog.push_back(Pending {
                request,
                reply,
                enqueued_at: Instant::now(),
            });
            backlog.len()
        };
        debug!(
            player = %request.player,
            points = request.points.value(),
            depth,
            "Relay request queued"
        );
        self.inner.start_drain();
        CompletionHandle { rx }
    }

    /// Requests not yet paired with an identity.
    pub fn backlog_len(&self) -> usize {
        self.inner.backlog.lock().len()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Acquire)
    }

    pub fn pool(&self) -> &Arc<IdentityPool> {
        &self.inner.pool
    }
}

impl QueueInner {
    fn start_drain(self: &Arc<Self>) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(self);
            tokio::spawn(inner.drain());
        }
    }

    async fn drain(self: Arc<Self>) {
        debug!(backlog = self.backlog.lock().len(), "Drain started");
        loop {
            if self.backlog.lock().is_empty() {
                self.draining.store(false, Ordering::Release);
                // An enqueue may have seen `draining == true` just before the store.
                if self.backlog.lock().is_empty()
                    || self
                        .draining
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                {
                    debug!("Drain finished");
                    return;
                }
                continue;
            }

            let Some(lease) = self.pool.acquire().await else {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            };
            let next = self.backlog.lock().pop_front();
            let Some(pending) = next else {
                continue;
            };

            debug!(
                identity = %lease.address(),
                remaining = self.backlog.lock().len(),
                "Dispatching relay"
            );
            let inner = Arc::clone(&self);
            tokio::spawn(async move { inner.run_relay(pending, lease).await });
        }
    }

    async fn run_relay(&self, pending: Pending, lease: IdentityLease) {
        let Pending {
            request,
            reply,
            enqueued_at,
        } = pending;
        let first = lease.address();

        let result = self.executor.execute(lease.identity(), &request).await;
        drop(lease);

        let outcome = match result {
            Ok(tx_hash) => Ok(RelayReceipt {
                tx_hash,
                identity: first,
                attempts: 1,
            }),
            Err(error) => {
                warn!(identity = %first, player = %request.player, error = %error, "Relay attempt failed");
                self.pool.invalidate_balance(&first);
                self.retry(&request, first, error).await
            }
        };

        let elapsed_ms = enqueued_at.elapsed().as_millis() as u64;
        match &outcome {
            Ok(receipt) => info!(
                tx_hash = %receipt.tx_hash,
                identity = %receipt.identity,
                player = %request.player,
                attempts = receipt.attempts,
                elapsed_ms,
                "Hit relayed"
            ),
            Err(failure) => warn!(
                player = %request.player,
                attempts = failure.attempts,
                elapsed_ms,
                error = %failure.error,
                "Hit relay failed"
            ),
        }

        if reply.send(outcome).is_err() {
            debug!(player = %request.player, "Caller dropped completion handle");
        }
    }

    /// One more attempt, only on a different identity.
    async fn retry(
        &self,
        request: &RelayRequest,
        first: Address,
        error: ExecutionError,
    ) -> RelayOutcome {
        let fallback = match self.pool.acquire_excluding(&first).await {
            Some(lease) => lease,
            None => {
                debug!(identity = %first, "No alternative relayer for retry");
                return Err(RelayFailure { error, attempts: 1 });
            }
        };
        let second = fallback.address();
        info!(failed = %first, fallback = %second, "Retrying with fallback relayer");

        match self.executor.execute(fallback.identity(), request).await {
            Ok(tx_hash) => Ok(RelayReceipt {
                tx_hash,
                identity: second,
                attempts: 2,
            }),
            Err(error) => {
                self.pool.invalidate_balance(&second);
                Err(RelayFailure { error, attempts: 2 })
            }
        }
    }
}
