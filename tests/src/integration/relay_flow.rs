//! # Relay Flow
//!
//! `POST /recordHit` through the gateway router, the relay queue, the
//! identity pool and the executor, against the in-memory `MockLedger`.
//!
//! ## Flows Tested
//!
//! 1. **Burst**: concurrent hits spread over every relayer with no
//!    overlapping submissions per identity
//! 2. **Retry**: a failing relayer hands the hit to another one
//! 3. **Low balance**: an underfunded relayer is never used
//! 4. **Bootstrap**: every identity is authorized before relaying
//! 5. **Views**: `/status` and `/playerScore` reflect relayed hits

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use relay_core::testing::{identity, MockLedger, MockTimeSource};
    use relay_core::{
        Address, BootstrapAuthorizer, IdentityPool, LedgerError, RelayConfig, RelayQueue,
        Scoreboard, SigningIdentity, TimeSource, TransactionExecutor, U256,
    };
    use relay_gateway::{build_router, AppState, CorsConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    const PLAYER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        router: Router,
        ledger: Arc<MockLedger>,
        pool: Arc<IdentityPool>,
        executor: Arc<TransactionExecutor>,
        relayers: Vec<Address>,
    }

    /// Relayers are `identity(2)..`, the primary is `identity(1)`.
    fn harness(relayers: u8, ledger: Arc<MockLedger>) -> Harness {
        let config = RelayConfig::default();
        let clock: Arc<dyn TimeSource> = Arc::new(MockTimeSource::new(0));
        let identities: Vec<SigningIdentity> = (2..2 + relayers).map(identity).collect();
        let pool = Arc::new(IdentityPool::new(identities, ledger.clone(), clock, &config));
        let executor = Arc::new(TransactionExecutor::new(ledger.clone(), &config));
        let state = AppState {
            queue: RelayQueue::new(pool.clone(), executor.clone(), &config),
            scoreboard: Arc::new(Scoreboard::new(ledger.clone(), config.contract_address)),
            deployer: identity(1).address(),
        };
        Harness {
            router: build_router(state, &CorsConfig::default()),
            relayers: pool.addresses(),
            ledger,
            pool,
            executor,
        }
    }

    fn hit(points: u32) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/recordHit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"player":"{PLAYER}","points":{points}}}"#
            )))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_burst_spreads_over_relayers() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_confirmation_delay(Duration::from_millis(50));
        let h = harness(3, ledger);

        let responses =
            futures::future::join_all((0..12).map(|i| send(&h.router, hit(i % 100)))).await;
        for (status, body) in &responses {
            assert_eq!(*status, StatusCode::OK, "body: {body}");
            assert_eq!(body["success"], true);
        }

        assert_eq!(h.ledger.submission_count(), 12);
        assert_eq!(h.ledger.overlapping_submissions(), 0);
        assert_eq!(h.ledger.total_hits(), U256::from(12u64));
        assert_eq!(h.pool.busy_count(), 0);

        let mut nonces: HashMap<Address, Vec<u64>> = HashMap::new();
        for submission in h.ledger.submissions() {
            nonces
                .entry(submission.signer)
                .or_default()
                .push(submission.tx.nonce);
        }
        for relayer in &h.relayers {
            let used = nonces.get(relayer).expect("every relayer used");
            let expected: Vec<u64> = (0..used.len() as u64).collect();
            assert_eq!(used, &expected, "nonces of {relayer} are sequential");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_relayer_hands_over() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);
        h.ledger.fail_submissions_from(
            h.relayers[0],
            LedgerError::Rpc {
                code: -32000,
                message: "nonce too low".into(),
            },
        );

        let (status, body) = send(&h.router, hit(10)).await;
        assert_eq!(status, StatusCode::OK);

        let submissions = h.ledger.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].signer, h.relayers[1]);
        assert_eq!(body["hash"], submissions[0].hash.to_hex());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_relayer_failing_is_500() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);
        for relayer in &h.relayers {
            h.ledger.fail_submissions_from(
                *relayer,
                LedgerError::Rpc {
                    code: -32000,
                    message: "execution reverted: Unauthorized".into(),
                },
            );
        }

        let (status, body) = send(&h.router, hit(10)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Unauthorized"));
        assert_eq!(h.ledger.submission_count(), 0);
        assert_eq!(h.pool.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_underfunded_relayer_is_skipped() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);
        h.ledger.set_balance(h.relayers[0], U256::from(1u64));

        for points in [1, 2, 3, 4, 5] {
            let (status, _) = send(&h.router, hit(points)).await;
            assert_eq!(status, StatusCode::OK);
        }

        assert!(h
            .ledger
            .submissions()
            .iter()
            .all(|s| s.signer == h.relayers[1]));
        // Clock never moves, so the low balance stays cached.
        assert_eq!(h.ledger.balance_calls(&h.relayers[0]), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_then_relay() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);
        let primary = identity(1);
        let authorizer = BootstrapAuthorizer::new(h.ledger.clone(), h.executor.clone());

        let report = authorizer.authorize_all(&primary, &h.relayers).await;
        assert!(report.is_complete());
        assert_eq!(report.newly_authorized.len(), 3);
        assert!(h.ledger.is_authorized(&primary.address()));
        for relayer in &h.relayers {
            assert!(h.ledger.is_authorized(relayer));
        }

        let again = authorizer.authorize_all(&primary, &h.relayers).await;
        assert_eq!(again.already_authorized.len(), 3);
        assert!(again.newly_authorized.is_empty());

        let (status, _) = send(&h.router, hit(42)).await;
        assert_eq!(status, StatusCode::OK);
        let last = h.ledger.submissions().pop().unwrap();
        assert!(h.relayers.contains(&last.signer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_views_reflect_relayed_hits() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);
        for points in [10, 20, 30] {
            send(&h.router, hit(points)).await;
        }

        let (_, status) = send(&h.router, get("/status")).await;
        assert_eq!(status["totalHits"], "3");
        assert_eq!(status["queueLength"], 0);

        let (_, score) = send(&h.router, get(&format!("/playerScore/{PLAYER}"))).await;
        assert_eq!(score["totalScore"], "60");
        assert_eq!(score["hitCount"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_hit_leaves_ledger_untouched() {
        let ledger = Arc::new(MockLedger::new());
        let h = harness(2, ledger);

        let (status, _) = send(&h.router, hit(101)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.ledger.submission_count(), 0);
        for relayer in &h.relayers {
            assert_eq!(h.ledger.balance_calls(relayer), 0);
        }
    }
}
