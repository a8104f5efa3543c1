//! # RPC Flow
//!
//! The full stack over HTTP on both sides: gateway router, relay queue,
//! `JsonRpcLedger` and a small fake EVM node served by axum.
//!
//! The fake node hashes every raw transaction it receives with keccak256,
//! so a matching hash in the `/recordHit` response shows the relay signed
//! and encoded the transaction it reported.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::extract::State;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use ledger_rpc::{JsonRpcLedger, RpcSettings};
    use parking_lot::Mutex;
    use relay_core::testing::{identity, MockTimeSource, MOCK_CHAIN_ID};
    use relay_core::{
        IdentityPool, LedgerClient, RelayConfig, RelayQueue, Scoreboard, TimeSource,
        TransactionExecutor,
    };
    use relay_gateway::{build_router, AppState, CorsConfig};
    use serde_json::{json, Value};
    use sha3::{Digest, Keccak256};
    use tower::ServiceExt;

    const PLAYER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    // =============================================================================
    // FAKE NODE
    // =============================================================================

    #[derive(Clone, Default)]
    struct FakeNode {
        sent: Arc<Mutex<Vec<String>>>,
        mined: Arc<Mutex<HashSet<String>>>,
        reject_raw: Arc<Mutex<Option<String>>>,
    }

    impl FakeNode {
        fn reject_with(&self, message: &str) {
            *self.reject_raw.lock() = Some(message.to_string());
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().clone()
        }
    }

    fn quantity(value: u64) -> Value {
        json!(format!("0x{value:x}"))
    }

    async fn handle(State(node): State<FakeNode>, Json(req): Json<Value>) -> Json<Value> {
        let id = req["id"].clone();
        let method = req["method"].as_str().unwrap_or_default();
        let result = match method {
            "eth_getBalance" => json!("0xde0b6b3a7640000"),
            "eth_getTransactionCount" => quantity(node.sent.lock().len() as u64),
            "eth_estimateGas" => quantity(80_000),
            "eth_getBlockByNumber" => json!({"baseFeePerGas": "0x3b9aca00"}),
            "eth_maxPriorityFeePerGas" => quantity(1_000_000_000),
            "eth_gasPrice" => quantity(2_000_000_000),
            "eth_sendRawTransaction" => {
                if let Some(message) = node.reject_raw.lock().clone() {
                    return Json(json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32000, "message": message}
                    }));
                }
                let raw = req["params"][0].as_str().unwrap_or_default();
                let bytes = hex::decode(raw.trim_start_matches("0x")).unwrap_or_default();
                let hash = format!("0x{}", hex::encode(Keccak256::digest(&bytes)));
                node.sent.lock().push(hash.clone());
                node.mined.lock().insert(hash.clone());
                json!(hash)
            }
            "eth_getTransactionReceipt" => {
                let hash = req["params"][0].as_str().unwrap_or_default().to_string();
                if node.mined.lock().contains(&hash) {
                    json!({
                        "transactionHash": hash,
                        "blockNumber": "0x10",
                        "status": "0x1",
                        "gasUsed": "0xc350"
                    })
                } else {
                    Value::Null
                }
            }
            "eth_call" => {
                let hits = node.sent.lock().len() as u64;
                json!(format!("0x{hits:064x}"))
            }
            _ => {
                return Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32601, "message": "method not found"}
                }))
            }
        };
        Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }

    async fn start_node() -> (FakeNode, String) {
        let node = FakeNode::default();
        let app = Router::new()
            .route("/", post(handle))
            .with_state(node.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (node, format!("http://{addr}/"))
    }

    async fn stack(relayers: u8) -> (Router, FakeNode) {
        let (node, url) = start_node().await;
        let mut settings = RpcSettings::new(url, MOCK_CHAIN_ID);
        settings.receipt_poll_interval = Duration::from_millis(10);
        let ledger: Arc<dyn LedgerClient> = Arc::new(JsonRpcLedger::new(settings).unwrap());

        let config = RelayConfig::default();
        let clock: Arc<dyn TimeSource> = Arc::new(MockTimeSource::new(0));
        let pool = Arc::new(IdentityPool::new(
            (2..2 + relayers).map(identity).collect(),
            ledger.clone(),
            clock,
            &config,
        ));
        let executor = Arc::new(TransactionExecutor::new(ledger.clone(), &config));
        let state = AppState {
            queue: RelayQueue::new(pool, executor, &config),
            scoreboard: Arc::new(Scoreboard::new(ledger, config.contract_address)),
            deployer: identity(1).address(),
        };
        (build_router(state, &CorsConfig::default()), node)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
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

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hit_relayed_over_json_rpc() {
        let (router, node) = stack(2).await;

        let (status, body) = send(&router, hit(25)).await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(body["success"], true);

        let sent = node.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(body["hash"], sent[0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_status_reads_contract() {
        let (router, _node) = stack(1).await;
        for points in [1, 2] {
            let (status, _) = send(&router, hit(points)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let request = Request::builder()
            .uri("/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalHits"], "2");
        assert_eq!(body["deployerAddress"], identity(1).address().to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_node_rejection_surfaces_as_500() {
        let (router, node) = stack(1).await;
        node.reject_with("insufficient funds for gas * price + value");

        let (status, body) = send(&router, hit(5)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("insufficient funds"));
        assert!(!error.contains("127.0.0.1"));
        assert!(node.sent().is_empty());
    }
}
