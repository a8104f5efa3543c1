//! # Hit Relay Node
//!
//! Entry point of the relay service.
//!
//! ## Startup Sequence
//!
//! 1. Initialize tracing (`RUST_LOG`, default `info`)
//! 2. Load settings from the environment; an invalid `PRIVATE_KEY` is fatal
//! 3. Connect the JSON-RPC ledger
//! 4. Build the identity pool, executor, relay queue and scoreboard
//! 5. Authorize every pool identity on the contract
//! 6. Serve HTTP until Ctrl+C

mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use ledger_rpc::JsonRpcLedger;
use relay_core::{
    BootstrapAuthorizer, IdentityPool, LedgerClient, RelayQueue, Scoreboard, SystemTimeSource,
    TimeSource, TransactionExecutor,
};
use relay_gateway::{AppState, GatewayService};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::settings::{endpoint_host, NodeSettings};

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let settings = NodeSettings::from_env().context("invalid configuration")?;
    let NodeSettings {
        primary,
        relayers,
        relay,
        rpc,
        gateway,
    } = settings;

    info!(address = %primary.address(), "Loaded deployer identity");
    info!(count = relayers.len(), "Loaded relayer identities");
    info!(
        host = %endpoint_host(&rpc.url),
        chain_id = rpc.chain_id,
        contract = %relay.contract_address,
        "Using ledger endpoint"
    );

    let ledger: Arc<dyn LedgerClient> =
        Arc::new(JsonRpcLedger::new(rpc).context("failed to build RPC client")?);
    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

    let pool = Arc::new(IdentityPool::new(relayers, ledger.clone(), clock, &relay));
    let executor = Arc::new(TransactionExecutor::new(ledger.clone(), &relay));
    let scoreboard = Arc::new(Scoreboard::new(ledger.clone(), relay.contract_address));

    let report = BootstrapAuthorizer::new(ledger, executor.clone())
        .authorize_all(&primary, &pool.addresses())
        .await;
    info!(
        already = report.already_authorized.len(),
        newly = report.newly_authorized.len(),
        failed = report.failed.len(),
        "Relayer authorization finished"
    );
    for (address, e) in &report.failed {
        warn!(address = %address, error = %e, "Relayer not authorized, its hits may revert");
    }

    let state = AppState {
        queue: RelayQueue::new(pool, executor, &relay),
        scoreboard,
        deployer: primary.address(),
    };

    GatewayService::new(gateway, state)
        .serve(shutdown_signal())
        .await
        .context("gateway stopped with an error")?;

    Ok(())
}
