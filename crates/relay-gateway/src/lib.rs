//! # Relay Gateway
//!
//! HTTP surface of the hit relay (axum).
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/recordHit` | POST | `{success, hash, message}` once the hit is confirmed |
//! | `/status` | GET | `{status, queueLength, totalHits, deployerAddress}` |
//! | `/topScores` | GET | `{topScores: [{player, score, timestamp}]}` |
//! | `/playerScore/:address` | GET | `{player, totalScore, hitCount}` |
//! | `/health` | GET | liveness probe |
//!
//! Invalid `/recordHit` bodies are rejected with `400` before anything is
//! queued.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use domain::{ApiError, CorsConfig, GatewayConfig, GatewayError};
pub use service::{build_router, AppState, GatewayService};
