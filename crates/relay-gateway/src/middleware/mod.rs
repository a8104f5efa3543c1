//! Middleware for the relay gateway.
//!
//! Layer order: Request → Trace → CORS → Handler

pub mod cors;

pub use cors::create_cors_layer;
