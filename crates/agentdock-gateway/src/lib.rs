//! # AgentDock Gateway
//!
//! Axum HTTP API in front of the tenant and agent registries.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, build_router, start};
