//! # AgentDock Core
//!
//! Shared domain types, the error taxonomy and configuration used by the
//! registry, auth gate and gateway crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::AgentDockConfig;
pub use error::{AgentDockError, FieldError, Result};
