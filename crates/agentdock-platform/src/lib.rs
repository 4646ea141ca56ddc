//! # AgentDock Platform
//!
//! Multi-tenant registry for AI agents: tenant and agent lifecycle,
//! pluggable storage (in-memory or SQLite), audit logging and the
//! JWT auth gate in front of it all.

pub mod agent;
pub mod auth;
pub mod db;
pub mod store;
pub mod tenant;
mod validation;

pub use agent::{AgentRegistry, CreateAgent, Transition};
pub use auth::{AuthGate, Claims, IssuedToken};
pub use db::SqliteStore;
pub use store::{MemoryStore, RegistryStore};
pub use tenant::{CreateTenant, TenantRegistry, UpdateTenant};
