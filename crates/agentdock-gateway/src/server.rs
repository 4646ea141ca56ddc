//! HTTP server implementation using Axum.

use agentdock_core::config::{AgentDockConfig, StorageBackend};
use agentdock_core::types::AuditEvent;
use agentdock_platform::{AgentRegistry, AuthGate, MemoryStore, RegistryStore, SqliteStore, TenantRegistry};
use axum::routing::{get, post};
use axum::{Router, middleware};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared state for the gateway server.
pub struct AppState {
    pub tenants: TenantRegistry,
    pub agents: AgentRegistry,
    pub store: Arc<dyn RegistryStore>,
    pub auth: AuthGate,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn RegistryStore>, auth: AuthGate) -> Self {
        Self {
            tenants: TenantRegistry::new(store.clone()),
            agents: AgentRegistry::new(store.clone()),
            store,
            auth,
            start_time: std::time::Instant::now(),
        }
    }

    /// Build state from configuration, opening the configured store.
    pub fn from_config(config: &AgentDockConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn RegistryStore> = match config.storage.backend {
            StorageBackend::Memory => {
                tracing::info!("💾 Using in-memory registry store (state is lost on restart)");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Sqlite => {
                let path = config.storage.resolved_path();
                tracing::info!("💾 Using SQLite registry store at {}", path.display());
                Arc::new(SqliteStore::open(&path)?)
            }
        };
        if config.auth.uses_fallback_secret() {
            tracing::warn!("⚠️ No auth.jwt_secret configured, signing tokens with the development fallback secret");
        }
        Ok(Self::new(store, AuthGate::from_config(&config.auth)?))
    }

    /// Append to the audit log. Failures are logged, never surfaced.
    pub fn audit(&self, event: AuditEvent) {
        if let Err(e) = self.store.log_event(&event) {
            tracing::warn!("Audit log write failed for {}: {e}", event.event_type);
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let api = Router::new()
        .route("/v1/tenants", get(routes::list_tenants).post(routes::create_tenant))
        .route(
            "/v1/tenants/{id}",
            get(routes::get_tenant).patch(routes::update_tenant).delete(routes::delete_tenant),
        )
        .route("/v1/agents", get(routes::list_agents).post(routes::create_agent))
        .route("/v1/agents/{id}", get(routes::get_agent))
        .route("/v1/agents/{id}/deploy", post(routes::deploy_agent))
        .route("/v1/agents/{id}/pause", post(routes::pause_agent))
        .route("/v1/agents/{id}/retire", post(routes::retire_agent))
        .route("/v1/audit", get(routes::recent_audit))
        .route_layer(middleware::from_fn_with_state(state.clone(), crate::middleware::require_bearer));

    Router::new()
        .route("/healthz", get(routes::health_check))
        .route("/auth/login", post(routes::login))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start(config: &AgentDockConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_router(state);
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Registry API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Registry API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
