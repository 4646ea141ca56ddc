//! API route handlers for the gateway.

use agentdock_core::types::{Agent, AuditEntry, AuditEvent, Tenant};
use agentdock_platform::{Claims, CreateAgent, CreateTenant, IssuedToken, Transition, UpdateTenant};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// `{ "items": [...] }` listing envelope.
#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "status": "ok",
        "ts": chrono::Utc::now().to_rfc3339(),
        "service": "agentdock-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": uptime.as_secs(),
    }))
}

// ── Auth ────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<IssuedToken>> {
    // Unreadable bodies are treated as empty credentials
    let Json(req) = payload.unwrap_or_default();
    match state.auth.login(&req.email, &req.password) {
        Ok(issued) => {
            state.audit(AuditEvent::new("login_success", req.email.trim(), req.email.trim()));
            Ok(Json(issued))
        }
        Err(e) => {
            tracing::info!("Login rejected for '{}': {e}", req.email);
            state.audit(AuditEvent::new("login_failed", req.email.trim(), req.email.trim()));
            Err(e.into())
        }
    }
}

// ── Tenants ────────────────────────────────────

/// GET /v1/tenants
pub async fn list_tenants(State(state): State<Arc<AppState>>) -> ApiResult<Json<Items<Tenant>>> {
    Ok(Json(Items { items: state.tenants.list()? }))
}

/// POST /v1/tenants
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateTenant>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    let Json(input) = payload?;
    let tenant = state.tenants.create(input)?;
    state.audit(AuditEvent::new("tenant_created", &claims.sub, &tenant.id));
    Ok((StatusCode::CREATED, Json(tenant)))
}

/// GET /v1/tenants/{id}
pub async fn get_tenant(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<Tenant>> {
    Ok(Json(state.tenants.get(&id)?))
}

/// PATCH /v1/tenants/{id}
pub async fn update_tenant(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTenant>, JsonRejection>,
) -> ApiResult<Json<Tenant>> {
    let Json(patch) = payload?;
    let tenant = state.tenants.update(&id, patch)?;
    state.audit(AuditEvent::new("tenant_updated", &claims.sub, &tenant.id));
    Ok(Json(tenant))
}

/// DELETE /v1/tenants/{id}
pub async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.tenants.delete(&id)?;
    state.audit(AuditEvent::new("tenant_deleted", &claims.sub, &id));
    Ok(StatusCode::NO_CONTENT)
}

// ── Agents ────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAgentsQuery {
    pub tenant_id: Option<String>,
}

/// GET /v1/agents?tenantId=
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListAgentsQuery>, QueryRejection>,
) -> ApiResult<Json<Items<Agent>>> {
    let Query(q) = query?;
    let tenant_id = q.tenant_id.as_deref().filter(|t| !t.is_empty());
    Ok(Json(Items { items: state.agents.list(tenant_id)? }))
}

/// POST /v1/agents
pub async fn create_agent(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateAgent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    let Json(input) = payload?;
    let agent = state.agents.create(input)?;
    state.audit(
        AuditEvent::new("agent_created", &claims.sub, &agent.id).with_details(format!("tenant={}", agent.tenant_id)),
    );
    Ok((StatusCode::CREATED, Json(agent)))
}

/// GET /v1/agents/{id}
pub async fn get_agent(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Json<Agent>> {
    Ok(Json(state.agents.get(&id)?))
}

/// Body of a status transition response.
#[derive(Debug, Serialize)]
pub struct StatusChange {
    pub id: String,
    pub status: agentdock_core::types::AgentStatus,
}

fn apply_transition(state: &AppState, claims: &Claims, id: &str, action: Transition) -> ApiResult<Json<StatusChange>> {
    let agent = state.agents.transition(id, action)?;
    state.audit(AuditEvent::new(action.event_type(), &claims.sub, &agent.id));
    Ok(Json(StatusChange { id: agent.id, status: agent.status }))
}

/// POST /v1/agents/{id}/deploy
pub async fn deploy_agent(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    apply_transition(&state, &claims, &id, Transition::Deploy)
}

/// POST /v1/agents/{id}/pause
pub async fn pause_agent(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    apply_transition(&state, &claims, &id, Transition::Pause)
}

/// POST /v1/agents/{id}/retire
pub async fn retire_agent(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusChange>> {
    apply_transition(&state, &claims, &id, Transition::Retire)
}

// ── Audit ────────────────────────────────────

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// GET /v1/audit?limit=
pub async fn recent_audit(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> ApiResult<Json<Items<AuditEntry>>> {
    let Query(q) = query?;
    let limit = q.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).min(MAX_AUDIT_LIMIT);
    Ok(Json(Items { items: state.store.recent_events(limit)? }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdock_core::types::AgentStatus;
    use agentdock_platform::{AuthGate, MemoryStore};

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(MemoryStore::new()), AuthGate::new("test-secret", 3600)))
    }

    fn claims() -> Extension<Claims> {
        Extension(Claims { sub: "ops@acme.io".into(), roles: vec!["admin".into()], iat: 0, exp: 0 })
    }

    fn tenant_body(id: &str) -> Result<Json<CreateTenant>, JsonRejection> {
        Ok(Json(CreateTenant { id: Some(id.into()), name: Some("Acme Co".into()), ..Default::default() }))
    }

    #[tokio::test]
    async fn test_health_check() {
        let json = health_check(State(test_state())).await.0;
        assert_eq!(json["status"], "ok");
        assert!(json["ts"].is_string());
        assert!(json["uptimeSecs"].is_u64());
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let state = test_state();
        let body = LoginRequest { email: "ops@acme.io".into(), password: "pw".into() };
        let issued = login(State(state.clone()), Ok(Json(body))).await.unwrap().0;
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(state.auth.verify(&issued.token).unwrap().sub, "ops@acme.io");
        assert_eq!(state.store.recent_events(1).unwrap()[0].event_type, "login_success");
    }

    #[tokio::test]
    async fn test_login_rejects_empty_credentials() {
        let state = test_state();
        let err = login(State(state.clone()), Ok(Json(LoginRequest::default()))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.store.recent_events(1).unwrap()[0].event_type, "login_failed");
    }

    #[tokio::test]
    async fn test_create_tenant_records_audit() {
        let state = test_state();
        let (status, Json(t)) = create_tenant(State(state.clone()), claims(), tenant_body("acme")).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(t.id, "acme");

        let events = state.store.recent_events(1).unwrap();
        assert_eq!(events[0].event_type, "tenant_created");
        assert_eq!(events[0].subject, "acme");
    }

    #[tokio::test]
    async fn test_failed_create_is_not_audited() {
        let state = test_state();
        create_tenant(State(state.clone()), claims(), tenant_body("acme")).await.unwrap();
        let err = create_tenant(State(state.clone()), claims(), tenant_body("acme")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(state.store.recent_events(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transition_handlers() {
        let state = test_state();
        let input = CreateAgent {
            id: Some("rel-bot".into()),
            tenant_id: Some("acme".into()),
            name: Some("Release Bot".into()),
            agent_type: Some("devops".into()),
            version: None,
        };
        create_agent(State(state.clone()), claims(), Ok(Json(input))).await.unwrap();

        let change = retire_agent(State(state.clone()), claims(), Path("rel-bot".into())).await.unwrap().0;
        assert_eq!(change.status, AgentStatus::Retired);
        let change = deploy_agent(State(state.clone()), claims(), Path("rel-bot".into())).await.unwrap().0;
        assert_eq!(change.status, AgentStatus::Deployed);

        let err = pause_agent(State(state.clone()), claims(), Path("ghost".into())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_audit_limit_is_capped() {
        let state = test_state();
        for i in 0..3 {
            state.audit(AuditEvent::new("tenant_created", "ops@acme.io", &format!("t-{i}")));
        }
        let items = recent_audit(State(state.clone()), Ok(Query(AuditQuery { limit: Some(2) }))).await.unwrap().0.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].subject, "t-2");
    }
}
