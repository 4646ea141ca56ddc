//! Agent registry — agents scoped by tenant, with a deployment status.

use crate::store::RegistryStore;
use crate::validation::Checker;
use agentdock_core::error::{AgentDockError, Result};
use agentdock_core::types::{Agent, AgentStatus, AgentType, DEFAULT_AGENT_VERSION};
use serde::Deserialize;
use std::sync::Arc;

/// Body of an agent create request. Any `status` in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgent {
    pub id: Option<String>,
    pub tenant_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
    pub version: Option<String>,
}

/// Status-changing actions exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Deploy,
    Pause,
    Retire,
}

impl Transition {
    pub fn target(self) -> AgentStatus {
        match self {
            Transition::Deploy => AgentStatus::Deployed,
            Transition::Pause => AgentStatus::Paused,
            Transition::Retire => AgentStatus::Retired,
        }
    }

    /// Audit event name, e.g. `agent_deployed`.
    pub fn event_type(self) -> &'static str {
        match self {
            Transition::Deploy => "agent_deployed",
            Transition::Pause => "agent_paused",
            Transition::Retire => "agent_retired",
        }
    }
}

/// Agent lifecycle over an injected store.
#[derive(Clone)]
pub struct AgentRegistry {
    store: Arc<dyn RegistryStore>,
}

impl AgentRegistry {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// Agents in insertion order, optionally for one tenant.
    pub fn list(&self, tenant_id: Option<&str>) -> Result<Vec<Agent>> {
        self.store.list_agents(tenant_id)
    }

    /// Validate and insert a new agent. New agents always start as `draft`.
    /// The tenant id is not checked against the tenant registry.
    pub fn create(&self, input: CreateAgent) -> Result<Agent> {
        let mut check = Checker::new();
        let id = check.required_min("id", input.id.as_deref());
        let tenant_id = check.required_min("tenantId", input.tenant_id.as_deref());
        let name = check.required_min("name", input.name.as_deref());
        let agent_type = match input.agent_type.as_deref() {
            Some(t) => check.one_of::<AgentType>("type", t, AgentType::expected()),
            None => check.missing("type"),
        };
        let (Some(id), Some(tenant_id), Some(name), Some(agent_type)) = (id, tenant_id, name, agent_type) else {
            return Err(check.into_error());
        };

        let agent = Agent {
            id,
            tenant_id,
            name,
            agent_type,
            version: input.version.unwrap_or_else(|| DEFAULT_AGENT_VERSION.to_string()),
            status: AgentStatus::Draft,
            created_at: chrono::Utc::now(),
        };
        self.store.insert_agent(&agent)?;
        tracing::info!("🤖 Agent '{}' created for tenant '{}' (type={})", agent.id, agent.tenant_id, agent.agent_type);
        Ok(agent)
    }

    pub fn get(&self, id: &str) -> Result<Agent> {
        self.store.get_agent(id)?.ok_or_else(|| AgentDockError::not_found("agent", id))
    }

    /// Set the agent's status. Every transition is allowed, including
    /// leaving `retired`; whether retired should be terminal is undecided.
    pub fn transition(&self, id: &str, action: Transition) -> Result<Agent> {
        let mut agent = self.get(id)?;
        let from = agent.status;
        let to = action.target();
        if from == AgentStatus::Retired && to != AgentStatus::Retired {
            tracing::warn!("Agent '{id}' leaves retired status ({from} -> {to})");
        }

        agent.status = to;
        if !self.store.update_agent(&agent)? {
            return Err(AgentDockError::not_found("agent", id));
        }
        tracing::info!("Agent '{id}' {from} -> {to}");
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::store::MemoryStore;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn input(id: &str, tenant: &str) -> CreateAgent {
        CreateAgent {
            id: Some(id.into()),
            tenant_id: Some(tenant.into()),
            name: Some("Release Bot".into()),
            agent_type: Some("devops".into()),
            version: None,
        }
    }

    #[test]
    fn test_create_starts_in_draft_with_default_version() {
        let reg = registry();
        let a = reg.create(input("rel-bot", "acme")).unwrap();
        assert_eq!(a.status, AgentStatus::Draft);
        assert_eq!(a.version, "v1");
        assert_eq!(a.agent_type, AgentType::Devops);
    }

    #[test]
    fn test_status_in_payload_is_ignored() {
        let body = serde_json::json!({
            "id": "qa-bot", "tenantId": "acme", "name": "QA Bot",
            "type": "qa", "status": "deployed"
        });
        let input: CreateAgent = serde_json::from_value(body).unwrap();
        let a = registry().create(input).unwrap();
        assert_eq!(a.status, AgentStatus::Draft);
    }

    #[test]
    fn test_create_validation() {
        let reg = registry();
        let err = reg
            .create(CreateAgent { id: Some("x".into()), agent_type: Some("robot".into()), ..Default::default() })
            .unwrap_err();
        let AgentDockError::Validation(fields) = err else { panic!("expected validation error") };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["id", "tenantId", "name", "type"]);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let err = registry()
            .create(CreateAgent { agent_type: None, ..input("doc-bot", "acme") })
            .unwrap_err();
        assert!(matches!(err, AgentDockError::Validation(ref f) if f[0].field == "type"));
    }

    #[test]
    fn test_duplicate_agent_conflicts() {
        let reg = registry();
        reg.create(input("rel-bot", "acme")).unwrap();
        let err = reg.create(input("rel-bot", "globex")).unwrap_err();
        assert!(matches!(err, AgentDockError::Conflict { kind: "agent", .. }));
        assert_eq!(reg.get("rel-bot").unwrap().tenant_id, "acme");
    }

    #[test]
    fn test_list_filters_by_tenant() {
        let reg = registry();
        reg.create(input("a-one", "acme")).unwrap();
        reg.create(input("b-one", "globex")).unwrap();
        reg.create(input("a-two", "acme")).unwrap();
        assert_eq!(reg.list(None).unwrap().len(), 3);
        let ids: Vec<_> = reg.list(Some("acme")).unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["a-one", "a-two"]);
    }

    #[test]
    fn test_retired_agent_can_be_redeployed() {
        let reg = registry();
        reg.create(input("rel-bot", "acme")).unwrap();
        assert_eq!(reg.transition("rel-bot", Transition::Retire).unwrap().status, AgentStatus::Retired);
        assert_eq!(reg.transition("rel-bot", Transition::Deploy).unwrap().status, AgentStatus::Deployed);
        assert_eq!(reg.get("rel-bot").unwrap().status, AgentStatus::Deployed);
    }

    #[test]
    fn test_transition_unknown_agent() {
        let err = registry().transition("ghost", Transition::Pause).unwrap_err();
        assert!(matches!(err, AgentDockError::NotFound { kind: "agent", .. }));
    }

    #[test]
    fn test_transitions_persist_in_sqlite() {
        let reg = AgentRegistry::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        reg.create(input("rel-bot", "acme")).unwrap();
        reg.transition("rel-bot", Transition::Deploy).unwrap();
        reg.transition("rel-bot", Transition::Pause).unwrap();
        assert_eq!(reg.get("rel-bot").unwrap().status, AgentStatus::Paused);
    }
}
