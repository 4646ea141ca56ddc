//! Storage interface behind the registries, plus the in-memory backend.

use agentdock_core::error::{AgentDockError, Result};
use agentdock_core::types::{Agent, AuditEntry, AuditEvent, Tenant};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Persistence for tenants, agents and the audit log.
///
/// `insert_*` must reject an id that is already present with
/// [`AgentDockError::Conflict`] and leave the stored record untouched.
/// Listings come back in insertion order.
pub trait RegistryStore: Send + Sync {
    fn insert_tenant(&self, tenant: &Tenant) -> Result<()>;
    fn list_tenants(&self) -> Result<Vec<Tenant>>;
    fn get_tenant(&self, id: &str) -> Result<Option<Tenant>>;
    /// Replace a tenant. Returns `false` if it no longer exists.
    fn update_tenant(&self, tenant: &Tenant) -> Result<bool>;
    /// Returns `true` if a record was removed.
    fn delete_tenant(&self, id: &str) -> Result<bool>;

    fn insert_agent(&self, agent: &Agent) -> Result<()>;
    fn list_agents(&self, tenant_id: Option<&str>) -> Result<Vec<Agent>>;
    fn get_agent(&self, id: &str) -> Result<Option<Agent>>;
    /// Replace an agent. Returns `false` if it no longer exists.
    fn update_agent(&self, agent: &Agent) -> Result<bool>;

    fn log_event(&self, event: &AuditEvent) -> Result<()>;
    /// Most recent entries first.
    fn recent_events(&self, limit: usize) -> Result<Vec<AuditEntry>>;
}

#[derive(Default)]
struct MemoryInner {
    tenants: Vec<Tenant>,
    agents: Vec<Agent>,
    audit: Vec<AuditEntry>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicked writer leaves every Vec structurally valid, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl RegistryStore for MemoryStore {
    fn insert_tenant(&self, tenant: &Tenant) -> Result<()> {
        let mut inner = self.write();
        if inner.tenants.iter().any(|t| t.id == tenant.id) {
            return Err(AgentDockError::conflict("tenant", &tenant.id));
        }
        inner.tenants.push(tenant.clone());
        Ok(())
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>> {
        Ok(self.read().tenants.clone())
    }

    fn get_tenant(&self, id: &str) -> Result<Option<Tenant>> {
        Ok(self.read().tenants.iter().find(|t| t.id == id).cloned())
    }

    fn update_tenant(&self, tenant: &Tenant) -> Result<bool> {
        let mut inner = self.write();
        match inner.tenants.iter_mut().find(|t| t.id == tenant.id) {
            Some(slot) => {
                *slot = tenant.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_tenant(&self, id: &str) -> Result<bool> {
        let mut inner = self.write();
        let before = inner.tenants.len();
        inner.tenants.retain(|t| t.id != id);
        Ok(inner.tenants.len() != before)
    }

    fn insert_agent(&self, agent: &Agent) -> Result<()> {
        let mut inner = self.write();
        if inner.agents.iter().any(|a| a.id == agent.id) {
            return Err(AgentDockError::conflict("agent", &agent.id));
        }
        inner.agents.push(agent.clone());
        Ok(())
    }

    fn list_agents(&self, tenant_id: Option<&str>) -> Result<Vec<Agent>> {
        let inner = self.read();
        Ok(inner
            .agents
            .iter()
            .filter(|a| tenant_id.is_none_or(|t| a.tenant_id == t))
            .cloned()
            .collect())
    }

    fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        Ok(self.read().agents.iter().find(|a| a.id == id).cloned())
    }

    fn update_agent(&self, agent: &Agent) -> Result<bool> {
        let mut inner = self.write();
        match inner.agents.iter_mut().find(|a| a.id == agent.id) {
            Some(slot) => {
                *slot = agent.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn log_event(&self, event: &AuditEvent) -> Result<()> {
        let mut inner = self.write();
        let id = inner.audit.last().map_or(1, |e| e.id + 1);
        inner.audit.push(AuditEntry {
            id,
            event_type: event.event_type.clone(),
            actor: event.actor.clone(),
            subject: event.subject.clone(),
            details: event.details.clone(),
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        Ok(self.read().audit.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use agentdock_core::types::{AgentStatus, AgentType, Plan};
    use chrono::Utc;

    pub(crate) fn tenant(id: &str) -> Tenant {
        Tenant {
            id: id.into(),
            name: format!("{id} Inc"),
            plan: Plan::Pro,
            region: "us-east-1".into(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn agent(id: &str, tenant_id: &str) -> Agent {
        Agent {
            id: id.into(),
            tenant_id: tenant_id.into(),
            name: format!("{id} bot"),
            agent_type: AgentType::Dev,
            version: "v1".into(),
            status: AgentStatus::Draft,
            created_at: Utc::now(),
        }
    }

    /// Contract every backend must satisfy.
    pub(crate) fn exercise_store(store: &dyn RegistryStore) {
        store.insert_tenant(&tenant("acme")).unwrap();
        store.insert_tenant(&tenant("globex")).unwrap();
        store.insert_tenant(&tenant("initech")).unwrap();

        let mut dup = tenant("acme");
        dup.name = "Impostor".into();
        let err = store.insert_tenant(&dup).unwrap_err();
        assert!(matches!(err, AgentDockError::Conflict { kind: "tenant", .. }));
        assert_eq!(store.get_tenant("acme").unwrap().unwrap().name, "acme Inc");

        let ids: Vec<_> = store.list_tenants().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["acme", "globex", "initech"]);

        let mut updated = store.get_tenant("globex").unwrap().unwrap();
        updated.plan = Plan::Enterprise;
        assert!(store.update_tenant(&updated).unwrap());
        assert_eq!(store.get_tenant("globex").unwrap().unwrap().plan, Plan::Enterprise);
        assert!(!store.update_tenant(&tenant("ghost")).unwrap());

        assert!(store.delete_tenant("globex").unwrap());
        assert!(!store.delete_tenant("globex").unwrap());
        assert!(store.get_tenant("globex").unwrap().is_none());

        store.insert_agent(&agent("a-1", "acme")).unwrap();
        store.insert_agent(&agent("a-2", "initech")).unwrap();
        store.insert_agent(&agent("a-3", "acme")).unwrap();
        assert!(matches!(
            store.insert_agent(&agent("a-1", "initech")).unwrap_err(),
            AgentDockError::Conflict { kind: "agent", .. }
        ));

        let all: Vec<_> = store.list_agents(None).unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(all, ["a-1", "a-2", "a-3"]);
        let acme: Vec<_> = store.list_agents(Some("acme")).unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(acme, ["a-1", "a-3"]);
        assert!(store.list_agents(Some("nobody")).unwrap().is_empty());

        let mut deployed = store.get_agent("a-2").unwrap().unwrap();
        deployed.status = AgentStatus::Deployed;
        assert!(store.update_agent(&deployed).unwrap());
        assert_eq!(store.get_agent("a-2").unwrap().unwrap().status, AgentStatus::Deployed);
        assert!(!store.update_agent(&agent("ghost", "acme")).unwrap());

        store.log_event(&AuditEvent::new("tenant_created", "admin@acme.io", "acme")).unwrap();
        store
            .log_event(&AuditEvent::new("agent_deployed", "admin@acme.io", "a-2").with_details("from=draft"))
            .unwrap();
        let events = store.recent_events(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "agent_deployed"); // most recent first
        assert_eq!(events[0].details.as_deref(), Some("from=draft"));
        assert!(events[0].id > events[1].id);
        assert_eq!(store.recent_events(1).unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_contract() {
        exercise_store(&MemoryStore::new());
    }

    #[test]
    fn test_memory_store_reinsert_after_delete_goes_last() {
        let store = MemoryStore::new();
        store.insert_tenant(&tenant("aaa")).unwrap();
        store.insert_tenant(&tenant("bbb")).unwrap();
        store.delete_tenant("aaa").unwrap();
        store.insert_tenant(&tenant("aaa")).unwrap();
        let ids: Vec<_> = store.list_tenants().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["bbb", "aaa"]);
    }
}
