//! Tenant registry — create, read, update and delete tenant accounts.

use crate::store::RegistryStore;
use crate::validation::Checker;
use agentdock_core::error::{AgentDockError, Result};
use agentdock_core::types::{DEFAULT_REGION, Plan, Tenant};
use serde::Deserialize;
use std::sync::Arc;

/// Body of a tenant create request. Fields stay loosely typed so that every
/// problem can be reported per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenant {
    pub id: Option<String>,
    pub name: Option<String>,
    pub plan: Option<String>,
    pub region: Option<String>,
}

/// Partial tenant update. `id` and `createdAt` cannot be changed and are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub plan: Option<String>,
    pub region: Option<String>,
}

/// Tenant lifecycle over an injected store.
#[derive(Clone)]
pub struct TenantRegistry {
    store: Arc<dyn RegistryStore>,
}

impl TenantRegistry {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// All tenants in insertion order.
    pub fn list(&self) -> Result<Vec<Tenant>> {
        self.store.list_tenants()
    }

    /// Validate and insert a new tenant, applying plan and region defaults.
    pub fn create(&self, input: CreateTenant) -> Result<Tenant> {
        let mut check = Checker::new();
        let id = check.required_min("id", input.id.as_deref());
        let name = check.required_min("name", input.name.as_deref());
        let plan = match input.plan.as_deref() {
            Some(p) => check.one_of("plan", p, Plan::expected()),
            None => Some(Plan::default()),
        };
        let (Some(id), Some(name), Some(plan)) = (id, name, plan) else {
            return Err(check.into_error());
        };

        let tenant = Tenant {
            id,
            name,
            plan,
            region: input.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            created_at: chrono::Utc::now(),
        };
        self.store.insert_tenant(&tenant)?;
        tracing::info!("🏢 Tenant '{}' created (plan={}, region={})", tenant.id, tenant.plan, tenant.region);
        Ok(tenant)
    }

    pub fn get(&self, id: &str) -> Result<Tenant> {
        self.store.get_tenant(id)?.ok_or_else(|| AgentDockError::not_found("tenant", id))
    }

    /// Merge the provided fields into an existing tenant.
    pub fn update(&self, id: &str, patch: UpdateTenant) -> Result<Tenant> {
        let mut tenant = self.get(id)?;
        let mut check = Checker::new();
        if let Some(name) = patch.name.as_deref() {
            check.min_len("name", name);
        }
        let plan = patch.plan.as_deref().and_then(|p| check.one_of::<Plan>("plan", p, Plan::expected()));
        check.finish().map_err(AgentDockError::Validation)?;

        if let Some(name) = patch.name {
            tenant.name = name;
        }
        if let Some(plan) = plan {
            tenant.plan = plan;
        }
        if let Some(region) = patch.region {
            tenant.region = region;
        }

        if !self.store.update_tenant(&tenant)? {
            return Err(AgentDockError::not_found("tenant", id));
        }
        tracing::info!("Tenant '{}' updated", tenant.id);
        Ok(tenant)
    }

    /// Remove a tenant. Deleting an unknown id still succeeds.
    pub fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete_tenant(id)? {
            tracing::info!("🗑 Tenant '{id}' deleted");
        } else {
            tracing::debug!("Delete of unknown tenant '{id}' ignored");
        }
        Ok(())
    }
}
