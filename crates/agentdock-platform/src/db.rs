//! SQLite registry store: tenants, agents and the audit log.

use crate::store::RegistryStore;
use agentdock_core::error::{AgentDockError, Result};
use agentdock_core::types::{Agent, AuditEntry, AuditEvent, Tenant};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Registry store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const TENANT_COLUMNS: &str = "id,name,plan,region,created_at";
const AGENT_COLUMNS: &str = "id,tenant_id,name,agent_type,version,status,created_at";

impl SqliteStore {
    /// Open or create the registry database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AgentDockError::Storage(format!("Create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| AgentDockError::Storage(format!("DB open error: {e}")))?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AgentDockError::Storage(format!("DB open error: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn: Mutex::new(conn) };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        self.conn().execute_batch("
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                plan TEXT NOT NULL DEFAULT 'pro',
                region TEXT NOT NULL DEFAULT 'us-east-1',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                agent_type TEXT NOT NULL,
                version TEXT NOT NULL DEFAULT 'v1',
                status TEXT NOT NULL DEFAULT 'draft',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_agents_tenant ON agents(tenant_id);

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                actor TEXT NOT NULL,
                subject TEXT NOT NULL,
                details TEXT,
                created_at TEXT NOT NULL
            );
        ").map_err(|e| AgentDockError::Storage(format!("Migration error: {e}")))?;
        Ok(())
    }
}

fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        plan: parse_col(row, 2)?,
        region: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        agent_type: parse_col(row, 3)?,
        version: row.get(4)?,
        status: parse_col(row, 5)?,
        created_at: row.get(6)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

impl RegistryStore for SqliteStore {
    // ── Tenants ────────────────────────────────────

    fn insert_tenant(&self, t: &Tenant) -> Result<()> {
        self.conn().execute(
            "INSERT INTO tenants (id, name, plan, region, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![t.id, t.name, t.plan.as_str(), t.region, t.created_at],
        ).map_err(|e| {
            if is_unique_violation(&e) {
                AgentDockError::conflict("tenant", &t.id)
            } else {
                AgentDockError::Storage(format!("Insert tenant: {e}"))
            }
        })?;
        Ok(())
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY rowid"))
            .map_err(|e| AgentDockError::Storage(format!("Prepare: {e}")))?;

        let tenants = stmt.query_map([], tenant_from_row)
            .map_err(|e| AgentDockError::Storage(format!("Query: {e}")))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AgentDockError::Storage(format!("Read tenant: {e}")))?;
        Ok(tenants)
    }

    fn get_tenant(&self, id: &str) -> Result<Option<Tenant>> {
        self.conn().query_row(
            &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id=?1"),
            params![id],
            tenant_from_row,
        ).optional().map_err(|e| AgentDockError::Storage(format!("Get tenant: {e}")))
    }

    fn update_tenant(&self, t: &Tenant) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE tenants SET name=?1, plan=?2, region=?3 WHERE id=?4",
            params![t.name, t.plan.as_str(), t.region, t.id],
        ).map_err(|e| AgentDockError::Storage(format!("Update tenant: {e}")))?;
        Ok(changed > 0)
    }

    fn delete_tenant(&self, id: &str) -> Result<bool> {
        let changed = self.conn().execute("DELETE FROM tenants WHERE id=?1", params![id])
            .map_err(|e| AgentDockError::Storage(format!("Delete tenant: {e}")))?;
        Ok(changed > 0)
    }

    // ── Agents ────────────────────────────────────

    fn insert_agent(&self, a: &Agent) -> Result<()> {
        self.conn().execute(
            "INSERT INTO agents (id, tenant_id, name, agent_type, version, status, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![a.id, a.tenant_id, a.name, a.agent_type.as_str(), a.version, a.status.as_str(), a.created_at],
        ).map_err(|e| {
            if is_unique_violation(&e) {
                AgentDockError::conflict("agent", &a.id)
            } else {
                AgentDockError::Storage(format!("Insert agent: {e}"))
            }
        })?;
        Ok(())
    }

    fn list_agents(&self, tenant_id: Option<&str>) -> Result<Vec<Agent>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE ?1 IS NULL OR tenant_id=?1 ORDER BY rowid"
        )).map_err(|e| AgentDockError::Storage(format!("Prepare: {e}")))?;

        let agents = stmt.query_map(params![tenant_id], agent_from_row)
            .map_err(|e| AgentDockError::Storage(format!("Query: {e}")))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AgentDockError::Storage(format!("Read agent: {e}")))?;
        Ok(agents)
    }

    fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        self.conn().query_row(
            &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id=?1"),
            params![id],
            agent_from_row,
        ).optional().map_err(|e| AgentDockError::Storage(format!("Get agent: {e}")))
    }

    fn update_agent(&self, a: &Agent) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE agents SET tenant_id=?1, name=?2, agent_type=?3, version=?4, status=?5 WHERE id=?6",
            params![a.tenant_id, a.name, a.agent_type.as_str(), a.version, a.status.as_str(), a.id],
        ).map_err(|e| AgentDockError::Storage(format!("Update agent: {e}")))?;
        Ok(changed > 0)
    }

    // ── Audit Log ────────────────────────────────────

    fn log_event(&self, event: &AuditEvent) -> Result<()> {
        self.conn().execute(
            "INSERT INTO audit_log (event_type, actor, subject, details, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![event.event_type, event.actor, event.subject, event.details, chrono::Utc::now()],
        ).map_err(|e| AgentDockError::Storage(format!("Log event: {e}")))?;
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id,event_type,actor,subject,details,created_at FROM audit_log ORDER BY id DESC LIMIT ?1"
        ).map_err(|e| AgentDockError::Storage(format!("Prepare: {e}")))?;

        let entries = stmt.query_map(params![limit as i64], |row| Ok(AuditEntry {
            id: row.get(0)?, event_type: row.get(1)?, actor: row.get(2)?,
            subject: row.get(3)?, details: row.get(4)?, created_at: row.get(5)?,
        })).map_err(|e| AgentDockError::Storage(format!("Query: {e}")))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AgentDockError::Storage(format!("Read audit entry: {e}")))?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{exercise_store, tenant};

    #[test]
    fn test_sqlite_store_contract() {
        exercise_store(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = std::env::temp_dir().join(format!("agentdock-db-{}", std::process::id()));
        let path = dir.join("registry.db");
        {
            let db = SqliteStore::open(&path).unwrap();
            db.insert_tenant(&tenant("acme")).unwrap();
        }
        let db = SqliteStore::open(&path).unwrap();
        let t = db.get_tenant("acme").unwrap().unwrap();
        assert_eq!(t.name, "acme Inc");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_enum_column_is_storage_error() {
        let db = SqliteStore::open_in_memory().unwrap();
        db.conn().execute(
            "INSERT INTO tenants (id, name, plan, region, created_at) VALUES ('bad','Bad Co','gold','eu-west-1',?1)",
            params![chrono::Utc::now()],
        ).unwrap();
        let err = db.get_tenant("bad").unwrap_err();
        assert!(matches!(err, AgentDockError::Storage(_)));
    }
}
