//! AgentDock configuration, loaded from `~/.agentdock/config.toml`.

use crate::error::{AgentDockError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Signing secret used when none is configured. Development only.
pub const DEV_FALLBACK_SECRET: &str = "agentdock-dev-secret";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDockConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret. Falls back to [`DEV_FALLBACK_SECRET`] when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
    /// When both admin fields are set, login checks credentials against them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password_hash: Option<String>,
}

fn default_token_ttl() -> i64 { 3600 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl(),
            admin_email: None,
            admin_password_hash: None,
        }
    }
}

impl AuthConfig {
    /// The configured secret, or the development fallback.
    pub fn secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => DEV_FALLBACK_SECRET,
        }
    }

    /// Reject settings that would produce unusable tokens.
    pub fn validate(&self) -> Result<()> {
        if self.token_ttl_secs <= 0 {
            return Err(AgentDockError::Config(format!(
                "auth.token_ttl_secs must be positive, got {}",
                self.token_ttl_secs
            )));
        }
        Ok(())
    }

    pub fn uses_fallback_secret(&self) -> bool {
        self.secret() == DEV_FALLBACK_SECRET
    }

    /// Configured admin account as `(email, bcrypt_hash)`.
    pub fn admin_account(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password_hash.as_deref()) {
            (Some(email), Some(hash)) if !email.is_empty() && !hash.is_empty() => Some((email, hash)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// State is lost on restart.
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.agentdock/registry.db".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), path: default_db_path() }
    }
}

impl StorageConfig {
    /// Database path with `~` and environment variables expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::full(&self.path).map(|p| p.into_owned()).unwrap_or_else(|_| self.path.clone()))
    }
}

impl AgentDockConfig {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agentdock")
            .join("config.toml")
    }

    /// Config path from `AGENTDOCK_CONFIG`, else the default location.
    pub fn resolve_path() -> PathBuf {
        std::env::var("AGENTDOCK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path())
    }

    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentDockError::Config(format!("Read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AgentDockError::Config(format!("Parse config: {e}")))
    }

    /// Load the file if it exists, defaults otherwise, then apply env overrides.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut cfg = if path.exists() {
            Self::load_from(path)?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };
        cfg.apply_env();
        cfg.auth.validate()?;
        Ok(cfg)
    }

    /// Apply `AGENTDOCK_JWT_SECRET` and `AGENTDOCK_PORT`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("AGENTDOCK_JWT_SECRET").ok(),
            std::env::var("AGENTDOCK_PORT").ok(),
        );
    }

    fn apply_overrides(&mut self, secret: Option<String>, port: Option<String>) {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(port) = port {
            match port.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => tracing::warn!("Ignoring invalid AGENTDOCK_PORT '{port}'"),
            }
        }
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AgentDockError::Config(format!("Create {}: {e}", parent.display())))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AgentDockError::Config(format!("Serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| AgentDockError::Config(format!("Write {}: {e}", path.display())))
    }
}
