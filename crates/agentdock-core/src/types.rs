//! Registry records and their enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Comma-separated list of accepted values, for error messages.
            pub fn expected() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Tenant subscription plan.
    Plan, "plan", {
        Free => "free",
        Pro => "pro",
        Enterprise => "enterprise",
    }
);

impl Default for Plan {
    fn default() -> Self { Plan::Pro }
}

string_enum!(
    /// What an agent is built to do.
    AgentType, "agent type", {
        Dev => "dev",
        Devops => "devops",
        Qa => "qa",
        Data => "data",
        Bi => "bi",
        Security => "security",
        Docs => "docs",
    }
);

string_enum!(
    /// Deployment lifecycle of an agent.
    AgentStatus, "agent status", {
        Draft => "draft",
        Deployed => "deployed",
        Paused => "paused",
        Retired => "retired",
    }
);

impl Default for AgentStatus {
    fn default() -> Self { AgentStatus::Draft }
}

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_AGENT_VERSION: &str = "v1";

/// Tenant record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub plan: Plan,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

/// Agent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub version: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

/// Audit event to be appended.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: String,
    pub actor: String,
    pub subject: String,
    pub details: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: &str, actor: &str, subject: &str) -> Self {
        Self {
            event_type: event_type.into(),
            actor: actor.into(),
            subject: subject.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Stored audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub event_type: String,
    pub actor: String,
    pub subject: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
