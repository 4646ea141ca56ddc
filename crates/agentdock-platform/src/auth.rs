//! JWT auth gate for the registry API.

use agentdock_core::config::AuthConfig;
use agentdock_core::error::{AgentDockError, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Role granted to every login.
pub const DEFAULT_ROLE: &str = "admin";

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: usize,
    pub exp: usize,
}

/// A freshly signed token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Signs, verifies and hands out bearer tokens.
pub struct AuthGate {
    secret: String,
    ttl_secs: i64,
    admin: Option<(String, String)>,
}

impl AuthGate {
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self { secret: secret.into(), ttl_secs, admin: None }
    }

    /// Build the gate from `[auth]` config. The token TTL must be positive.
    pub fn from_config(cfg: &AuthConfig) -> Result<Self> {
        cfg.validate()?;
        let mut gate = Self::new(cfg.secret(), cfg.token_ttl_secs);
        if let Some((email, hash)) = cfg.admin_account() {
            gate = gate.with_admin(email, hash);
        }
        Ok(gate)
    }

    /// Check logins against a single admin account instead of accepting any pair.
    pub fn with_admin(mut self, email: &str, password_hash: &str) -> Self {
        self.admin = Some((email.to_string(), password_hash.to_string()));
        self
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Generate a JWT for `subject` with the given roles.
    pub fn sign(&self, subject: &str, roles: &[&str]) -> Result<IssuedToken> {
        let now = chrono::Utc::now();
        let exp = chrono::TimeDelta::try_seconds(self.ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AgentDockError::Config(format!("Token TTL out of range: {}", self.ttl_secs)))?;

        let claims = Claims {
            sub: subject.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iat: now.timestamp().max(0) as usize,
            exp: exp.timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| AgentDockError::Config(format!("Token creation failed: {e}")))?;
        Ok(IssuedToken { token, expires_in: self.ttl_secs })
    }

    /// Validate and decode a JWT. Expiry is enforced with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| AgentDockError::unauthorized(format!("Token validation failed: {e}")))
    }

    /// Verify an `Authorization` header value of the form `Bearer <token>`.
    /// The scheme name is matched case-insensitively.
    pub fn authorize(&self, header: Option<&str>) -> Result<Claims> {
        let header = header.ok_or_else(|| AgentDockError::unauthorized("Missing Authorization header"))?;
        let token = header
            .trim_start()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AgentDockError::unauthorized("Expected a Bearer token"))?;
        self.verify(token)
    }

    /// Exchange credentials for a token.
    ///
    /// Without a configured admin account any non-empty email and password
    /// are accepted. This is a placeholder, not a credential check.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AgentDockError::unauthorized("Email and password are required"));
        }
        if let Some((admin_email, hash)) = &self.admin {
            if !email.eq_ignore_ascii_case(admin_email) || !verify_password(password, hash) {
                return Err(AgentDockError::unauthorized("Invalid credentials"));
            }
        }
        self.sign(email, &[DEFAULT_ROLE])
    }
}

/// Hash a password using bcrypt.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AgentDockError::Config(format!("Hash error: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
