//! Maps registry errors onto HTTP responses.

use agentdock_core::error::AgentDockError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error returned by every handler.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AgentDockError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AgentDockError::Validation(_) => StatusCode::BAD_REQUEST,
            AgentDockError::Conflict { .. } => StatusCode::CONFLICT,
            AgentDockError::NotFound { .. } => StatusCode::NOT_FOUND,
            AgentDockError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AgentDockError::Storage(_) | AgentDockError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AgentDockError::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AgentDockError::invalid("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self.0);
        }

        let mut body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        if let AgentDockError::Validation(fields) = &self.0 {
            body["details"] = serde_json::json!(fields);
        }
        (status, Json(body)).into_response()
    }
}
