//! Mapping of agent errors onto HTTP responses.
//!
//! Error bodies are plain text, one line, matching what nginx tooling and
//! shell scripts calling the agent expect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AgentError;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Request is malformed before reaching the core (missing filename or content).
    BadRequest(&'static str),
    /// The mutation task ended without producing an outcome.
    Aborted,
    Agent(AgentError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Aborted => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Agent(e) => match e {
                AgentError::InvalidName(_) => StatusCode::BAD_REQUEST,
                AgentError::NotFound(_) => StatusCode::NOT_FOUND,
                AgentError::Io { .. }
                | AgentError::ReloadFailed(_)
                | AgentError::RollbackFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        ApiError::Agent(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg) => msg.to_string(),
            ApiError::Aborted => "Mutation task aborted".to_string(),
            ApiError::Agent(AgentError::NotFound(_)) => "File not found".to_string(),
            ApiError::Agent(e) => e.to_string(),
        };

        let kind = match &self {
            ApiError::Agent(e) => e.kind(),
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Aborted => "aborted",
        };
        if status.is_server_error() {
            tracing::error!(status = %status, kind, error = %body, "Request failed");
        } else {
            tracing::debug!(status = %status, kind, error = %body, "Request rejected");
        }
        (status, body).into_response()
    }
}
