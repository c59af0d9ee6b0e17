//! Closed error taxonomy for the pipeline, plus the status-code mapping and
//! wire envelope spec.md §6/§7 describe.

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("request query could not be parsed: {0}")]
    MalformedQuery(String),

    #[error("filter on field {field:?} is invalid: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("search request is invalid: {0}")]
    InvalidSearch(String),

    #[error("authentication is required")]
    Unauthenticated,

    #[error("caller lacks permission for {action} on {component}")]
    Forbidden { component: String, action: String },

    #[error("request was canceled before it completed")]
    RequestCanceled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::MalformedQuery(_)
            | PipelineError::InvalidFilter { .. }
            | PipelineError::InvalidSearch(_) => StatusCode::BAD_REQUEST,
            PipelineError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PipelineError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PipelineError::RequestCanceled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::RouteNotFound { .. } => "route_not_found",
            PipelineError::MalformedQuery(_) => "malformed_query",
            PipelineError::InvalidFilter { .. } => "invalid_filter",
            PipelineError::InvalidSearch(_) => "invalid_search",
            PipelineError::Unauthenticated => "unauthenticated",
            PipelineError::Forbidden { .. } => "forbidden",
            PipelineError::RequestCanceled => "request_canceled",
            PipelineError::Internal(_) => "internal_error",
        }
    }

    /// Extra structured context surfaced only when `expose_details` is set
    /// (spec.md §7's `expose_detailed_errors` gate) — e.g. the RBAC
    /// `required_action`/`component` pair callers can use to request
    /// elevated access.
    #[must_use]
    pub fn context(&self) -> Option<serde_json::Value> {
        match self {
            PipelineError::Forbidden { component, action } => Some(serde_json::json!({
                "component": component,
                "required_action": action,
            })),
            PipelineError::RouteNotFound { method, path } => Some(serde_json::json!({
                "method": method,
                "path": path,
            })),
            _ => None,
        }
    }

    /// Build the wire envelope from spec.md §6: `{success, status, error,
    /// timestamp}`. `expose_details` gates whether `error.context` and the
    /// full message are included, or a generic message is substituted.
    #[must_use]
    pub fn envelope(&self, expose_details: bool, now: DateTime<Utc>) -> ErrorEnvelope {
        let message = if expose_details {
            self.to_string()
        } else {
            generic_message(self.status())
        };

        ErrorEnvelope {
            success: false,
            status: self.status().as_u16(),
            error: ErrorBody {
                message,
                error_type: self.error_type(),
                code: self.error_type(),
                context: expose_details.then(|| self.context()).flatten(),
            },
            timestamp: now,
        }
    }
}

fn generic_message(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "The requested resource was not found.".to_owned(),
        StatusCode::BAD_REQUEST => "The request could not be understood.".to_owned(),
        StatusCode::UNAUTHORIZED => "Authentication is required.".to_owned(),
        StatusCode::FORBIDDEN => "You do not have permission to perform this action.".to_owned(),
        StatusCode::INTERNAL_SERVER_ERROR => "An internal error occurred.".to_owned(),
        _ => "The request could not be completed.".to_owned(),
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub status: u16,
    pub error: ErrorBody,
    pub timestamp: DateTime<Utc>,
}
