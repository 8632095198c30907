//! Response envelope returned for every request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::SocketRequest;

/// Stable `msg` codes emitted by the router itself.
///
/// Handlers add their own domain codes (`user_found`, `course_not_found`,
/// ...); the codes here are the routing-layer vocabulary clients branch on.
pub mod codes {
    /// Request shape or payload validation failed.
    pub const VALIDATION_FAILED: &str = "validation_failed";
    /// The `type` field named no registered service.
    pub const SERVICE_NOT_FOUND: &str = "service_not_found";
    /// The service exists but has no such action.
    pub const ACTION_NOT_FOUND: &str = "action_not_found";
    /// The connection's role satisfies none of the action's requirements.
    pub const FORBIDDEN: &str = "forbidden";
    /// A handler failed in an unclassified way.
    pub const INTERNAL_SERVER_ERROR: &str = "internal_server_error";
}

/// The fixed-shape wrapper returned for every request, success or failure.
///
/// Invariants: `status == true` implies `errors` is empty; `status == false`
/// implies `data` is absent. The `request` field always carries the
/// triggering request verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketResponse {
    /// Whether the request succeeded.
    pub status: bool,
    /// Short machine-readable code, not prose.
    pub msg: String,
    /// Result payload; present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable failure descriptions; empty on success.
    pub errors: Vec<String>,
    /// The originating request, echoed for client-side correlation.
    pub request: SocketRequest,
}

impl SocketResponse {
    /// Builds a success envelope carrying `data`.
    #[must_use]
    pub fn success(msg: impl Into<String>, data: Value, request: SocketRequest) -> Self {
        Self {
            status: true,
            msg: msg.into(),
            data: Some(data),
            errors: Vec::new(),
            request,
        }
    }

    /// Builds an error envelope with the given code and error list.
    #[must_use]
    pub fn error(msg: impl Into<String>, errors: Vec<String>, request: SocketRequest) -> Self {
        Self {
            status: false,
            msg: msg.into(),
            data: None,
            errors,
            request,
        }
    }

    /// Builds a `validation_failed` envelope; a fixed-`msg` convenience
    /// over [`SocketResponse::error`].
    #[must_use]
    pub fn validation_error(errors: Vec<String>, request: SocketRequest) -> Self {
        Self::error(codes::VALIDATION_FAILED, errors, request)
    }
}
