//! Request envelope sent by clients.
//!
//! The request schema mirrors the format produced by Lectern clients: a
//! service selector (`type`), an action within that service, and an
//! arbitrary JSON payload. All fields default when absent so shape
//! validation is a routing decision rather than a deserialization failure;
//! a malformed request must still be echoed back inside its error envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed request addressed to one action of one registered service.
///
/// The remote peer constructs this envelope; the router trusts its shape
/// only, never its content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketRequest {
    /// Name of the registered service (`type` on the wire).
    #[serde(rename = "type", default)]
    pub service: String,
    /// Name of the action within the service.
    #[serde(default)]
    pub action: String,
    /// Free-form payload forwarded verbatim to the handler.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl SocketRequest {
    /// Creates a request with an empty payload.
    pub fn new(service: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            action: action.into(),
            payload: Map::new(),
        }
    }

    /// Attaches a payload to the request.
    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the shape errors for this request, if any.
    ///
    /// A well-formed request names both a service and an action. Content
    /// validation (required payload fields and the like) belongs to the
    /// handler, not the envelope.
    pub fn shape_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.service.trim().is_empty() {
            errors.push("Request type is required".to_owned());
        }
        if self.action.trim().is_empty() {
            errors.push("Request action is required".to_owned());
        }
        errors
    }
}
