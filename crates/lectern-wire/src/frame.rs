//! JSONL frames exchanged after the connection handshake.
//!
//! Clients send [`ClientFrame`] lines; the daemon answers with
//! [`ServerFrame`] lines. A request carrying an `ack` id receives its
//! response as an [`ServerFrame::Ack`] with the same id; a request without
//! one receives an [`ServerFrame::Event`] on the `response` event. Both
//! delivery modes carry identical envelope content.

use serde::{Deserialize, Serialize};

use crate::request::SocketRequest;
use crate::response::SocketResponse;

/// Event name used for fire-and-forget response delivery.
pub const RESPONSE_EVENT: &str = "response";

/// A request line as sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    /// The request envelope itself.
    #[serde(flatten)]
    pub request: SocketRequest,
    /// Acknowledgment id; present when the client wants the response
    /// correlated to this call rather than emitted as an event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

/// A response line as sent by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake accepted; the connection is ready for requests.
    Welcome {
        /// Role established for the connection's lifetime.
        role: String,
        /// Subject identifier; absent for guest identities.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
    },
    /// Handshake refused; the daemon closes the connection after this frame.
    Rejected {
        /// Named refusal reason (`unauthorized` or `invalid_token`).
        reason: String,
    },
    /// Response to a request that supplied an `ack` id.
    Ack {
        /// The id the client attached to its request.
        id: u64,
        /// The response envelope.
        response: SocketResponse,
    },
    /// Response to a request without an `ack` id.
    Event {
        /// Event name; always [`RESPONSE_EVENT`] for request responses.
        event: String,
        /// The response envelope.
        response: SocketResponse,
    },
    /// A line that could not be parsed at all; no request to echo.
    ProtocolError {
        /// Description of the parse failure.
        message: String,
    },
}

impl ServerFrame {
    /// Builds a welcome frame for an authenticated connection.
    #[must_use]
    pub fn welcome(role: impl Into<String>, subject: Option<String>) -> Self {
        Self::Welcome {
            role: role.into(),
            subject,
        }
    }

    /// Builds a handshake refusal frame.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Builds an acknowledgment frame.
    #[must_use]
    pub fn ack(id: u64, response: SocketResponse) -> Self {
        Self::Ack { id, response }
    }

    /// Builds a `response` event frame.
    #[must_use]
    pub fn event(response: SocketResponse) -> Self {
        Self::Event {
            event: RESPONSE_EVENT.to_owned(),
            response,
        }
    }

    /// Builds a protocol error frame.
    #[must_use]
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }
}
