//! Per-request context threaded into handlers.

use lectern_wire::SocketRequest;

use crate::auth::Claim;

/// Context available to a handler for one request.
///
/// The identity is connection-scoped: it was established once at handshake
/// time and is threaded explicitly into every call rather than living in
/// ambient state, so cross-connection leakage is impossible by
/// construction.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The connection's verified identity.
    pub identity: Claim,
    /// The originating request; handlers echo this into their envelopes.
    pub request: SocketRequest,
}

impl RequestContext {
    /// Pairs a connection identity with the request being dispatched.
    #[must_use]
    pub fn new(identity: Claim, request: SocketRequest) -> Self {
        Self { identity, request }
    }
}
