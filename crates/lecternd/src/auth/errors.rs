//! Error types for authentication failures.

use thiserror::Error;

/// Errors surfaced while authenticating a connection.
///
/// The daemon distinguishes these internally (they are logged precisely),
/// but [`AuthError::wire_reason`] collapses verification failures so the
/// remote peer cannot probe whether a token was tampered with, signed with
/// the wrong secret, or merely expired.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No token was found in any of the handshake's transport locations.
    #[error("no authentication token provided")]
    NoToken,
    /// The handshake could not establish any identity.
    #[error("unauthorized access")]
    Unauthorized,
    /// The token failed signature or structural verification.
    #[error("invalid or expired token")]
    InvalidToken,
    /// The token's signature was valid but its expiry has passed.
    #[error("token has expired")]
    TokenExpired,
    /// Token issuance failed; only reachable through the issuing APIs.
    #[error("token issuance failed: {0}")]
    Issue(String),
}

impl AuthError {
    /// The refusal reason written to the peer when a handshake fails.
    ///
    /// Verification failures all map to `invalid_token`; the expired case
    /// is deliberately not distinguishable from tampering on the wire.
    #[must_use]
    pub fn wire_reason(&self) -> &'static str {
        match self {
            Self::NoToken | Self::Unauthorized => "unauthorized",
            Self::InvalidToken | Self::TokenExpired | Self::Issue(_) => "invalid_token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_and_tampered_share_a_wire_reason() {
        assert_eq!(AuthError::InvalidToken.wire_reason(), "invalid_token");
        assert_eq!(AuthError::TokenExpired.wire_reason(), "invalid_token");
    }

    #[test]
    fn missing_tokens_read_as_unauthorized() {
        assert_eq!(AuthError::NoToken.wire_reason(), "unauthorized");
        assert_eq!(AuthError::Unauthorized.wire_reason(), "unauthorized");
    }
}
