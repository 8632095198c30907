//! The once-per-connection authentication handshake.
//!
//! The first JSONL line of every connection carries the handshake. A token
//! may arrive in one of three transport locations, consulted in priority
//! order: the explicit `auth.token` field, the `authorization` header
//! (optionally `Bearer `-prefixed), or an `accessToken` cookie inside the
//! `cookie` header. The first non-empty candidate wins; later sources are
//! not consulted.

use serde::Deserialize;
use tracing::{debug, info};

use super::AUTH_TARGET;
use super::errors::AuthError;
use super::token::{Claim, TokenAuthority};

const COOKIE_KEY: &str = "accessToken";
const BEARER_PREFIX: &str = "Bearer ";

/// Parsed handshake line from a connecting client.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeRequest {
    #[serde(default)]
    auth: Option<HandshakeAuth>,
    #[serde(default)]
    headers: Option<HandshakeHeaders>,
}

#[derive(Debug, Default, Deserialize)]
struct HandshakeAuth {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HandshakeHeaders {
    #[serde(default)]
    authorization: Option<String>,
    #[serde(default)]
    cookie: Option<String>,
}

impl HandshakeRequest {
    /// Builds a handshake presenting a token in the explicit auth field.
    /// Primarily useful for clients and tests.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth: Some(HandshakeAuth {
                token: Some(token.into()),
            }),
            headers: None,
        }
    }

    /// Extracts the bearer token following the source priority order.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoToken`] when no source yields a non-empty
    /// candidate.
    pub fn require_token(&self) -> Result<String, AuthError> {
        self.explicit_token()
            .or_else(|| self.authorization_token())
            .or_else(|| self.cookie_token())
            .ok_or(AuthError::NoToken)
    }

    fn explicit_token(&self) -> Option<String> {
        non_empty(self.auth.as_ref()?.token.as_deref()?)
    }

    fn authorization_token(&self) -> Option<String> {
        let raw = self.headers.as_ref()?.authorization.as_deref()?;
        let raw = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw);
        non_empty(raw)
    }

    fn cookie_token(&self) -> Option<String> {
        let cookies = self.headers.as_ref()?.cookie.as_deref()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            if name.trim() == COOKIE_KEY {
                non_empty(value.trim())
            } else {
                None
            }
        })
    }
}

fn non_empty(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Authenticates new connections against the token authority.
pub struct Authenticator {
    authority: TokenAuthority,
}

impl Authenticator {
    /// Wraps a token authority for handshake use.
    #[must_use]
    pub fn new(authority: TokenAuthority) -> Self {
        Self { authority }
    }

    /// Access to the underlying authority, for token issuance.
    #[must_use]
    pub fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    /// Runs the handshake once for a new connection.
    ///
    /// Verification attempts access-token semantics first and falls back to
    /// guest-token semantics. A connection is never silently downgraded to
    /// guest: the guest claim is only established when guest verification
    /// independently succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] when no token is presented, or
    /// the access-token verification error when both verifications fail.
    pub fn authenticate(&self, handshake: &HandshakeRequest) -> Result<Claim, AuthError> {
        let token = handshake.require_token().map_err(|_| {
            debug!(target: AUTH_TARGET, "handshake carried no token");
            AuthError::Unauthorized
        })?;

        match self.authority.verify_access(&token) {
            Ok(claim) => Ok(claim),
            Err(access_error) => match self.authority.verify_guest(&token) {
                Ok(claim) => Ok(claim),
                Err(_) => {
                    info!(
                        target: AUTH_TARGET,
                        error = %access_error,
                        "handshake verification failed"
                    );
                    Err(access_error)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use lectern_config::TokenConfig;

    use crate::auth::Role;

    use super::*;

    fn handshake(json: &str) -> HandshakeRequest {
        serde_json::from_str(json).expect("parse handshake")
    }

    fn authenticator() -> Authenticator {
        Authenticator::new(TokenAuthority::new(&TokenConfig::default()))
    }

    #[test]
    fn explicit_auth_field_wins_over_headers() {
        let request = handshake(
            r#"{"auth":{"token":"explicit"},"headers":{"authorization":"Bearer header"}}"#,
        );
        assert_eq!(request.require_token().ok().as_deref(), Some("explicit"));
    }

    #[test]
    fn authorization_header_strips_bearer_prefix() {
        let request = handshake(r#"{"headers":{"authorization":"Bearer abc.def.ghi"}}"#);
        assert_eq!(request.require_token().ok().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn bare_authorization_header_is_accepted() {
        let request = handshake(r#"{"headers":{"authorization":"abc.def.ghi"}}"#);
        assert_eq!(request.require_token().ok().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_the_last_resort() {
        let request =
            handshake(r#"{"headers":{"cookie":"theme=dark; accessToken=from-cookie; x=1"}}"#);
        assert_eq!(request.require_token().ok().as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_candidates_fall_through_to_later_sources() {
        let request = handshake(
            r#"{"auth":{"token":""},"headers":{"authorization":"  ","cookie":"accessToken=t"}}"#,
        );
        assert_eq!(request.require_token().ok().as_deref(), Some("t"));
    }

    #[test]
    fn missing_token_everywhere_is_no_token() {
        let request = handshake("{}");
        assert_eq!(request.require_token(), Err(AuthError::NoToken));
    }

    #[test]
    fn access_token_authenticates_with_subject() {
        let authenticator = authenticator();
        let token = authenticator
            .authority()
            .issue_access("u1", "u1@example.com", Role::User)
            .expect("issue access");
        let claim = authenticator
            .authenticate(&HandshakeRequest::with_token(token))
            .expect("authenticate");
        assert_eq!(claim.subject.as_deref(), Some("u1"));
        assert_eq!(claim.role, Role::User);
    }

    #[test]
    fn guest_token_authenticates_via_fallback() {
        let authenticator = authenticator();
        let token = authenticator.authority().issue_guest().expect("issue guest");
        let claim = authenticator
            .authenticate(&HandshakeRequest::with_token(token))
            .expect("authenticate");
        assert_eq!(claim.role, Role::Guest);
        assert_eq!(claim.subject, None);
    }

    #[test]
    fn unverifiable_token_fails_both_paths() {
        let error = authenticator()
            .authenticate(&HandshakeRequest::with_token("garbage"))
            .expect_err("must fail");
        assert_eq!(error, AuthError::InvalidToken);
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let error = authenticator()
            .authenticate(&handshake("{}"))
            .expect_err("must fail");
        assert_eq!(error, AuthError::Unauthorized);
    }
}
