//! Credential verification and issuance for the three token kinds.
//!
//! Access, guest and refresh tokens are HS256 JWTs signed with independent
//! secrets and independently configured expiries. Verification is pure and
//! stateless: expiry is checked against the verification clock, with zero
//! leeway, and every structural or signature failure collapses into
//! [`AuthError::InvalidToken`] so callers cannot distinguish tampering from
//! a wrong secret. Expired-but-authentic tokens report
//! [`AuthError::TokenExpired`] for precise server-side logging; the wire
//! collapses that distinction too (see [`AuthError::wire_reason`]).

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use lectern_config::TokenConfig;

use super::errors::AuthError;
use super::permission::Role;
use super::AUTH_TARGET;

/// Verified identity data extracted from a token.
///
/// Attached to a connection at handshake time and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Subject identifier; absent for guest identities.
    pub subject: Option<String>,
    /// Role established for the connection.
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    email: String,
    role: Role,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GuestClaims {
    role: Role,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    iat: u64,
    exp: u64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_secs: u64,
}

impl KeyPair {
    fn from_secret(secret: &str, expiry_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_secs,
        }
    }
}

/// Issues and verifies the three token kinds.
///
/// Construction captures the signing configuration once; the authority
/// itself performs no I/O and holds no mutable state.
pub struct TokenAuthority {
    access: KeyPair,
    guest: KeyPair,
    refresh: KeyPair,
}

impl TokenAuthority {
    /// Builds an authority from the resolved token configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret, config.access_expiry_secs),
            guest: KeyPair::from_secret(&config.guest_secret, config.guest_expiry_secs),
            refresh: KeyPair::from_secret(&config.refresh_secret, config.refresh_expiry_secs),
        }
    }

    /// Issues an access token for a registered account.
    pub fn issue_access(
        &self,
        subject: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        sign(
            &self.access,
            &AccessClaims {
                sub: subject.into(),
                email: email.into(),
                role,
                iat: now,
                exp: now + self.access.expiry_secs,
            },
        )
    }

    /// Issues an anonymous guest token.
    pub fn issue_guest(&self) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        sign(
            &self.guest,
            &GuestClaims {
                role: Role::Guest,
                iat: now,
                exp: now + self.guest.expiry_secs,
            },
        )
    }

    /// Issues a refresh token for a registered account.
    pub fn issue_refresh(&self, subject: impl Into<String>) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        sign(
            &self.refresh,
            &RefreshClaims {
                sub: subject.into(),
                iat: now,
                exp: now + self.refresh.expiry_secs,
            },
        )
    }

    /// Verifies an access token and extracts its identity claim.
    pub fn verify_access(&self, token: &str) -> Result<Claim, AuthError> {
        let claims: AccessClaims = verify(&self.access, token)?;
        Ok(Claim {
            subject: Some(claims.sub),
            role: claims.role,
        })
    }

    /// Verifies a guest token. The resulting claim always carries the
    /// guest role and no subject, regardless of the token body.
    pub fn verify_guest(&self, token: &str) -> Result<Claim, AuthError> {
        let _claims: GuestClaims = verify(&self.guest, token)?;
        Ok(Claim {
            subject: None,
            role: Role::Guest,
        })
    }

    /// Verifies a refresh token and yields the subject it was issued to.
    pub fn verify_refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims: RefreshClaims = verify(&self.refresh, token)?;
        Ok(claims.sub)
    }
}

fn sign<T: Serialize>(keys: &KeyPair, claims: &T) -> Result<String, AuthError> {
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
        .map_err(|error| AuthError::Issue(error.to_string()))
}

fn verify<T: DeserializeOwned>(keys: &KeyPair, token: &str) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    match decode::<T>(token, &keys.decoding, &validation) {
        Ok(data) => Ok(data.claims),
        Err(error) if matches!(error.kind(), ErrorKind::ExpiredSignature) => {
            debug!(target: AUTH_TARGET, "token expired");
            Err(AuthError::TokenExpired)
        }
        Err(error) => {
            debug!(target: AUTH_TARGET, %error, "token verification failed");
            Err(AuthError::InvalidToken)
        }
    }
}
