//! Signing configuration for the three token kinds.
//!
//! Access, guest and refresh tokens each use an independent signing secret
//! and an independently configurable expiry, mirroring the credential
//! issuer this daemon shares clients with. The built-in secrets are
//! development placeholders; deployments override them through the
//! `LECTERN_JWT_*` environment variables.

use serde::{Deserialize, Serialize};

/// Default access-token lifetime: fifteen minutes.
pub const DEFAULT_ACCESS_EXPIRY_SECS: u64 = 15 * 60;
/// Default guest-token lifetime: one hour.
pub const DEFAULT_GUEST_EXPIRY_SECS: u64 = 60 * 60;
/// Default refresh-token lifetime: seven days.
pub const DEFAULT_REFRESH_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Secrets and expiries for token signing and verification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenConfig {
    /// HMAC secret for access tokens.
    pub access_secret: String,
    /// HMAC secret for guest tokens.
    pub guest_secret: String,
    /// HMAC secret for refresh tokens.
    pub refresh_secret: String,
    /// Access-token lifetime in seconds.
    pub access_expiry_secs: u64,
    /// Guest-token lifetime in seconds.
    pub guest_expiry_secs: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_expiry_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: "access-secret".to_owned(),
            guest_secret: "guest-secret".to_owned(),
            refresh_secret: "refresh-secret".to_owned(),
            access_expiry_secs: DEFAULT_ACCESS_EXPIRY_SECS,
            guest_expiry_secs: DEFAULT_GUEST_EXPIRY_SECS,
            refresh_expiry_secs: DEFAULT_REFRESH_EXPIRY_SECS,
        }
    }
}
