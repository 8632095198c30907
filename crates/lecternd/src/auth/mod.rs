//! Connection authentication: credential verification, the permission
//! model, and the per-connection handshake.
//!
//! Trust is established exactly once per connection. The handshake extracts
//! a bearer token from one of several transport locations, the verifier
//! checks it against the per-kind signing secret, and the resulting
//! [`Claim`] rides the connection for its whole lifetime; it is never
//! re-verified per message.

mod errors;
mod handshake;
mod permission;
mod token;

pub use errors::AuthError;
pub use handshake::{Authenticator, HandshakeRequest};
pub use permission::{Requirement, Role, check_any, has_permission};
pub use token::{Claim, TokenAuthority};

pub(crate) const AUTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::auth");
