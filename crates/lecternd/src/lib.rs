//! The Lectern daemon: a persistent-connection message-dispatch service.
//!
//! Clients connect over a Unix or TCP socket configured via
//! [`lectern_config`] and speak a JSONL protocol. The first line of every
//! connection is an authentication handshake; the daemon verifies the
//! presented token once, attaches the resulting identity to the connection,
//! and then dispatches `{type, action, payload}` requests through an
//! immutable service registry built at startup. Every request is answered
//! with exactly one response envelope that echoes the originating request,
//! delivered either as an acknowledgment (when the client supplied an `ack`
//! id) or as a `response` event.
//!
//! Connections are mutually independent: each is served by its own thread,
//! shares only the registry and the data stores, and holds no lock across
//! handler execution.

pub mod auth;
mod bootstrap;
pub mod dispatch;
pub mod services;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, RunningListener, ServeError, ShutdownError,
    ShutdownSignal, SystemConfigLoader, SystemShutdownSignal, bootstrap_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
