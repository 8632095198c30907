//! Socket listener for daemon transport endpoints.
//!
//! The transport module binds to the configured socket endpoint and accepts
//! connections in a background thread. Each accepted connection gets its own
//! handler thread; connections are independent and never share session
//! state.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream};
pub use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
