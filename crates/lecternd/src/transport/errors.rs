//! Failure modes of the client-facing listener socket.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding the daemon's client socket or supervising
/// its accept loop. All of these are fatal at startup; once the loop is
/// running only [`ListenerError::ThreadPanic`] can occur, at join time.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Another lecternd instance already answers on the socket path.
    #[cfg(unix)]
    #[error("existing unix socket {path} is already in use")]
    UnixInUse { path: String },
    /// The configured path exists but is a regular file or directory;
    /// it is never removed on the daemon's behalf.
    #[cfg(unix)]
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket { path: String },
    #[cfg(unix)]
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("listener thread panicked")]
    ThreadPanic,
}
