use std::env;

use camino::Utf8PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9747;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Computes the default socket endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("lectern");
    if apply_namespace {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join("lecternd.sock"))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
