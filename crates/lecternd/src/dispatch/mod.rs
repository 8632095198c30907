//! Request dispatch: the service registry, the per-message router, and the
//! per-connection session loop.

mod connection;
mod context;
mod errors;
mod registry;
mod router;

pub use connection::{FrameWriter, MAX_LINE_BYTES, SessionHandler};
pub use context::RequestContext;
pub use errors::SessionError;
pub use registry::{ActionHandler, Payload, RegistryBuilder, Registration, ResolveError, ServiceRegistry};
pub use router::RequestRouter;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
