//! Wire types shared between the Lectern daemon and its clients.
//!
//! Every message exchanged over a Lectern connection is a single JSONL line.
//! Clients send a [`ClientFrame`] (a [`SocketRequest`] plus an optional
//! acknowledgment id); the daemon answers with [`ServerFrame`] lines. The
//! response envelope has a fixed shape: it always echoes the originating
//! request so clients can correlate responses without explicit ids.

mod frame;
mod request;
mod response;

pub use frame::{ClientFrame, RESPONSE_EVENT, ServerFrame};
pub use request::SocketRequest;
pub use response::{SocketResponse, codes};
