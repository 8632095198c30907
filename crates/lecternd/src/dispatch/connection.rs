//! The per-connection session loop.
//!
//! Each accepted connection runs the same lifecycle on its own thread:
//! read the handshake line, answer with `welcome` or `rejected`, then
//! dispatch request lines until the peer disconnects. The identity
//! established by the handshake is fixed for the connection's lifetime;
//! there is no re-authentication mid-session.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use tracing::{debug, info, warn};

use lectern_wire::{ClientFrame, ServerFrame};

use crate::auth::{Authenticator, Claim, HandshakeRequest};
use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::errors::SessionError;
use super::router::RequestRouter;

/// Upper bound on a single JSONL line, handshake included.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Serializing writer for server frames.
///
/// Every frame is one JSON object, one line, flushed immediately so
/// clients never wait on a buffered response.
pub struct FrameWriter<W: Write> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    /// Wraps a writer half of a connection.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one frame as a JSONL line and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Serialize`] or [`SessionError::Io`].
    pub fn send(&mut self, frame: &ServerFrame) -> Result<(), SessionError> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Connection handler implementing the handshake-then-dispatch session.
pub struct SessionHandler {
    authenticator: Arc<Authenticator>,
    router: Arc<RequestRouter>,
}

impl SessionHandler {
    /// Pairs the handshake authenticator with the request router.
    #[must_use]
    pub fn new(authenticator: Arc<Authenticator>, router: Arc<RequestRouter>) -> Self {
        Self {
            authenticator,
            router,
        }
    }

    fn run_session(&self, stream: ConnectionStream) -> Result<(), SessionError> {
        let writer = stream.try_clone()?;
        let mut writer = FrameWriter::new(writer);
        let mut reader = BufReader::new(stream);

        let Some(identity) = self.handshake(&mut reader, &mut writer)? else {
            return Ok(());
        };

        info!(
            target: DISPATCH_TARGET,
            role = %identity.role,
            "session established"
        );

        loop {
            let Some(line) = read_bounded_line(&mut reader)? else {
                debug!(target: DISPATCH_TARGET, "peer disconnected");
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            let frame: ClientFrame = match serde_json::from_str(&line) {
                Ok(frame) => frame,
                Err(error) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        error = %error,
                        "unparseable request line"
                    );
                    writer.send(&ServerFrame::protocol_error(error.to_string()))?;
                    continue;
                }
            };

            let ack = frame.ack;
            let response = self.router.route(frame.request, &identity);
            let reply = match ack {
                Some(id) => ServerFrame::ack(id, response),
                None => ServerFrame::event(response),
            };
            writer.send(&reply)?;
        }
    }

    /// Runs the handshake phase. Returns the established identity, or
    /// `None` when the connection was rejected or closed before a
    /// handshake arrived.
    fn handshake(
        &self,
        reader: &mut impl BufRead,
        writer: &mut FrameWriter<impl Write>,
    ) -> Result<Option<Claim>, SessionError> {
        let Some(line) = read_bounded_line(reader)? else {
            return Ok(None);
        };

        let handshake: HandshakeRequest = match serde_json::from_str(&line) {
            Ok(handshake) => handshake,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    "unparseable handshake line"
                );
                writer.send(&ServerFrame::protocol_error(error.to_string()))?;
                return Ok(None);
            }
        };

        match self.authenticator.authenticate(&handshake) {
            Ok(claim) => {
                writer.send(&ServerFrame::welcome(
                    claim.role.to_string(),
                    claim.subject.clone(),
                ))?;
                Ok(Some(claim))
            }
            Err(error) => {
                writer.send(&ServerFrame::rejected(error.wire_reason()))?;
                Ok(None)
            }
        }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, stream: ConnectionStream) {
        if let Err(error) = self.run_session(stream) {
            match &error {
                SessionError::Io(io_error)
                    if matches!(
                        io_error.kind(),
                        std::io::ErrorKind::BrokenPipe
                            | std::io::ErrorKind::ConnectionReset
                            | std::io::ErrorKind::UnexpectedEof
                    ) =>
                {
                    debug!(
                        target: DISPATCH_TARGET,
                        error = %error,
                        "session ended by peer"
                    );
                }
                _ => {
                    warn!(
                        target: DISPATCH_TARGET,
                        error = %error,
                        "session terminated"
                    );
                }
            }
        }
    }
}

/// Reads one newline-terminated line, enforcing [`MAX_LINE_BYTES`].
///
/// Returns `None` at end of stream. A final line without a trailing
/// newline is still delivered.
///
/// # Errors
///
/// Returns [`SessionError::LineTooLarge`] when the line exceeds the limit;
/// the connection cannot be resynchronised afterwards and must close.
fn read_bounded_line(reader: &mut impl BufRead) -> Result<Option<String>, SessionError> {
    let mut buffer = Vec::new();
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            if buffer.is_empty() {
                return Ok(None);
            }
            return decode_line(buffer).map(Some);
        }

        if let Some(pos) = chunk.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(&chunk[..pos]);
            reader.consume(pos + 1);
            enforce_line_limit(buffer.len())?;
            return decode_line(buffer).map(Some);
        }

        buffer.extend_from_slice(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
        enforce_line_limit(buffer.len())?;
    }
}

fn enforce_line_limit(size: usize) -> Result<(), SessionError> {
    if size > MAX_LINE_BYTES {
        return Err(SessionError::LineTooLarge {
            size,
            limit: MAX_LINE_BYTES,
        });
    }
    Ok(())
}

fn decode_line(bytes: Vec<u8>) -> Result<String, SessionError> {
    String::from_utf8(bytes).map_err(|error| {
        SessionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error,
        ))
    })
}
