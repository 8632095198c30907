//! Per-message routing: validate, resolve, authorize, execute.
//!
//! Every inbound request passes through the same pipeline and ends in
//! exactly one response envelope, never zero and never two. Routing failures
//! and handler failures become error envelopes; nothing that happens here
//! terminates the connection.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error};

use lectern_wire::{SocketRequest, SocketResponse, codes};

use crate::auth::{Claim, check_any};

use super::DISPATCH_TARGET;
use super::context::RequestContext;
use super::registry::{Registration, ResolveError, ServiceRegistry};

/// Error text paired with the `forbidden` code, mirroring the credential
/// layer's message catalogue.
const FORBIDDEN_TEXT: &str = "Forbidden: Insufficient permissions";

/// Routes requests through the shared service registry.
pub struct RequestRouter {
    registry: Arc<ServiceRegistry>,
}

impl RequestRouter {
    /// Wraps the process-wide registry.
    #[must_use]
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatches one request on behalf of the given connection identity.
    ///
    /// The identity was established once at handshake time; it arrives here
    /// as an explicit parameter rather than ambient state.
    pub fn route(&self, request: SocketRequest, identity: &Claim) -> SocketResponse {
        let shape_errors = request.shape_errors();
        if !shape_errors.is_empty() {
            debug!(target: DISPATCH_TARGET, "rejecting malformed request");
            return SocketResponse::validation_error(shape_errors, request);
        }

        debug!(
            target: DISPATCH_TARGET,
            service = %request.service,
            action = %request.action,
            role = %identity.role,
            "routing request"
        );

        let registration = match self.registry.resolve(&request.service, &request.action) {
            Ok(registration) => registration,
            Err(resolve_error) => {
                let code = match resolve_error {
                    ResolveError::ServiceNotFound { .. } => codes::SERVICE_NOT_FOUND,
                    ResolveError::ActionNotFound { .. } => codes::ACTION_NOT_FOUND,
                };
                return SocketResponse::error(code, vec![resolve_error.to_string()], request);
            }
        };

        if !check_any(identity.role, registration.requirements()) {
            debug!(
                target: DISPATCH_TARGET,
                service = %request.service,
                action = %request.action,
                role = %identity.role,
                "permission denied"
            );
            return SocketResponse::error(
                codes::FORBIDDEN,
                vec![FORBIDDEN_TEXT.to_owned()],
                request,
            );
        }

        execute(registration, identity, request)
    }
}

/// Invokes the handler, converting a contract violation (panic) into an
/// `internal_server_error` envelope. Full detail is logged server-side;
/// the wire carries the panic message text only.
fn execute(
    registration: &Registration,
    identity: &Claim,
    request: SocketRequest,
) -> SocketResponse {
    let ctx = RequestContext::new(identity.clone(), request.clone());
    let handler = Arc::clone(registration.handler());

    let outcome = catch_unwind(AssertUnwindSafe(|| handler.call(&ctx.request.payload, &ctx)));
    match outcome {
        Ok(response) => response,
        Err(panic_payload) => {
            let message = panic_message(panic_payload.as_ref());
            error!(
                target: DISPATCH_TARGET,
                service = %request.service,
                action = %request.action,
                message = %message,
                "handler panicked"
            );
            SocketResponse::error(codes::INTERNAL_SERVER_ERROR, vec![message], request)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "Unknown error".to_owned()
    }
}
