//! The service registry: a static two-level mapping from service and
//! action names to handlers.
//!
//! The registry is composed once at process start and shared by reference
//! across every connection; it is never mutated afterwards and no
//! per-connection copies exist. Lookup keeps the two failure modes
//! distinct, because clients branch on whether the service exists at all
//! or merely lacks the requested action.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use lectern_wire::SocketResponse;

use crate::auth::Requirement;

use super::context::RequestContext;

/// Free-form request payload forwarded to handlers.
pub type Payload = Map<String, Value>;

/// A registered function implementing one action of one service.
///
/// The contract is fixed: given the payload and the request context,
/// produce a response envelope. Handlers own their domain errors:
/// not-found and payload validation become error envelopes, never panics.
/// The router guards against contract violations only.
pub trait ActionHandler: Send + Sync {
    /// Executes the action.
    fn call(&self, payload: &Payload, ctx: &RequestContext) -> SocketResponse;
}

impl<F> ActionHandler for F
where
    F: Fn(&Payload, &RequestContext) -> SocketResponse + Send + Sync,
{
    fn call(&self, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
        self(payload, ctx)
    }
}

/// A handler together with the permission requirements bound to it at
/// registration time.
pub struct Registration {
    requirements: Vec<Requirement>,
    handler: Arc<dyn ActionHandler>,
}

impl Registration {
    /// Requirements any one of which grants access (OR semantics).
    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// The handler to invoke once access is granted.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn ActionHandler> {
        &self.handler
    }
}

// Derived Debug is blocked by the handler trait object; render the
// requirements and elide the rest.
impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// Errors surfaced by registry lookup.
///
/// The display texts are part of the wire contract: they appear verbatim
/// in error envelopes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The request named no registered service.
    #[error("Service '{service}' not found")]
    ServiceNotFound { service: String },
    /// The service exists but has no such action.
    #[error("Action '{action}' not found in service '{service}'")]
    ActionNotFound { service: String, action: String },
}

/// Builder used by the startup composition root.
#[derive(Default)]
pub struct RegistryBuilder {
    services: HashMap<String, HashMap<String, Registration>>,
}

impl RegistryBuilder {
    /// Registers a handler for `(service, action)` with its permission
    /// requirements. Registering the same pair twice replaces the earlier
    /// entry; composition happens once, so collisions indicate a wiring
    /// mistake surfaced by tests rather than a runtime condition.
    #[must_use]
    pub fn register(
        mut self,
        service: &str,
        action: &str,
        requirements: &[Requirement],
        handler: impl ActionHandler + 'static,
    ) -> Self {
        self.services.entry(service.to_owned()).or_default().insert(
            action.to_owned(),
            Registration {
                requirements: requirements.to_vec(),
                handler: Arc::new(handler),
            },
        );
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            services: self.services,
        }
    }
}

/// The static two-level lookup table from `(service, action)` to handler.
pub struct ServiceRegistry {
    services: HashMap<String, HashMap<String, Registration>>,
}

impl ServiceRegistry {
    /// Starts composing a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolves `(service, action)` to its registration.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ServiceNotFound`] or
    /// [`ResolveError::ActionNotFound`]; the distinction is preserved for
    /// observability and client-side error messaging.
    pub fn resolve(&self, service: &str, action: &str) -> Result<&Registration, ResolveError> {
        let actions = self
            .services
            .get(service)
            .ok_or_else(|| ResolveError::ServiceNotFound {
                service: service.to_owned(),
            })?;
        actions.get(action).ok_or_else(|| ResolveError::ActionNotFound {
            service: service.to_owned(),
            action: action.to_owned(),
        })
    }

    /// Whether a service of this name is registered.
    #[must_use]
    pub fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }
}

#[cfg(test)]
mod tests {
    use lectern_wire::SocketRequest;
    use serde_json::json;

    use crate::auth::{Claim, Role};

    use super::*;

    fn noop_handler(_payload: &Payload, ctx: &RequestContext) -> SocketResponse {
        SocketResponse::success("ok", json!(null), ctx.request.clone())
    }

    fn registry() -> ServiceRegistry {
        ServiceRegistry::builder()
            .register("userService", "getById", &[Requirement::User], noop_handler)
            .build()
    }

    fn context() -> RequestContext {
        RequestContext::new(
            Claim {
                subject: Some("u1".to_owned()),
                role: Role::User,
            },
            SocketRequest::new("userService", "getById"),
        )
    }

    #[test]
    fn resolves_registered_pairs() {
        let registry = registry();
        let registration = registry
            .resolve("userService", "getById")
            .expect("resolve registered pair");
        assert_eq!(registration.requirements(), &[Requirement::User]);

        let ctx = context();
        let response = registration.handler().call(&Payload::new(), &ctx);
        assert!(response.status);
    }

    #[test]
    fn unknown_service_is_distinct_from_unknown_action() {
        let registry = registry();
        assert_eq!(
            registry.resolve("billing", "list").unwrap_err(),
            ResolveError::ServiceNotFound {
                service: "billing".to_owned()
            }
        );
        assert_eq!(
            registry.resolve("userService", "erase").unwrap_err(),
            ResolveError::ActionNotFound {
                service: "userService".to_owned(),
                action: "erase".to_owned()
            }
        );
    }

    #[test]
    fn registration_debug_elides_the_handler() {
        let registry = registry();
        let registration = registry
            .resolve("userService", "getById")
            .expect("resolve registered pair");
        let rendered = format!("{registration:?}");
        assert!(rendered.contains("requirements"));
        assert!(rendered.contains(".."));
    }

    #[test]
    fn resolve_error_texts_match_wire_contract() {
        let registry = registry();
        let service_error = registry.resolve("billing", "list").unwrap_err();
        assert_eq!(service_error.to_string(), "Service 'billing' not found");
        let action_error = registry.resolve("userService", "erase").unwrap_err();
        assert_eq!(
            action_error.to_string(),
            "Action 'erase' not found in service 'userService'"
        );
    }
}
