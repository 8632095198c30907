//! Domain services exposed through the dispatch registry.
//!
//! Two services ship with the daemon: `courseService` (course catalogue
//! management) and `userService` (account directory). Both are backed by
//! the in-memory [`store::Stores`]; a conventional database stands in for
//! those stores in the full system. Handlers convert their own domain
//! failures into error envelopes and leave transport concerns to the
//! session loop.

mod course;
mod directory;
pub mod pagination;
pub mod store;

use std::sync::Arc;

use crate::auth::Requirement;
use crate::dispatch::{Payload, RequestContext, ServiceRegistry};

pub use store::Stores;

/// Composes the process-wide service registry over the shared stores.
///
/// Permission bindings mirror the HTTP gates of the surrounding system:
/// course listing is public, course mutation is admin-only, the user
/// directory is admin-only except `getById`, which any registered user may
/// call.
#[must_use]
pub fn build_registry(stores: &Arc<Stores>) -> ServiceRegistry {
    let builder = ServiceRegistry::builder();

    let s = Arc::clone(stores);
    let builder = builder.register(
        "courseService",
        "list",
        &[Requirement::Public],
        move |payload: &Payload, ctx: &RequestContext| course::list(&s, payload, ctx),
    );
    let s = Arc::clone(stores);
    let builder = builder.register(
        "courseService",
        "create",
        &[Requirement::Admin],
        move |payload: &Payload, ctx: &RequestContext| course::create(&s, payload, ctx),
    );
    let s = Arc::clone(stores);
    let builder = builder.register(
        "courseService",
        "update",
        &[Requirement::Admin],
        move |payload: &Payload, ctx: &RequestContext| course::update(&s, payload, ctx),
    );
    let s = Arc::clone(stores);
    let builder = builder.register(
        "courseService",
        "delete",
        &[Requirement::Admin],
        move |payload: &Payload, ctx: &RequestContext| course::delete(&s, payload, ctx),
    );

    let s = Arc::clone(stores);
    let builder = builder.register(
        "userService",
        "list",
        &[Requirement::Admin],
        move |payload: &Payload, ctx: &RequestContext| directory::list(&s, payload, ctx),
    );
    let s = Arc::clone(stores);
    let builder = builder.register(
        "userService",
        "update",
        &[Requirement::Admin],
        move |payload: &Payload, ctx: &RequestContext| directory::update(&s, payload, ctx),
    );
    let s = Arc::clone(stores);
    let builder = builder.register(
        "userService",
        "getById",
        &[Requirement::User],
        move |payload: &Payload, ctx: &RequestContext| directory::get_by_id(&s, payload, ctx),
    );

    builder.build()
}
