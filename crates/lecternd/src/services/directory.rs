//! Handlers for the `userService` directory actions.
//!
//! Every outbound user representation omits the password; the record type
//! enforces this at the serialization layer, so no handler needs to strip
//! it by hand.

use serde_json::Value;

use lectern_wire::SocketResponse;

use crate::dispatch::{Payload, RequestContext};

use super::course::required_id;
use super::pagination::{ListData, PageParams};
use super::store::{Stores, UserChanges};

pub(super) fn list(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let params = PageParams::from_payload(payload);
    let (items, total) = stores.list_users(&params);
    match serde_json::to_value(ListData::new(items, total, &params)) {
        Ok(data) => SocketResponse::success("users_found", data, ctx.request.clone()),
        Err(error) => SocketResponse::error(
            "failed_to_fetch_users",
            vec![error.to_string()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn update(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let Some(id) = required_id(payload) else {
        return SocketResponse::validation_error(
            vec!["User ID is required".to_owned()],
            ctx.request.clone(),
        );
    };

    let changes: UserChanges = match serde_json::from_value(Value::Object(payload.clone())) {
        Ok(changes) => changes,
        Err(error) => {
            return SocketResponse::error(
                "failed_to_update_user",
                vec![error.to_string()],
                ctx.request.clone(),
            );
        }
    };

    match stores.update_user(&id, changes) {
        Some(user) => match serde_json::to_value(&user) {
            Ok(data) => {
                SocketResponse::success("user_updated_successfully", data, ctx.request.clone())
            }
            Err(error) => SocketResponse::error(
                "failed_to_update_user",
                vec![error.to_string()],
                ctx.request.clone(),
            ),
        },
        None => SocketResponse::error(
            "user_not_found",
            vec!["User not found".to_owned()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn get_by_id(
    stores: &Stores,
    payload: &Payload,
    ctx: &RequestContext,
) -> SocketResponse {
    let Some(id) = required_id(payload) else {
        return SocketResponse::validation_error(
            vec!["User ID is required".to_owned()],
            ctx.request.clone(),
        );
    };

    match stores.user_by_id(&id) {
        Some(user) => match serde_json::to_value(&user) {
            Ok(data) => SocketResponse::success("user_found", data, ctx.request.clone()),
            Err(error) => SocketResponse::error(
                "failed_to_fetch_user",
                vec![error.to_string()],
                ctx.request.clone(),
            ),
        },
        None => SocketResponse::error(
            "user_not_found",
            vec!["User not found".to_owned()],
            ctx.request.clone(),
        ),
    }
}
