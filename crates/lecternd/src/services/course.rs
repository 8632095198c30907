//! Handlers for the `courseService` catalogue actions.

use serde_json::Value;

use lectern_wire::SocketResponse;

use crate::dispatch::{Payload, RequestContext};

use super::pagination::{ListData, PageParams};
use super::store::{CourseChanges, NewCourse, Stores};

pub(super) fn list(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let params = PageParams::from_payload(payload);
    let (items, total) = stores.list_courses(&params);
    match serde_json::to_value(ListData::new(items, total, &params)) {
        Ok(data) => SocketResponse::success("courses_found", data, ctx.request.clone()),
        Err(error) => SocketResponse::error(
            "failed_to_fetch_courses",
            vec![error.to_string()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn create(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let has_name = payload
        .get("course_name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        return SocketResponse::validation_error(
            vec!["Course name is required".to_owned()],
            ctx.request.clone(),
        );
    }

    let fields: NewCourse = match serde_json::from_value(Value::Object(payload.clone())) {
        Ok(fields) => fields,
        Err(error) => {
            return SocketResponse::error(
                "failed_to_create_course",
                vec![error.to_string()],
                ctx.request.clone(),
            );
        }
    };

    let course = stores.insert_course(fields);
    match serde_json::to_value(&course) {
        Ok(data) => {
            SocketResponse::success("course_created_successfully", data, ctx.request.clone())
        }
        Err(error) => SocketResponse::error(
            "failed_to_create_course",
            vec![error.to_string()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn update(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let Some(id) = required_id(payload) else {
        return SocketResponse::validation_error(
            vec!["Course ID is required".to_owned()],
            ctx.request.clone(),
        );
    };

    let changes: CourseChanges = match serde_json::from_value(Value::Object(payload.clone())) {
        Ok(changes) => changes,
        Err(error) => {
            return SocketResponse::error(
                "failed_to_update_course",
                vec![error.to_string()],
                ctx.request.clone(),
            );
        }
    };

    match stores.update_course(&id, changes) {
        Some(course) => match serde_json::to_value(&course) {
            Ok(data) => {
                SocketResponse::success("course_updated_successfully", data, ctx.request.clone())
            }
            Err(error) => SocketResponse::error(
                "failed_to_update_course",
                vec![error.to_string()],
                ctx.request.clone(),
            ),
        },
        None => SocketResponse::error(
            "course_not_found",
            vec!["Course not found".to_owned()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn delete(stores: &Stores, payload: &Payload, ctx: &RequestContext) -> SocketResponse {
    let Some(id) = required_id(payload) else {
        return SocketResponse::validation_error(
            vec!["Course ID is required".to_owned()],
            ctx.request.clone(),
        );
    };

    match stores.soft_delete_course(&id) {
        Some(course) => match serde_json::to_value(&course) {
            Ok(data) => {
                SocketResponse::success("course_deleted_successfully", data, ctx.request.clone())
            }
            Err(error) => SocketResponse::error(
                "failed_to_delete_course",
                vec![error.to_string()],
                ctx.request.clone(),
            ),
        },
        None => SocketResponse::error(
            "course_not_found",
            vec!["Course not found".to_owned()],
            ctx.request.clone(),
        ),
    }
}

pub(super) fn required_id(payload: &Payload) -> Option<String> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use lectern_wire::{SocketRequest, codes};

    use crate::auth::{Claim, Role};

    use super::*;

    fn ctx(action: &str) -> RequestContext {
        RequestContext::new(
            Claim {
                subject: Some("u1".to_owned()),
                role: Role::Admin,
            },
            SocketRequest::new("courseService", action),
        )
    }

    fn payload(value: serde_json::Value) -> Payload {
        let serde_json::Value::Object(map) = value else {
            panic!("payload must be an object");
        };
        map
    }

    #[test]
    fn list_returns_paginated_live_courses() {
        let stores = Stores::seeded();
        let response = list(&stores, &payload(json!({"limit": 2})), &ctx("list"));
        assert!(response.status);
        assert_eq!(response.msg, "courses_found");
        let data = response.data.expect("list data");
        assert_eq!(data["totalCount"], 3);
        assert_eq!(data["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(data["paginationData"]["record_limit"], 2);
    }

    #[test]
    fn list_twice_is_idempotent() {
        let stores = Stores::seeded();
        let first = list(&stores, &Payload::new(), &ctx("list"));
        let second = list(&stores, &Payload::new(), &ctx("list"));
        assert_eq!(first.data, second.data);
    }

    #[test]
    fn create_requires_a_course_name() {
        let stores = Stores::seeded();
        let response = create(&stores, &payload(json!({"fees": 10})), &ctx("create"));
        assert!(!response.status);
        assert_eq!(response.msg, codes::VALIDATION_FAILED);
        assert_eq!(response.errors, vec!["Course name is required"]);
    }

    #[test]
    fn create_assigns_the_next_id() {
        let stores = Stores::seeded();
        let response = create(
            &stores,
            &payload(json!({"course_name": "Physics", "order_index": 4})),
            &ctx("create"),
        );
        assert!(response.status);
        assert_eq!(response.msg, "course_created_successfully");
        let data = response.data.expect("course data");
        assert_eq!(data["id"], "c4");
        assert_eq!(data["active"], true);
    }

    #[test]
    fn update_without_id_fails_validation() {
        let stores = Stores::seeded();
        let response = update(&stores, &payload(json!({"fees": 99})), &ctx("update"));
        assert_eq!(response.msg, codes::VALIDATION_FAILED);
        assert_eq!(response.errors, vec!["Course ID is required"]);
    }

    #[test]
    fn update_of_missing_course_is_not_found() {
        let stores = Stores::seeded();
        let response = update(
            &stores,
            &payload(json!({"id": "c99", "fees": 1})),
            &ctx("update"),
        );
        assert!(!response.status);
        assert_eq!(response.msg, "course_not_found");
        assert_eq!(response.errors, vec!["Course not found"]);
    }

    #[test]
    fn delete_soft_deletes_and_reports_the_row() {
        let stores = Stores::seeded();
        let response = delete(&stores, &payload(json!({"id": "c2"})), &ctx("delete"));
        assert!(response.status);
        assert_eq!(response.msg, "course_deleted_successfully");
        let data = response.data.expect("course data");
        assert!(data["deleted_at"].is_string());

        let listing = list(&stores, &Payload::new(), &ctx("list"));
        assert_eq!(listing.data.expect("list data")["totalCount"], 2);
    }
}
