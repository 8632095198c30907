//! In-memory data stores backing the domain services.
//!
//! The stores are deliberately simple: `RwLock`-guarded tables with
//! sequential string ids, shared across connections via `Arc`. A
//! conventional database replaces them in the full system; the service
//! handlers only depend on the operations defined here.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::auth::Role;

use super::pagination::PageParams;

/// A course catalogue entry.
#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: String,
    pub course_name: String,
    pub description: String,
    pub active: bool,
    pub fees: u64,
    pub order_index: u32,
    /// RFC 3339 deletion timestamp; `None` while the course is live.
    pub deleted_at: Option<String>,
}

/// Fields accepted when creating a course. `course_name` is mandatory;
/// everything else defaults.
#[derive(Debug, Deserialize)]
pub struct NewCourse {
    pub course_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub fees: u64,
    #[serde(default)]
    pub order_index: u32,
}

fn default_active() -> bool {
    true
}

/// Partial update for a course. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct CourseChanges {
    pub course_name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub fees: Option<u64>,
    pub order_index: Option<u32>,
}

/// A directory account.
///
/// The password hash never serializes; every outbound representation of a
/// user is stripped by construction.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

/// Partial update for a user. The password is not representable here, so
/// it can never be applied from a request payload.
#[derive(Debug, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default)]
struct CourseTable {
    rows: Vec<Course>,
    next_id: u64,
}

#[derive(Debug, Default)]
struct UserTable {
    rows: Vec<UserRecord>,
}

/// The shared store bundle handed to every service handler.
#[derive(Debug, Default)]
pub struct Stores {
    courses: RwLock<CourseTable>,
    users: RwLock<UserTable>,
}

impl Stores {
    /// An empty store bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store bundle pre-populated with a small fixture set.
    #[must_use]
    pub fn seeded() -> Self {
        let stores = Self::new();
        {
            // Poison is unreachable here; the bundle has not been shared yet.
            let mut users = stores
                .users
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            users.rows = vec![
                UserRecord {
                    id: "u1".to_owned(),
                    name: "Meera Pillai".to_owned(),
                    email: "meera@example.com".to_owned(),
                    password: "$argon2id$stub-hash-1".to_owned(),
                    role: Role::Admin,
                },
                UserRecord {
                    id: "u2".to_owned(),
                    name: "Arjun Nair".to_owned(),
                    email: "arjun@example.com".to_owned(),
                    password: "$argon2id$stub-hash-2".to_owned(),
                    role: Role::User,
                },
                UserRecord {
                    id: "u3".to_owned(),
                    name: "Sara Thomas".to_owned(),
                    email: "sara@example.com".to_owned(),
                    password: "$argon2id$stub-hash-3".to_owned(),
                    role: Role::User,
                },
            ];
        }
        stores.insert_course(NewCourse {
            course_name: "Computer Science".to_owned(),
            description: "Algorithms and systems".to_owned(),
            active: true,
            fees: 52_000,
            order_index: 2,
        });
        stores.insert_course(NewCourse {
            course_name: "Mathematics".to_owned(),
            description: "Pure and applied mathematics".to_owned(),
            active: true,
            fees: 41_000,
            order_index: 1,
        });
        stores.insert_course(NewCourse {
            course_name: "Economics".to_owned(),
            description: "Micro and macro economics".to_owned(),
            active: true,
            fees: 38_000,
            order_index: 3,
        });
        stores
    }

    /// Lists live courses matching `params.query` over name and
    /// description, ordered by `order_index`, sliced to the requested page.
    /// Returns the page and the total match count.
    #[must_use]
    pub fn list_courses(&self, params: &PageParams) -> (Vec<Course>, usize) {
        let table = self.courses.read().unwrap_or_else(PoisonError::into_inner);
        let needle = params.query.to_lowercase();
        let mut matches: Vec<Course> = table
            .rows
            .iter()
            .filter(|course| course.deleted_at.is_none())
            .filter(|course| {
                needle.is_empty()
                    || course.course_name.to_lowercase().contains(&needle)
                    || course.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|course| course.order_index);
        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(params.skip())
            .take(params.limit)
            .collect();
        (page, total)
    }

    /// Inserts a new course, assigning the next sequential id.
    pub fn insert_course(&self, fields: NewCourse) -> Course {
        let mut table = self.courses.write().unwrap_or_else(PoisonError::into_inner);
        table.next_id += 1;
        let course = Course {
            id: format!("c{}", table.next_id),
            course_name: fields.course_name,
            description: fields.description,
            active: fields.active,
            fees: fields.fees,
            order_index: fields.order_index,
            deleted_at: None,
        };
        table.rows.push(course.clone());
        course
    }

    /// Applies a partial update to a live course. Returns the updated row,
    /// or `None` when no live course has this id.
    pub fn update_course(&self, id: &str, changes: CourseChanges) -> Option<Course> {
        let mut table = self.courses.write().unwrap_or_else(PoisonError::into_inner);
        let course = table
            .rows
            .iter_mut()
            .find(|course| course.id == id && course.deleted_at.is_none())?;
        if let Some(course_name) = changes.course_name {
            course.course_name = course_name;
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(active) = changes.active {
            course.active = active;
        }
        if let Some(fees) = changes.fees {
            course.fees = fees;
        }
        if let Some(order_index) = changes.order_index {
            course.order_index = order_index;
        }
        Some(course.clone())
    }

    /// Soft-deletes a live course by stamping `deleted_at`. Returns the
    /// deleted row, or `None` when no live course has this id.
    pub fn soft_delete_course(&self, id: &str) -> Option<Course> {
        let mut table = self.courses.write().unwrap_or_else(PoisonError::into_inner);
        let course = table
            .rows
            .iter_mut()
            .find(|course| course.id == id && course.deleted_at.is_none())?;
        course.deleted_at = Some(now_rfc3339());
        Some(course.clone())
    }

    /// Lists users matching `params.query` over name and email, sliced to
    /// the requested page. Returns the page and the total match count.
    #[must_use]
    pub fn list_users(&self, params: &PageParams) -> (Vec<UserRecord>, usize) {
        let table = self.users.read().unwrap_or_else(PoisonError::into_inner);
        let needle = params.query.to_lowercase();
        let matches: Vec<UserRecord> = table
            .rows
            .iter()
            .filter(|user| {
                needle.is_empty()
                    || user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(params.skip())
            .take(params.limit)
            .collect();
        (page, total)
    }

    /// Applies a partial update to a user. Returns the updated row, or
    /// `None` when no user has this id.
    pub fn update_user(&self, id: &str, changes: UserChanges) -> Option<UserRecord> {
        let mut table = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let user = table.rows.iter_mut().find(|user| user.id == id)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        Some(user.clone())
    }

    /// Looks up a user by id.
    #[must_use]
    pub fn user_by_id(&self, id: &str) -> Option<UserRecord> {
        let table = self.users.read().unwrap_or_else(PoisonError::into_inner);
        table.rows.iter().find(|user| user.id == id).cloned()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
