//! Shared pagination plumbing for list actions.

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::Payload;

const DEFAULT_LIMIT: usize = 10;
const DEFAULT_PAGE: usize = 1;

/// Parsed pagination parameters of a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    pub query: String,
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    /// Extracts `query`, `page`, and `limit` from the payload. Numbers may
    /// arrive as JSON numbers or numeric strings; anything else falls back
    /// to the defaults (`page=1`, `limit=10`). Zero is treated as absent
    /// because a zero page or limit has no meaningful slice.
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            query: payload
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            page: positive_param(payload, "page", DEFAULT_PAGE),
            limit: positive_param(payload, "limit", DEFAULT_LIMIT),
        }
    }

    /// Index of the first record on the requested page. Both factors come
    /// from the untrusted payload, so the arithmetic saturates instead of
    /// overflowing; a saturated offset lands past the data and yields an
    /// empty page.
    pub fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

fn positive_param(payload: &Payload, key: &str, default: usize) -> usize {
    let parsed = match payload.get(key) {
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|value| usize::try_from(value).ok()),
        Some(Value::String(text)) => text.trim().parse::<usize>().ok(),
        _ => None,
    };
    match parsed {
        Some(value) if value > 0 => value,
        _ => default,
    }
}

/// Envelope data for paginated list responses.
#[derive(Debug, Serialize)]
pub struct ListData<T: Serialize> {
    pub items: Vec<T>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "paginationData")]
    pub pagination_data: PaginationData,
}

#[derive(Debug, Serialize)]
pub struct PaginationData {
    pub total_records: usize,
    pub record_limit: usize,
    pub current_page: usize,
}

impl<T: Serialize> ListData<T> {
    /// Wraps one page of items with its pagination metadata.
    pub fn new(items: Vec<T>, total: usize, params: &PageParams) -> Self {
        Self {
            items,
            total_count: total,
            pagination_data: PaginationData {
                total_records: total,
                record_limit: params.limit,
                current_page: params.page,
            },
        }
    }
}
