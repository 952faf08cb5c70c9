//! REST API module.
//!
//! Serves the record-store contract the admin clients speak:
//! `/rest/v1/{collection}` with PostgREST-style query parameters.

mod records;

pub use records::*;

use axum::http::HeaderMap;

/// `Prefer` header tokens, e.g. `return=representation,count=exact`.
pub(crate) fn prefers(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all("prefer")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim() == token)
}
