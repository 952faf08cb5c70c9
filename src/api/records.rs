//! Record collection endpoints.

use axum::{
    extract::{Path, Query as QueryParams, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::prefers;
use crate::errors::{AppError, AppResult};
use crate::store::{check_collection, Query, RecordStore, Row};
use crate::AppState;

type Params = Vec<(String, String)>;

/// GET /rest/v1/:collection - Query a collection.
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    QueryParams(params): QueryParams<Params>,
    headers: HeaderMap,
) -> AppResult<Response> {
    check_collection(&collection)?;

    let mut query = Query::from_params(&params)?;
    query.count = prefers(&headers, "count=exact");

    let page = state.repo.fetch_many(&collection, &query).await?;
    let mut response = Json(&page.rows).into_response();

    if let Some(total) = page.total {
        let start = query.range.map(|(start, _)| start).unwrap_or(0);
        let range = match page.rows.len() as u64 {
            0 => format!("*/{}", total),
            n => format!("{}-{}/{}", start, start + n - 1, total),
        };
        if let Ok(value) = HeaderValue::from_str(&range) {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
    }

    Ok(response)
}

/// POST /rest/v1/:collection - Insert one row or an array of rows.
pub async fn insert_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    check_collection(&collection)?;

    let rows = match body {
        Value::Object(row) => vec![row],
        Value::Array(items) if !items.is_empty() => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                _ => Err(AppError::BadRequest("Rows must be JSON objects".to_string())),
            })
            .collect::<AppResult<Vec<Row>>>()?,
        _ => {
            return Err(AppError::BadRequest(
                "Expected a JSON object or a non-empty array of objects".to_string(),
            ))
        }
    };

    let mut inserted = Vec::with_capacity(rows.len());
    for row in rows {
        inserted.push(state.repo.insert(&collection, row).await?);
    }

    tracing::debug!("Inserted {} row(s) into {}", inserted.len(), collection);
    Ok((StatusCode::CREATED, Json(inserted)).into_response())
}

/// PATCH /rest/v1/:collection?id=eq.:id - Merge attributes into one row.
pub async fn update_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    QueryParams(params): QueryParams<Params>,
    Json(patch): Json<Row>,
) -> AppResult<Json<Vec<Row>>> {
    check_collection(&collection)?;
    let id = target_id(&params)?;

    let row = state.repo.update(&collection, &id, patch).await?;
    Ok(Json(vec![row]))
}

/// DELETE /rest/v1/:collection?id=eq.:id - Delete one row.
pub async fn delete_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    QueryParams(params): QueryParams<Params>,
) -> AppResult<StatusCode> {
    check_collection(&collection)?;
    let id = target_id(&params)?;

    state.repo.remove(&collection, &id).await?;
    tracing::debug!("Deleted {} record {}", collection, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Writes address exactly one row through an `id=eq.` filter.
fn target_id(params: &Params) -> AppResult<String> {
    params
        .iter()
        .find(|(key, _)| key == "id")
        .and_then(|(_, value)| value.strip_prefix("eq."))
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::BadRequest("An id=eq.<id> filter is required".to_string()))
}
