//! HTTP record store speaking the PostgREST dialect of the hosted backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::{Page, Query, RecordStore, Row};
use crate::errors::{AppError, AppResult};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const COUNT_EXACT: &str = "count=exact";

/// Record store reached over HTTP with a bearer credential.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    /// `api_key` is sent as both `apikey` and `Authorization: Bearer`.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| AppError::Validation("API key contains invalid characters".into()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| AppError::Validation("API key contains invalid characters".into()))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder().default_headers(headers).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn select(&self, collection: &str, query: &Query) -> AppResult<RequestBuilder> {
        query.validate()?;
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.to_params());

        let mut request = self.client.get(self.table_url(collection)).query(&params);
        if query.count {
            request = request.header(PREFER, COUNT_EXACT);
        }
        Ok(request)
    }

    fn by_id(&self, builder: RequestBuilder, id: &str) -> RequestBuilder {
        builder
            .query(&[("id", format!("eq.{}", id))])
            .header(PREFER, RETURN_REPRESENTATION)
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch_one(&self, collection: &str, query: &Query) -> AppResult<Option<Row>> {
        let mut single = query.clone();
        single.range = Some((0, 0));
        single.count = false;

        let response = check(self.select(collection, &single)?.send().await?).await?;
        let rows: Vec<Row> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_many(&self, collection: &str, query: &Query) -> AppResult<Page<Row>> {
        let response = check(self.select(collection, query)?.send().await?).await?;

        let total = if query.count {
            response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range)
        } else {
            None
        };

        let rows: Vec<Row> = response.json().await?;
        Ok(Page { rows, total })
    }

    async fn insert(&self, collection: &str, attributes: Row) -> AppResult<Row> {
        let response = self
            .client
            .post(self.table_url(collection))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&attributes)
            .send()
            .await?;

        let rows: Vec<Row> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| AppError::Store {
            status: 0,
            message: format!("Insert into {} returned no rows", collection),
        })
    }

    async fn update(&self, collection: &str, id: &str, patch: Row) -> AppResult<Row> {
        let request = self.by_id(self.client.patch(self.table_url(collection)), id);
        let response = request.json(&patch).send().await?;

        let rows: Vec<Row> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} record {} not found", collection, id)))
    }

    async fn remove(&self, collection: &str, id: &str) -> AppResult<()> {
        let request = self.by_id(self.client.delete(self.table_url(collection)), id);
        let response = check(request.send().await?).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let rows: Vec<Row> = serde_json::from_str(&body)?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!(
                "{} record {} not found",
                collection, id
            )));
        }
        Ok(())
    }
}

/// Pass successful responses through; turn anything else into an error
/// carrying the server's message verbatim.
pub(crate) async fn check(response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

pub(crate) fn error_from_body(status: StatusCode, body: &str) -> AppError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
        _ => AppError::Store {
            status: status.as_u16(),
            message,
        },
    }
}

/// Accepts `{error: {message}}`, `{error: "..."}`, `{message}` or plain text.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json
            .pointer("/error/message")
            .or_else(|| json.get("error"))
            .or_else(|| json.get("message"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// `0-9/45` → 45, `*/0` → 0, `0-9/*` → unknown.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/').and_then(|(_, total)| total.parse().ok())
}
