//! Client for the hosted send-campaign function.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::store::error_from_body;

/// Payload the function expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendCampaignRequest {
    pub batch_id: String,
    pub template_id: String,
}

#[derive(Debug, Deserialize)]
struct SendCampaignResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Hands a batch to the email delivery function. Success means queued,
/// not delivered.
#[async_trait]
pub trait CampaignSender: Send + Sync {
    async fn send(&self, request: &SendCampaignRequest) -> AppResult<()>;
}

pub struct HttpCampaignSender {
    client: Client,
    url: String,
}

impl HttpCampaignSender {
    pub fn new(base_url: &str, api_key: Option<&str>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| AppError::Validation("API key contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, bearer);
        }

        Ok(Self {
            client: Client::builder().default_headers(headers).build()?,
            url: format!(
                "{}/functions/v1/send-campaign",
                base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl CampaignSender for HttpCampaignSender {
    async fn send(&self, request: &SendCampaignRequest) -> AppResult<()> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }

        // The function may answer 200 with an error payload.
        if let Ok(SendCampaignResponse { error: Some(error) }) = serde_json::from_str(&body) {
            return Err(AppError::Store {
                status: status.as_u16(),
                message: error,
            });
        }

        tracing::info!("Campaign for batch {} queued", request.batch_id);
        Ok(())
    }
}
