//! Email campaign batches. Removal is a soft delete.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::AppResult;

/// Delivery state reported by the campaign function.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Draft,
    Queued,
    Sending,
    Sent,
    Failed,
}

impl BatchStatus {
    /// Whether delivery has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Sent | BatchStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailBatch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewEmailBatch {
    pub name: String,
    pub template_id: String,
    pub recipients: Vec<String>,
    pub status: BatchStatus,
    pub is_deleted: bool,
}

impl NewRecord for NewEmailBatch {
    fn validate(&self) -> AppResult<()> {
        require("Batch name", &self.name)
    }
}

impl Record for EmailBatch {
    const COLLECTION: &'static str = "email_batches";
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];
    const SOFT_DELETE: bool = true;
    type New = NewEmailBatch;

    fn id(&self) -> &str {
        &self.id
    }
}
