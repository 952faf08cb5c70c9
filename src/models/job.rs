//! Job postings shown on the career page.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::AppResult;

/// An open position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub department: String,
    pub location: String,
    #[serde(default)]
    pub employment_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Job posting form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub is_active: bool,
}

impl Default for NewJob {
    fn default() -> Self {
        Self {
            title: String::new(),
            department: String::new(),
            location: String::new(),
            employment_type: "Full-time".to_string(),
            description: String::new(),
            requirements: Vec::new(),
            is_active: true,
        }
    }
}

impl NewRecord for NewJob {
    fn validate(&self) -> AppResult<()> {
        require("Title", &self.title)?;
        require("Department", &self.department)?;
        require("Location", &self.location)
    }
}

impl Record for Job {
    const COLLECTION: &'static str = "jobs";
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "department", "location"];
    type New = NewJob;

    fn id(&self) -> &str {
        &self.id
    }
}
