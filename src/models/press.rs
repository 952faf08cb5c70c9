//! Press coverage articles.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPressArticle {
    pub title: String,
    pub source: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl NewRecord for NewPressArticle {
    fn validate(&self) -> AppResult<()> {
        require("Title", &self.title)?;
        require("URL", &self.url)
    }
}

impl Record for PressArticle {
    const COLLECTION: &'static str = "press_articles";
    const ORDER_BY: &'static str = "published_at";
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "source"];
    type New = NewPressArticle;

    fn id(&self) -> &str {
        &self.id
    }
}
