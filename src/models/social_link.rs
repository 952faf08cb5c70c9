//! Social media links in the site footer.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialLink {
    pub id: String,
    pub platform: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewSocialLink {
    pub platform: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order_index: i64,
}

impl NewRecord for NewSocialLink {
    fn validate(&self) -> AppResult<()> {
        require("Platform", &self.platform)?;
        require("URL", &self.url)?;
        let url = self.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::Validation(
                "URL must start with http:// or https://".to_string(),
            ));
        }
        Ok(())
    }

    fn set_order_index(&mut self, index: i64) {
        self.order_index = index;
    }
}

impl Record for SocialLink {
    const COLLECTION: &'static str = "social_links";
    const ORDER_BY: &'static str = "order_index";
    const ASCENDING: bool = true;
    const SEARCH_FIELDS: &'static [&'static str] = &["platform"];
    type New = NewSocialLink;

    fn id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> Option<i64> {
        Some(self.order_index)
    }
}
