//! Frequently asked questions, manually ordered.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub order_index: i64,
}

impl NewRecord for NewFaq {
    fn validate(&self) -> AppResult<()> {
        require("Question", &self.question)?;
        require("Answer", &self.answer)
    }

    fn set_order_index(&mut self, index: i64) {
        self.order_index = index;
    }
}

impl Record for Faq {
    const COLLECTION: &'static str = "faqs";
    const ORDER_BY: &'static str = "order_index";
    const ASCENDING: bool = true;
    const SEARCH_FIELDS: &'static [&'static str] = &["question", "answer"];
    type New = NewFaq;

    fn id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> Option<i64> {
        Some(self.order_index)
    }
}
