//! Typed records for every collection the admin portal edits.
//!
//! Each record type names its collection, default ordering and searchable
//! columns, so panels stay generic while fields stay typed.

mod admin_user;
mod application;
mod content;
mod email_batch;
mod faq;
mod job;
mod press;
mod social_link;

pub use admin_user::*;
pub use application::*;
pub use content::*;
pub use email_batch::*;
pub use faq::*;
pub use job::*;
pub use press::*;
pub use social_link::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// A row of a named collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table) name.
    const COLLECTION: &'static str;
    /// Default sort column.
    const ORDER_BY: &'static str = "created_at";
    /// Default sort direction.
    const ASCENDING: bool = false;
    /// Text columns matched by free-text search.
    const SEARCH_FIELDS: &'static [&'static str] = &[];
    /// Removal flips `is_deleted` instead of deleting the row.
    const SOFT_DELETE: bool = false;

    /// Attributes accepted by `insert`.
    type New: NewRecord;

    fn id(&self) -> &str;

    /// Explicit position for manually ordered collections.
    fn order_index(&self) -> Option<i64> {
        None
    }
}

/// Insert payload for a record type.
pub trait NewRecord: Serialize + Default + Clone + Send + Sync {
    /// Required-field checks run before any store call.
    fn validate(&self) -> AppResult<()> {
        Ok(())
    }

    /// Called with `max(existing) + 1` before insert on ordered collections.
    fn set_order_index(&mut self, _index: i64) {}
}

/// Reject blank required fields.
pub(crate) fn require(label: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// A logical group of fields edited and saved together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: &'static [&'static str],
}

/// Singleton records edited section by section.
pub trait Sectioned: Record {
    const SECTIONS: &'static [Section];

    /// Row inserted when the collection is still empty.
    fn default_row() -> Option<Self::New> {
        None
    }

    fn section(key: &str) -> Option<&'static Section> {
        Self::SECTIONS.iter().find(|s| s.key == key)
    }
}

/// Partial attribute map sent with an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// Pick exactly `fields` from a serialized record. Absent optional
    /// fields are sent as `null`.
    pub fn from_fields<T: Serialize>(record: &T, fields: &[&str]) -> AppResult<Self> {
        let object = to_object(record)?;
        let map = fields
            .iter()
            .map(|f| {
                (
                    f.to_string(),
                    object.get(*f).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();
        Ok(Self(map))
    }

    /// Every editable field of `draft`: all attributes except `id` and
    /// `created_at`. Fields `original` had but the draft dropped are sent
    /// as `null` so clearing an optional field reaches the store.
    pub fn from_edit<T: Serialize>(original: &T, draft: &T) -> AppResult<Self> {
        let mut object = to_object(draft)?;
        for key in to_object(original)?.into_iter().map(|(key, _)| key) {
            object.entry(key).or_insert(Value::Null);
        }
        object.remove("id");
        object.remove("created_at");
        Ok(Self(object))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Serialize a value that must be a JSON object.
pub(crate) fn to_object<T: Serialize>(value: &T) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "Expected an attribute map, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_from_fields_picks_only_named_fields() {
        let about = AboutSection {
            id: "a1".to_string(),
            heading: "Who we are".to_string(),
            subheading: "Since 1998".to_string(),
            story: "Long story".to_string(),
            mission: "Build".to_string(),
            vision: "Grow".to_string(),
            image_url: None,
            created_at: None,
        };

        let patch = Patch::from_fields(&about, &["heading", "image_url"]).unwrap();
        let map = patch.into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["heading"], json!("Who we are"));
        assert_eq!(map["image_url"], Value::Null);
    }

    #[test]
    fn test_patch_from_edit_skips_identity() {
        let faq = Faq {
            id: "f1".to_string(),
            question: "Q".to_string(),
            answer: "A".to_string(),
            order_index: 3,
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
        };

        let patch = Patch::from_edit(&faq, &faq).unwrap();
        assert!(patch.get("id").is_none());
        assert!(patch.get("created_at").is_none());
        assert_eq!(patch.get("order_index"), Some(&json!(3)));
    }

    #[test]
    fn test_patch_from_edit_nulls_cleared_fields() {
        let original = PressArticle {
            id: "p1".to_string(),
            title: "Launch".to_string(),
            source: "Wire".to_string(),
            url: "https://news.example.com/launch".to_string(),
            summary: Some("old summary".to_string()),
            published_at: None,
            created_at: None,
        };
        let mut draft = original.clone();
        draft.summary = None;

        let patch = Patch::from_edit(&original, &draft).unwrap();
        assert_eq!(patch.get("summary"), Some(&Value::Null));
        assert_eq!(patch.get("title"), Some(&json!("Launch")));
    }

    #[test]
    fn test_require_rejects_whitespace() {
        assert!(require("Title", "Engineer").is_ok());
        let err = require("Title", "   ").unwrap_err();
        assert_eq!(err, AppError::Validation("Title is required".to_string()));
    }
}
