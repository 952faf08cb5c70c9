//! Staff accounts allowed into the admin portal.

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: String,
    /// bcrypt hash, never the plain password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_role() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAdminUser {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub password_hash: String,
}

impl Default for NewAdminUser {
    fn default() -> Self {
        Self {
            email: String::new(),
            full_name: String::new(),
            role: default_role(),
            password_hash: String::new(),
        }
    }
}

impl NewRecord for NewAdminUser {
    fn validate(&self) -> AppResult<()> {
        require("Email", &self.email)?;
        require("Password hash", &self.password_hash)
    }
}

impl Record for AdminUser {
    const COLLECTION: &'static str = "admin_users";
    const ASCENDING: bool = true;
    type New = NewAdminUser;

    fn id(&self) -> &str {
        &self.id
    }
}
