//! Recruitment applications submitted through the public recruit page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{require, NewRecord, Record};
use crate::errors::{AppError, AppResult};

/// Review state of an application.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewing,
    Contacted,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::New,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Contacted,
        ApplicationStatus::Completed,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Contacted => "contacted",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown application status: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecruitmentApplication {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewRecruitmentApplication {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
}

impl NewRecord for NewRecruitmentApplication {
    fn validate(&self) -> AppResult<()> {
        require("Full name", &self.full_name)?;
        require("Email", &self.email)?;
        if !self.email.contains('@') {
            return Err(AppError::Validation("Email address is invalid".to_string()));
        }
        require("Position", &self.position)
    }
}

impl Record for RecruitmentApplication {
    const COLLECTION: &'static str = "recruitment_applications";
    const SEARCH_FIELDS: &'static [&'static str] = &["full_name", "email", "position"];
    type New = NewRecruitmentApplication;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>(), Ok(status));
        }
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(ApplicationStatus::Reviewing).unwrap();
        assert_eq!(json, serde_json::json!("reviewing"));
    }

    #[test]
    fn test_new_application_checks_email() {
        let app = NewRecruitmentApplication {
            full_name: "Ada Lovelace".to_string(),
            email: "ada.example.com".to_string(),
            position: "Analyst".to_string(),
            ..Default::default()
        };
        assert_eq!(
            app.validate(),
            Err(AppError::Validation("Email address is invalid".to_string()))
        );
    }
}
