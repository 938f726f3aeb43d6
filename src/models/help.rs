//! Peer-help board models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Course, Student, User};

/// Request lifecycle. Forward-only in intent (open -> in_progress ->
/// resolved); the backend does not enforce the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpStatus {
    Open,
    InProgress,
    Resolved,
}

impl HelpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelpStatus::Open => "open",
            HelpStatus::InProgress => "in_progress",
            HelpStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpPriority {
    Low,
    Medium,
    High,
}

/// Help request raised by a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub course_id: Option<String>,
    pub student_id: String,
    pub status: HelpStatus,
    pub priority: HelpPriority,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "students", default, skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
    #[serde(rename = "courses", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
}

/// Insert payload for a help request. The status is not caller-settable;
/// new requests always start out open.
#[derive(Debug, Clone, Serialize)]
pub struct NewHelpRequest {
    pub title: String,
    pub description: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub student_id: String,
    pub priority: HelpPriority,
}

/// Response to a help request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpResponse {
    pub id: String,
    pub help_request_id: String,
    pub user_id: String,
    pub content: String,
    pub is_solution: bool,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "users", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewHelpResponse {
    pub help_request_id: String,
    pub user_id: String,
    pub content: String,
    pub is_solution: bool,
}

impl NewHelpResponse {
    /// Plain response; the solution flag starts false.
    pub fn new(help_request_id: impl Into<String>, user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            help_request_id: help_request_id.into(),
            user_id: user_id.into(),
            content: content.into(),
            is_solution: false,
        }
    }

    pub fn solution(mut self) -> Self {
        self.is_solution = true;
        self
    }
}
