//! User, student and teacher models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Enrollment;

/// Account role, fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

/// User identity row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Profile details supplied at registration. Identity (id, email) comes
/// from the auth service, not the caller.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Partial profile update. `None` fields are left untouched; the role has
/// no edit path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none()
    }
}

/// Student extension row, one-to-one with `User` by shared id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub semester: i32,
    pub specialty: String,
    pub enrollment_year: i32,
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded identity row when the query projected it
    #[serde(rename = "users", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollments: Option<Vec<Enrollment>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStudent {
    pub id: String,
    pub student_id: String,
    pub semester: i32,
    pub specialty: String,
    pub enrollment_year: i32,
}

/// Teacher extension row, one-to-one with `User` by shared id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub teacher_id: String,
    pub department: String,
    pub specialties: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "users", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTeacher {
    pub id: String,
    pub teacher_id: String,
    pub department: String,
    pub specialties: Vec<String>,
}
