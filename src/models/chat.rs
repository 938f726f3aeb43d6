//! Chat room and message models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Room scoping kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Course,
    Specialty,
    General,
}

/// Chat room row. `course_id`, `specialty` and `semester` narrow who the
/// room is meant for, depending on the room type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub course_id: Option<String>,
    pub specialty: Option<String>,
    pub semester: Option<i32>,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChatRoom {
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<i32>,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
    File,
}

/// Message row, ordered by creation time within a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_room_id: String,
    pub user_id: String,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "users", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub chat_room_id: String,
    pub user_id: String,
    pub content: String,
    pub message_type: MessageType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_type_round_trips_under_type_key() {
        let room = NewChatRoom {
            name: "CS general".into(),
            room_type: RoomType::Specialty,
            course_id: None,
            specialty: Some("CS".into()),
            semester: None,
            created_by: "u1".into(),
        };
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["type"], "specialty");
        assert!(value.get("course_id").is_none());
    }

    #[test]
    fn message_sender_embed_is_optional() {
        let raw = serde_json::json!({
            "id": "m1",
            "chat_room_id": "r1",
            "user_id": "u1",
            "content": "hello",
            "message_type": "text",
            "created_at": "2025-03-05T12:00:00Z"
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(message.message_type, MessageType::Text);
        assert!(message.user.is_none());
    }
}
