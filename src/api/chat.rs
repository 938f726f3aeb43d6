//! Chat room and message operations

use crate::backend::{Backend, BackendResult, Embed, Filter, Order, Request};
use crate::models::{ChatRoom, Message, NewChatRoom, NewMessage, Role};

use super::{get_student_enrollments, get_student_profile, rows, single};

/// Default page size for a room's message history.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

pub async fn create_chat_room(
    backend: &dyn Backend,
    room: &NewChatRoom,
) -> BackendResult<ChatRoom> {
    let values = serde_json::to_value(room)?;
    single(
        "chat_rooms",
        backend.execute(Request::insert("chat_rooms", values)).await?,
    )
}

/// Rooms visible to a user. Students see rooms scoped to their specialty
/// or to any course they are enrolled in; the profile and the enrollment
/// list are fetched explicitly before the room query is built. Teachers
/// see every room.
pub async fn list_chat_rooms(
    backend: &dyn Backend,
    user_id: &str,
    role: Role,
) -> BackendResult<Vec<ChatRoom>> {
    let mut request = Request::select("chat_rooms");

    if role == Role::Student {
        let student = get_student_profile(backend, user_id).await?;
        let enrollments = get_student_enrollments(backend, user_id).await?;
        let course_ids: Vec<String> = enrollments.into_iter().map(|e| e.course_id).collect();

        let mut arms = vec![Filter::eq("specialty", &student.specialty)];
        if !course_ids.is_empty() {
            arms.push(Filter::is_in("course_id", course_ids));
        }
        request = request.filter(Filter::any(arms));
    }

    rows(backend.execute(request).await?)
}

pub async fn send_message(backend: &dyn Backend, message: &NewMessage) -> BackendResult<Message> {
    let values = serde_json::to_value(message)?;
    single(
        "messages",
        backend.execute(Request::insert("messages", values)).await?,
    )
}

/// Message history for a room, newest first with the sender joined in.
/// Callers reverse the page for chronological display.
pub async fn get_chat_messages(
    backend: &dyn Backend,
    chat_room_id: &str,
    limit: Option<usize>,
) -> BackendResult<Vec<Message>> {
    rows(
        backend
            .execute(
                Request::select("messages")
                    .embed(Embed::table("users"))
                    .filter(Filter::eq("chat_room_id", chat_room_id))
                    .order(Order::desc("created_at"))
                    .limit(limit.unwrap_or(DEFAULT_MESSAGE_LIMIT)),
            )
            .await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        create_course, create_student_profile, create_user_profile, enroll_student,
    };
    use crate::backend::testing::MemoryBackend;
    use crate::models::{MessageType, NewCourse, NewStudent, NewUser, RoomType};

    async fn seed_student(backend: &MemoryBackend, id: &str, specialty: &str) {
        create_user_profile(
            backend,
            id,
            &format!("{id}@campus.edu"),
            &NewUser {
                full_name: id.into(),
                role: Role::Student,
                avatar_url: None,
            },
        )
        .await
        .unwrap();
        create_student_profile(
            backend,
            &NewStudent {
                id: id.into(),
                student_id: format!("S-{id}"),
                semester: 3,
                specialty: specialty.into(),
                enrollment_year: 2025,
            },
        )
        .await
        .unwrap();
    }

    fn room(name: &str, room_type: RoomType) -> NewChatRoom {
        NewChatRoom {
            name: name.into(),
            room_type,
            course_id: None,
            specialty: None,
            semester: None,
            created_by: "t1".into(),
        }
    }

    #[tokio::test]
    async fn student_sees_specialty_and_enrolled_course_rooms() {
        let backend = MemoryBackend::new();
        seed_student(&backend, "u1", "CS").await;
        let course = create_course(
            &backend,
            &NewCourse {
                name: "Algorithms".into(),
                code: "CS301".into(),
                description: String::new(),
                semester: 3,
                specialty: "CS".into(),
                teacher_id: "t1".into(),
            },
        )
        .await
        .unwrap();
        enroll_student(&backend, "u1", &course.id).await.unwrap();

        let mut cs_room = room("CS lounge", RoomType::Specialty);
        cs_room.specialty = Some("CS".into());
        create_chat_room(&backend, &cs_room).await.unwrap();

        let mut course_room = room("Algorithms Q&A", RoomType::Course);
        course_room.course_id = Some(course.id.clone());
        create_chat_room(&backend, &course_room).await.unwrap();

        let mut other_room = room("EE lounge", RoomType::Specialty);
        other_room.specialty = Some("EE".into());
        create_chat_room(&backend, &other_room).await.unwrap();

        let visible = list_chat_rooms(&backend, "u1", Role::Student).await.unwrap();
        let mut names: Vec<&str> = visible.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Algorithms Q&A", "CS lounge"]);
    }

    #[tokio::test]
    async fn unenrolled_student_still_sees_specialty_rooms() {
        let backend = MemoryBackend::new();
        seed_student(&backend, "u1", "CS").await;

        let mut cs_room = room("CS lounge", RoomType::Specialty);
        cs_room.specialty = Some("CS".into());
        create_chat_room(&backend, &cs_room).await.unwrap();

        let mut course_room = room("Algorithms Q&A", RoomType::Course);
        course_room.course_id = Some("c-unrelated".into());
        create_chat_room(&backend, &course_room).await.unwrap();

        let visible = list_chat_rooms(&backend, "u1", Role::Student).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "CS lounge");
    }

    #[tokio::test]
    async fn teacher_sees_every_room() {
        let backend = MemoryBackend::new();
        let mut cs_room = room("CS lounge", RoomType::Specialty);
        cs_room.specialty = Some("CS".into());
        create_chat_room(&backend, &cs_room).await.unwrap();
        create_chat_room(&backend, &room("Campus general", RoomType::General))
            .await
            .unwrap();

        let visible = list_chat_rooms(&backend, "t1", Role::Teacher).await.unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn message_page_is_newest_first_and_reversal_is_chronological() {
        let backend = MemoryBackend::new();
        seed_student(&backend, "u1", "CS").await;
        let created = create_chat_room(&backend, &room("CS lounge", RoomType::General))
            .await
            .unwrap();

        for n in 0..4 {
            send_message(
                &backend,
                &NewMessage {
                    chat_room_id: created.id.clone(),
                    user_id: "u1".into(),
                    content: format!("message {n}"),
                    message_type: MessageType::Text,
                },
            )
            .await
            .unwrap();
        }

        let mut page = get_chat_messages(&backend, &created.id, Some(3)).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].content, "message 3");
        assert_eq!(page[0].user.as_ref().unwrap().id, "u1");

        page.reverse();
        let stamps: Vec<_> = page.iter().map(|m| m.created_at.unwrap()).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn messages_from_other_rooms_are_excluded() {
        let backend = MemoryBackend::new();
        seed_student(&backend, "u1", "CS").await;
        let first = create_chat_room(&backend, &room("one", RoomType::General)).await.unwrap();
        let second = create_chat_room(&backend, &room("two", RoomType::General)).await.unwrap();

        for room_id in [&first.id, &second.id] {
            send_message(
                &backend,
                &NewMessage {
                    chat_room_id: room_id.to_string(),
                    user_id: "u1".into(),
                    content: format!("in {room_id}"),
                    message_type: MessageType::Text,
                },
            )
            .await
            .unwrap();
        }

        let page = get_chat_messages(&backend, &first.id, None).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].chat_room_id, first.id);
    }
}
