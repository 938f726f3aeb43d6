//! User, student and teacher profile operations

use serde_json::json;

use crate::backend::{Backend, BackendResult, Embed, Filter, Request};
use crate::models::{NewStudent, NewTeacher, NewUser, Student, Teacher, User, UserUpdate};

use super::{rows, single};

/// Insert the identity row for a freshly registered account. The id and
/// email come from the auth service, the rest from the caller.
pub async fn create_user_profile(
    backend: &dyn Backend,
    user_id: &str,
    email: &str,
    profile: &NewUser,
) -> BackendResult<User> {
    let mut values = serde_json::to_value(profile)?;
    values["id"] = json!(user_id);
    values["email"] = json!(email);
    single("users", backend.execute(Request::insert("users", values)).await?)
}

pub async fn get_user_profile(backend: &dyn Backend, user_id: &str) -> BackendResult<User> {
    single(
        "users",
        backend
            .execute(Request::select("users").filter(Filter::eq("id", user_id)))
            .await?,
    )
}

/// Partial profile update; returns the row as stored after the write.
pub async fn update_user_profile(
    backend: &dyn Backend,
    user_id: &str,
    updates: &UserUpdate,
) -> BackendResult<User> {
    let changes = serde_json::to_value(updates)?;
    single(
        "users",
        backend
            .execute(Request::update("users", changes).filter(Filter::eq("id", user_id)))
            .await?,
    )
}

pub async fn create_student_profile(
    backend: &dyn Backend,
    profile: &NewStudent,
) -> BackendResult<Student> {
    let values = serde_json::to_value(profile)?;
    single(
        "students",
        backend.execute(Request::insert("students", values)).await?,
    )
}

pub async fn get_student_profile(backend: &dyn Backend, user_id: &str) -> BackendResult<Student> {
    single(
        "students",
        backend
            .execute(
                Request::select("students")
                    .embed(Embed::table("users"))
                    .filter(Filter::eq("id", user_id)),
            )
            .await?,
    )
}

pub async fn get_students_by_specialty(
    backend: &dyn Backend,
    specialty: &str,
    semester: i32,
) -> BackendResult<Vec<Student>> {
    rows(
        backend
            .execute(
                Request::select("students")
                    .embed(Embed::table("users"))
                    .filter(Filter::eq("specialty", specialty))
                    .filter(Filter::eq("semester", semester)),
            )
            .await?,
    )
}

pub async fn create_teacher_profile(
    backend: &dyn Backend,
    profile: &NewTeacher,
) -> BackendResult<Teacher> {
    let values = serde_json::to_value(profile)?;
    single(
        "teachers",
        backend.execute(Request::insert("teachers", values)).await?,
    )
}

pub async fn get_teacher_profile(backend: &dyn Backend, user_id: &str) -> BackendResult<Teacher> {
    single(
        "teachers",
        backend
            .execute(
                Request::select("teachers")
                    .embed(Embed::table("users"))
                    .filter(Filter::eq("id", user_id)),
            )
            .await?,
    )
}
