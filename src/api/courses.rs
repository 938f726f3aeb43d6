//! Course and enrollment operations

use serde_json::json;

use crate::backend::{Backend, BackendResult, Embed, Filter, Request};
use crate::models::{Course, Enrollment, NewCourse};

use super::{rows, single};

pub async fn create_course(backend: &dyn Backend, course: &NewCourse) -> BackendResult<Course> {
    let values = serde_json::to_value(course)?;
    single(
        "courses",
        backend.execute(Request::insert("courses", values)).await?,
    )
}

pub async fn get_courses_by_teacher(
    backend: &dyn Backend,
    teacher_id: &str,
) -> BackendResult<Vec<Course>> {
    rows(
        backend
            .execute(Request::select("courses").filter(Filter::eq("teacher_id", teacher_id)))
            .await?,
    )
}

/// Courses offered for one specialty and semester, with the owning
/// teacher's identity joined in.
pub async fn get_courses_by_specialty(
    backend: &dyn Backend,
    specialty: &str,
    semester: i32,
) -> BackendResult<Vec<Course>> {
    rows(
        backend
            .execute(
                Request::select("courses")
                    .embed(Embed::table("teachers").with(Embed::table("users")))
                    .filter(Filter::eq("specialty", specialty))
                    .filter(Filter::eq("semester", semester)),
            )
            .await?,
    )
}

pub async fn enroll_student(
    backend: &dyn Backend,
    student_id: &str,
    course_id: &str,
) -> BackendResult<Enrollment> {
    single(
        "enrollments",
        backend
            .execute(Request::insert(
                "enrollments",
                json!({ "student_id": student_id, "course_id": course_id }),
            ))
            .await?,
    )
}

pub async fn get_student_enrollments(
    backend: &dyn Backend,
    student_id: &str,
) -> BackendResult<Vec<Enrollment>> {
    rows(
        backend
            .execute(
                Request::select("enrollments")
                    .embed(
                        Embed::table("courses")
                            .with(Embed::table("teachers").with(Embed::table("users"))),
                    )
                    .filter(Filter::eq("student_id", student_id)),
            )
            .await?,
    )
}

pub async fn get_course_enrollments(
    backend: &dyn Backend,
    course_id: &str,
) -> BackendResult<Vec<Enrollment>> {
    rows(
        backend
            .execute(
                Request::select("enrollments")
                    .embed(Embed::table("students").with(Embed::table("users")))
                    .filter(Filter::eq("course_id", course_id)),
            )
            .await?,
    )
}
