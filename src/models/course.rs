//! Course and enrollment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Student, Teacher};

/// Course row, owned by one teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: String,
    pub semester: i32,
    pub specialty: String,
    pub teacher_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "teachers", default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<Teacher>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    pub description: String,
    pub semester: i32,
    pub specialty: String,
    pub teacher_id: String,
}

/// Join row linking a student to a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(rename = "courses", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    #[serde(rename = "students", default, skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_embeds_course_chain() {
        let raw = serde_json::json!({
            "id": "e1",
            "student_id": "u1",
            "course_id": "c1",
            "enrolled_at": "2025-02-01T09:30:00Z",
            "courses": {
                "id": "c1",
                "name": "Algorithms",
                "code": "CS301",
                "description": "Graphs and greedy methods",
                "semester": 3,
                "specialty": "CS",
                "teacher_id": "t1",
                "teachers": {
                    "id": "t1",
                    "teacher_id": "T9",
                    "department": "Informatics",
                    "specialties": ["CS"]
                }
            }
        });
        let enrollment: Enrollment = serde_json::from_value(raw).unwrap();
        let course = enrollment.course.unwrap();
        assert_eq!(course.code, "CS301");
        assert_eq!(course.teacher.unwrap().department, "Informatics");
        assert!(enrollment.student.is_none());
    }
}
