//! Test fixtures for pensum-core

use crate::model::{CourseDraft, InstructorDraft, StudentDraft};
use crate::store::{CourseStore, InstructorStore, MemoryStore, StudentStore};
use chrono::NaiveDate;

pub fn past_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 5, 14).unwrap()
}

pub fn course_draft(name: &str, code: &str, credits: u32) -> CourseDraft {
    CourseDraft {
        name: name.to_string(),
        code: code.to_string(),
        credits,
    }
}

pub fn instructor_draft(employee_number: &str) -> InstructorDraft {
    InstructorDraft {
        employee_number: employee_number.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada.lovelace@example.edu".to_string(),
        birth_date: past_date(),
        department: "Mathematics".to_string(),
    }
}

pub fn student_draft(enrollment_number: &str) -> StudentDraft {
    StudentDraft {
        enrollment_number: enrollment_number.to_string(),
        first_name: "Linus".to_string(),
        last_name: "Pauling".to_string(),
        email: "linus.pauling@example.edu".to_string(),
        birth_date: past_date(),
    }
}

/// Store preloaded with three courses (no edges), one instructor, and one
/// student. Course codes are MAT-101, MAT-201, MAT-301 in id order.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (name, code) in [
        ("Calculus I", "MAT-101"),
        ("Calculus II", "MAT-201"),
        ("Calculus III", "MAT-301"),
    ] {
        store
            .insert_course(crate::model::Course::from_draft(&course_draft(name, code, 4)))
            .unwrap();
    }
    store
        .insert_instructor(crate::model::Instructor::from_draft(&instructor_draft(
            "EMP-0001",
        )))
        .unwrap();
    store
        .insert_student(crate::model::Student::from_draft(&student_draft("2024-001")))
        .unwrap();
    store
}
