//! Shared fixtures for the service tests

use std::sync::Arc;

use chrono::NaiveDate;
use pensum_core::model::{
    Course, CourseDraft, CourseId, EnrollmentDraft, Instructor, InstructorDraft, Student,
    StudentDraft, StudentId,
};
use pensum_core::store::{CourseStore, InstructorStore, MemoryStore, StudentStore};
use pensum_core::CatalogCache;

use crate::{CourseService, EnrollmentService, InstructorService, StudentService};

pub fn past_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 5, 14).unwrap()
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

pub fn enrollment_draft(
    student: StudentId,
    course: CourseId,
) -> EnrollmentDraft {
    EnrollmentDraft {
        student,
        course,
        enrolled_on: Some(past_date()),
        status: None,
        grade: None,
    }
}

/// Store preloaded with MAT-101/201/301 (ids 1..=3, no edges), one
/// instructor (id 1), and one student (id 1), plus a fresh cache.
pub fn fixtures() -> (Arc<MemoryStore>, Arc<CatalogCache>) {
    let store = MemoryStore::new();
    for (name, code) in [
        ("Calculus I", "MAT-101"),
        ("Calculus II", "MAT-201"),
        ("Calculus III", "MAT-301"),
    ] {
        let draft = CourseDraft {
            name: name.to_string(),
            code: code.to_string(),
            credits: 4,
        };
        store.insert_course(Course::from_draft(&draft)).unwrap();
    }
    store
        .insert_instructor(Instructor::from_draft(&instructor_draft("EMP-0001")))
        .unwrap();
    store
        .insert_student(Student::from_draft(&student_draft("2024-001")))
        .unwrap();
    (Arc::new(store), Arc::new(CatalogCache::new()))
}

pub fn course_service(
    store: &Arc<MemoryStore>,
    cache: &Arc<CatalogCache>,
) -> CourseService<MemoryStore> {
    CourseService::new(Arc::clone(store), Arc::clone(cache))
}

pub fn instructor_service(
    store: &Arc<MemoryStore>,
    cache: &Arc<CatalogCache>,
) -> InstructorService<MemoryStore> {
    InstructorService::new(Arc::clone(store), Arc::clone(cache))
}

pub fn student_service(store: &Arc<MemoryStore>) -> StudentService<MemoryStore> {
    StudentService::new(Arc::clone(store))
}

pub fn enrollment_service(
    store: &Arc<MemoryStore>,
    cache: &Arc<CatalogCache>,
) -> EnrollmentService<MemoryStore> {
    EnrollmentService::new(Arc::clone(store), Arc::clone(cache))
}
