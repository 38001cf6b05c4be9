//! Student operations
//!
//! Students are read straight from the store; their rows change rarely and
//! are never embedded in graph or listing cache entries.

use std::sync::Arc;

use pensum_core::error::{CatalogError, Result};
use pensum_core::model::{Student, StudentDraft, StudentId, StudentStatus};
use pensum_core::store::CatalogStore;
use pensum_core::validate::validate_student;

pub struct StudentService<S> {
    store: Arc<S>,
}

impl<S: CatalogStore> StudentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        StudentService { store }
    }

    pub fn list(&self) -> Result<Vec<Student>> {
        self.store.all_students()
    }

    pub fn list_active(&self) -> Result<Vec<Student>> {
        Ok(self
            .store
            .all_students()?
            .into_iter()
            .filter(Student::is_active)
            .collect())
    }

    pub fn get(&self, id: StudentId) -> Result<Option<Student>> {
        self.store.find_student(id)
    }

    pub fn get_by_enrollment_number(&self, number: &str) -> Result<Option<Student>> {
        self.store.find_student_by_enrollment_number(number)
    }

    pub fn create(&self, draft: &StudentDraft) -> Result<Student> {
        validate_student(draft)?;
        let created = self.store.insert_student(Student::from_draft(draft))?;
        tracing::info!(
            id = created.id.0,
            enrollment_number = %created.enrollment_number,
            "student created"
        );
        Ok(created)
    }

    /// Overwrite the scalar fields. Status and its reason move only through
    /// `deactivate`.
    pub fn update(&self, id: StudentId, draft: &StudentDraft) -> Result<Student> {
        validate_student(draft)?;
        let mut student = self
            .store
            .find_student(id)?
            .ok_or_else(|| CatalogError::not_found("student", id.0))?;
        student.enrollment_number = draft.enrollment_number.clone();
        student.first_name = draft.first_name.clone();
        student.last_name = draft.last_name.clone();
        student.email = draft.email.clone();
        student.birth_date = draft.birth_date;
        let saved = self.store.save_student(&student)?;
        tracing::info!(id = id.0, "student updated");
        Ok(saved)
    }

    /// Logical delete: the row stays, the status flips, the reason is kept.
    pub fn deactivate(&self, id: StudentId, reason: &str) -> Result<Student> {
        let mut student = self
            .store
            .find_student(id)?
            .ok_or_else(|| CatalogError::not_found("student", id.0))?;
        student.status = StudentStatus::Inactive;
        student.inactive_reason = Some(reason.to_string());
        let saved = self.store.save_student(&student)?;
        tracing::info!(id = id.0, reason = %reason, "student deactivated");
        Ok(saved)
    }
}
