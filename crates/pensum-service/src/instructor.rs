//! Instructor operations

use std::sync::Arc;

use pensum_core::error::{CatalogError, Result};
use pensum_core::model::{Instructor, InstructorDraft, InstructorId};
use pensum_core::store::CatalogStore;
use pensum_core::validate::validate_instructor;
use pensum_core::CatalogCache;

pub struct InstructorService<S> {
    store: Arc<S>,
    cache: Arc<CatalogCache>,
}

impl<S: CatalogStore> InstructorService<S> {
    pub fn new(store: Arc<S>, cache: Arc<CatalogCache>) -> Self {
        InstructorService { store, cache }
    }

    pub fn list(&self) -> Result<Vec<Instructor>> {
        let listing = self
            .cache
            .instructor_listing
            .get_or_load((), || self.store.all_instructors().map(Some))?;
        Ok(listing.unwrap_or_default())
    }

    pub fn get(&self, id: InstructorId) -> Result<Option<Instructor>> {
        self.cache
            .instructor_by_id
            .get_or_load(id, || self.store.find_instructor(id))
    }

    pub fn get_by_employee_number(&self, number: &str) -> Result<Option<Instructor>> {
        self.store.find_instructor_by_employee_number(number)
    }

    pub fn create(&self, draft: &InstructorDraft) -> Result<Instructor> {
        validate_instructor(draft)?;
        let created = self
            .store
            .insert_instructor(Instructor::from_draft(draft))?;
        self.cache.invalidate_instructor(created.id);
        self.cache.invalidate_instructor_listing();
        tracing::info!(
            id = created.id.0,
            employee_number = %created.employee_number,
            "instructor created"
        );
        Ok(created)
    }

    /// Overwrite the scalar fields; course assignments move only through
    /// the course service.
    pub fn update(&self, id: InstructorId, draft: &InstructorDraft) -> Result<Instructor> {
        validate_instructor(draft)?;
        let mut instructor = self
            .store
            .find_instructor(id)?
            .ok_or_else(|| CatalogError::not_found("instructor", id.0))?;
        instructor.employee_number = draft.employee_number.clone();
        instructor.first_name = draft.first_name.clone();
        instructor.last_name = draft.last_name.clone();
        instructor.email = draft.email.clone();
        instructor.birth_date = draft.birth_date;
        instructor.department = draft.department.clone();
        let saved = self.store.save_instructor(&instructor)?;
        self.cache.invalidate_instructor(id);
        self.cache.invalidate_instructor_listing();
        tracing::info!(id = id.0, "instructor updated");
        Ok(saved)
    }

    /// Delete an instructor, unassigning it from every course it teaches.
    pub fn delete(&self, id: InstructorId) -> Result<()> {
        let instructor = self
            .store
            .find_instructor(id)?
            .ok_or_else(|| CatalogError::not_found("instructor", id.0))?;

        for course_id in &instructor.courses {
            if let Some(mut course) = self.store.find_course(*course_id)? {
                if course.instructors.remove(&id) {
                    let saved = self.store.save_course(&course)?;
                    self.cache.invalidate_course(saved.id, &saved.code);
                }
            }
        }
        if !instructor.courses.is_empty() {
            self.cache.invalidate_course_listing();
        }

        self.store.delete_instructor(id)?;
        self.cache.invalidate_instructor(id);
        self.cache.invalidate_instructor_listing();
        tracing::info!(id = id.0, "instructor deleted");
        Ok(())
    }
}
