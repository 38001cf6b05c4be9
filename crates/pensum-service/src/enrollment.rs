//! Enrollment operations and the one-per-(student, course) guard

use std::sync::Arc;

use pensum_core::error::{CatalogError, Result};
use pensum_core::model::{Enrollment, EnrollmentDraft, EnrollmentId, EnrollmentStatus};
use pensum_core::model::{CourseId, StudentId};
use pensum_core::store::CatalogStore;
use pensum_core::CatalogCache;

pub struct EnrollmentService<S> {
    store: Arc<S>,
    cache: Arc<CatalogCache>,
}

impl<S: CatalogStore> EnrollmentService<S> {
    pub fn new(store: Arc<S>, cache: Arc<CatalogCache>) -> Self {
        EnrollmentService { store, cache }
    }

    pub fn list(&self) -> Result<Vec<Enrollment>> {
        self.store.all_enrollments()
    }

    pub fn get(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
        self.cache
            .enrollment_by_id
            .get_or_load(id, || self.store.find_enrollment(id))
    }

    pub fn list_by_student(&self, student: StudentId) -> Result<Vec<Enrollment>> {
        let listing = self
            .cache
            .enrollments_by_student
            .get_or_load(student, || {
                self.store.enrollments_by_student(student).map(Some)
            })?;
        Ok(listing.unwrap_or_default())
    }

    pub fn list_by_course(&self, course: CourseId) -> Result<Vec<Enrollment>> {
        let listing = self
            .cache
            .enrollments_by_course
            .get_or_load(course, || self.store.enrollments_by_course(course).map(Some))?;
        Ok(listing.unwrap_or_default())
    }

    /// Enroll a student in a course. Both references must resolve, and the
    /// (student, course) pair must be new. The store re-checks the pair
    /// atomically on insert, so a racing duplicate still loses.
    pub fn create(&self, draft: &EnrollmentDraft) -> Result<Enrollment> {
        self.store
            .find_student(draft.student)?
            .ok_or_else(|| CatalogError::not_found("student", draft.student.0))?;
        self.store
            .find_course(draft.course)?
            .ok_or_else(|| CatalogError::not_found("course", draft.course.0))?;
        if self
            .store
            .enrollment_pair_exists(draft.student, draft.course)?
        {
            return Err(CatalogError::DuplicateEnrollment {
                student: draft.student,
                course: draft.course,
            });
        }

        let enrollment = Enrollment {
            id: EnrollmentId::default(),
            student: draft.student,
            course: draft.course,
            enrolled_on: draft
                .enrolled_on
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            status: draft.status.unwrap_or(EnrollmentStatus::Activo),
            grade: draft.grade,
        };
        let created = self.store.insert_enrollment(enrollment)?;
        self.cache
            .invalidate_enrollment_listings(created.student, created.course);
        tracing::info!(
            id = created.id.0,
            student = created.student.0,
            course = created.course.0,
            status = %created.status,
            "enrollment created"
        );
        Ok(created)
    }

    /// Replace an enrollment. Absent draft fields keep their current value;
    /// the grade is replaced as given. When the (student, course) pair
    /// changes, the listings of both the old and the new pair are dropped.
    pub fn update(&self, id: EnrollmentId, draft: &EnrollmentDraft) -> Result<Enrollment> {
        let existing = self
            .store
            .find_enrollment(id)?
            .ok_or_else(|| CatalogError::not_found("enrollment", id.0))?;
        self.store
            .find_student(draft.student)?
            .ok_or_else(|| CatalogError::not_found("student", draft.student.0))?;
        self.store
            .find_course(draft.course)?
            .ok_or_else(|| CatalogError::not_found("course", draft.course.0))?;

        let updated = Enrollment {
            id,
            student: draft.student,
            course: draft.course,
            enrolled_on: draft.enrolled_on.unwrap_or(existing.enrolled_on),
            status: draft.status.unwrap_or(existing.status),
            grade: draft.grade,
        };
        let saved = self.store.save_enrollment(&updated)?;

        self.cache.invalidate_enrollment(id);
        self.cache
            .invalidate_enrollment_listings(existing.student, existing.course);
        if (saved.student, saved.course) != (existing.student, existing.course) {
            self.cache
                .invalidate_enrollment_listings(saved.student, saved.course);
        }
        tracing::info!(id = id.0, status = %saved.status, "enrollment updated");
        Ok(saved)
    }

    pub fn delete(&self, id: EnrollmentId) -> Result<()> {
        let enrollment = self
            .store
            .find_enrollment(id)?
            .ok_or_else(|| CatalogError::not_found("enrollment", id.0))?;
        self.store.delete_enrollment(id)?;
        self.cache.invalidate_enrollment(id);
        self.cache
            .invalidate_enrollment_listings(enrollment.student, enrollment.course);
        tracing::info!(id = id.0, "enrollment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{enrollment_draft, enrollment_service, fixtures};

    #[test]
    fn test_create_defaults_to_activo() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        let created = service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();
        assert_eq!(created.status, EnrollmentStatus::Activo);
        assert!(created.grade.is_none());
    }

    #[test]
    fn test_duplicate_enrollment_rejected() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();
        let second = service.create(&enrollment_draft(StudentId(1), CourseId(1)));
        assert!(matches!(
            second,
            Err(CatalogError::DuplicateEnrollment { .. })
        ));
        assert_eq!(service.list_by_course(CourseId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_create_requires_both_references() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        assert!(matches!(
            service.create(&enrollment_draft(StudentId(9), CourseId(1))),
            Err(CatalogError::NotFound {
                entity: "student",
                ..
            })
        ));
        assert!(matches!(
            service.create(&enrollment_draft(StudentId(1), CourseId(9))),
            Err(CatalogError::NotFound {
                entity: "course",
                ..
            })
        ));
    }

    #[test]
    fn test_listings_reflect_create_immediately() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        // warm both listing caches while they are empty
        assert!(service.list_by_student(StudentId(1)).unwrap().is_empty());
        assert!(service.list_by_course(CourseId(1)).unwrap().is_empty());

        service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();

        assert_eq!(service.list_by_student(StudentId(1)).unwrap().len(), 1);
        assert_eq!(service.list_by_course(CourseId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_update_moves_between_listings() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        let created = service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();
        service.list_by_course(CourseId(1)).unwrap();
        service.list_by_course(CourseId(2)).unwrap();

        let mut draft = enrollment_draft(StudentId(1), CourseId(2));
        draft.status = Some(EnrollmentStatus::Cursando);
        let updated = service.update(created.id, &draft).unwrap();

        assert_eq!(updated.course, CourseId(2));
        assert_eq!(updated.status, EnrollmentStatus::Cursando);
        assert!(service.list_by_course(CourseId(1)).unwrap().is_empty());
        assert_eq!(service.list_by_course(CourseId(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_get_reflects_update_immediately() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        let created = service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();
        service.get(created.id).unwrap().unwrap();

        let mut draft = enrollment_draft(StudentId(1), CourseId(1));
        draft.status = Some(EnrollmentStatus::Aprobado);
        draft.grade = Some(92.5);
        service.update(created.id, &draft).unwrap();

        let reread = service.get(created.id).unwrap().unwrap();
        assert_eq!(reread.status, EnrollmentStatus::Aprobado);
        assert_eq!(reread.grade, Some(92.5));
    }

    #[test]
    fn test_delete_clears_listings() {
        let (store, cache) = fixtures();
        let service = enrollment_service(&store, &cache);

        let created = service
            .create(&enrollment_draft(StudentId(1), CourseId(1)))
            .unwrap();
        service.list_by_student(StudentId(1)).unwrap();

        service.delete(created.id).unwrap();

        assert!(service.get(created.id).unwrap().is_none());
        assert!(service.list_by_student(StudentId(1)).unwrap().is_empty());
        assert!(matches!(
            service.delete(created.id),
            Err(CatalogError::NotFound { .. })
        ));
    }
}
