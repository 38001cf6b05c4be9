//! Course operations: CRUD, prerequisite edges, instructor assignment

use std::sync::Arc;

use pensum_core::error::{CatalogError, Result};
use pensum_core::graph::PrereqGraph;
use pensum_core::model::{Course, CourseDraft, CourseId, InstructorId};
use pensum_core::store::CatalogStore;
use pensum_core::validate::validate_course;
use pensum_core::CatalogCache;

/// Owns every mutation of the course edge sets. Both sides of each
/// bidirectional relation are written together, and the affected cache keys
/// are invalidated here and nowhere else.
pub struct CourseService<S> {
    store: Arc<S>,
    cache: Arc<CatalogCache>,
}

impl<S: CatalogStore> CourseService<S> {
    pub fn new(store: Arc<S>, cache: Arc<CatalogCache>) -> Self {
        CourseService { store, cache }
    }

    pub fn list(&self) -> Result<Vec<Course>> {
        let listing = self
            .cache
            .course_listing
            .get_or_load((), || self.store.all_courses().map(Some))?;
        Ok(listing.unwrap_or_default())
    }

    pub fn get(&self, id: CourseId) -> Result<Option<Course>> {
        self.cache
            .course_by_id
            .get_or_load(id, || self.store.find_course(id))
    }

    pub fn get_by_code(&self, code: &str) -> Result<Option<Course>> {
        self.cache
            .course_by_code
            .get_or_load(code.to_string(), || self.store.find_course_by_code(code))
    }

    pub fn create(&self, draft: &CourseDraft) -> Result<Course> {
        validate_course(draft)?;
        let created = self.store.insert_course(Course::from_draft(draft))?;
        self.cache.invalidate_course(created.id, &created.code);
        self.cache.invalidate_course_listing();
        tracing::info!(id = created.id.0, code = %created.code, "course created");
        Ok(created)
    }

    /// Overwrite the scalar fields. Edge sets are untouched; they move only
    /// through the dedicated operations below. Surfaces `VersionConflict`
    /// when a concurrent writer won the race.
    pub fn update(&self, id: CourseId, draft: &CourseDraft) -> Result<Course> {
        validate_course(draft)?;
        let mut course = self
            .store
            .find_course(id)?
            .ok_or_else(|| CatalogError::not_found("course", id.0))?;
        let old_code = course.code.clone();
        course.name = draft.name.clone();
        course.code = draft.code.clone();
        course.credits = draft.credits;
        let saved = self.store.save_course(&course)?;
        self.cache.invalidate_course(id, &old_code);
        if saved.code != old_code {
            self.cache.course_by_code.invalidate(&saved.code);
        }
        self.cache.invalidate_course_listing();
        tracing::info!(id = id.0, code = %saved.code, "course updated");
        Ok(saved)
    }

    /// Delete a course nothing depends on.
    ///
    /// Refused while other courses list it as a prerequisite or enrollments
    /// reference it; the caller must detach those first. The course's own
    /// outgoing prerequisite edges and instructor assignments are unlinked
    /// from the opposite endpoints before the row goes away, so no dangling
    /// ids survive the delete.
    pub fn delete(&self, id: CourseId) -> Result<()> {
        let course = self
            .store
            .find_course(id)?
            .ok_or_else(|| CatalogError::not_found("course", id.0))?;
        let enrollments = self.store.enrollments_by_course(id)?;
        if !course.is_prerequisite_of.is_empty() || !enrollments.is_empty() {
            return Err(CatalogError::CourseInUse {
                course: id,
                dependents: course.is_prerequisite_of.len(),
                enrollments: enrollments.len(),
            });
        }

        for prereq_id in &course.prerequisites {
            if let Some(mut prereq) = self.store.find_course(*prereq_id)? {
                if prereq.is_prerequisite_of.remove(&id) {
                    let saved = self.store.save_course(&prereq)?;
                    self.cache.invalidate_course(saved.id, &saved.code);
                }
            }
        }
        for instructor_id in &course.instructors {
            if let Some(mut instructor) = self.store.find_instructor(*instructor_id)? {
                if instructor.courses.remove(&id) {
                    self.store.save_instructor(&instructor)?;
                    self.cache.invalidate_instructor(instructor.id);
                }
            }
        }
        if !course.instructors.is_empty() {
            self.cache.invalidate_instructor_listing();
        }

        self.store.delete_course(id)?;
        self.cache.invalidate_course(id, &course.code);
        self.cache.invalidate_course_listing();
        tracing::info!(id = id.0, code = %course.code, "course deleted");
        Ok(())
    }

    /// Read-only cycle probe. The course id must resolve; an absent
    /// candidate makes no determination possible and reports no cycle.
    pub fn would_form_cycle(&self, course_id: CourseId, prereq_id: CourseId) -> Result<bool> {
        if self.store.find_course(course_id)?.is_none() {
            return Err(CatalogError::not_found("course", course_id.0));
        }
        if self.store.find_course(prereq_id)?.is_none() {
            return Ok(false);
        }
        let courses = self.store.all_courses()?;
        let graph = PrereqGraph::from_courses(&courses);
        Ok(graph.would_create_cycle(course_id, prereq_id))
    }

    /// Record that `prereq_id` must be completed before `course_id`.
    ///
    /// The edge is written on both endpoints in one logical operation; if it
    /// would close a cycle nothing is mutated. Re-adding an existing edge is
    /// a no-op.
    pub fn add_prerequisite(&self, course_id: CourseId, prereq_id: CourseId) -> Result<Course> {
        let mut course = self
            .store
            .find_course(course_id)?
            .ok_or_else(|| CatalogError::not_found("course", course_id.0))?;
        let mut prereq = self
            .store
            .find_course(prereq_id)?
            .ok_or_else(|| CatalogError::not_found("course", prereq_id.0))?;

        let courses = self.store.all_courses()?;
        let graph = PrereqGraph::from_courses(&courses);
        if graph.would_create_cycle(course_id, prereq_id) {
            tracing::warn!(
                course = course_id.0,
                prerequisite = prereq_id.0,
                "prerequisite rejected: would close a cycle"
            );
            return Err(CatalogError::CircularPrerequisite {
                course: course_id,
                prerequisite: prereq_id,
            });
        }

        if !course.prerequisites.insert(prereq_id) {
            return Ok(course);
        }
        prereq.is_prerequisite_of.insert(course_id);
        let saved = self.store.save_course(&course)?;
        let saved_prereq = self.store.save_course(&prereq)?;

        self.cache.invalidate_course(saved.id, &saved.code);
        self.cache.invalidate_course(saved_prereq.id, &saved_prereq.code);
        self.cache.invalidate_course_listing();
        tracing::info!(
            course = course_id.0,
            prerequisite = prereq_id.0,
            "prerequisite added"
        );
        Ok(saved)
    }

    /// Remove the edge from both endpoints. A missing edge is a no-op.
    pub fn remove_prerequisite(&self, course_id: CourseId, prereq_id: CourseId) -> Result<Course> {
        let mut course = self
            .store
            .find_course(course_id)?
            .ok_or_else(|| CatalogError::not_found("course", course_id.0))?;
        let mut prereq = self
            .store
            .find_course(prereq_id)?
            .ok_or_else(|| CatalogError::not_found("course", prereq_id.0))?;

        if !course.prerequisites.remove(&prereq_id) {
            return Ok(course);
        }
        prereq.is_prerequisite_of.remove(&course_id);
        let saved = self.store.save_course(&course)?;
        let saved_prereq = self.store.save_course(&prereq)?;

        self.cache.invalidate_course(saved.id, &saved.code);
        self.cache.invalidate_course(saved_prereq.id, &saved_prereq.code);
        self.cache.invalidate_course_listing();
        tracing::info!(
            course = course_id.0,
            prerequisite = prereq_id.0,
            "prerequisite removed"
        );
        Ok(saved)
    }

    /// Assign an instructor. Already-assigned is a no-op, not an error.
    pub fn assign_instructor(
        &self,
        course_id: CourseId,
        instructor_id: InstructorId,
    ) -> Result<Course> {
        let mut course = self
            .store
            .find_course(course_id)?
            .ok_or_else(|| CatalogError::not_found("course", course_id.0))?;
        let mut instructor = self
            .store
            .find_instructor(instructor_id)?
            .ok_or_else(|| CatalogError::not_found("instructor", instructor_id.0))?;

        if !course.instructors.insert(instructor_id) {
            return Ok(course);
        }
        instructor.courses.insert(course_id);
        let saved = self.store.save_course(&course)?;
        self.store.save_instructor(&instructor)?;

        self.cache.invalidate_course(saved.id, &saved.code);
        self.cache.invalidate_course_listing();
        self.cache.invalidate_instructor(instructor_id);
        self.cache.invalidate_instructor_listing();
        tracing::info!(
            course = course_id.0,
            instructor = instructor_id.0,
            "instructor assigned"
        );
        Ok(saved)
    }

    pub fn unassign_instructor(
        &self,
        course_id: CourseId,
        instructor_id: InstructorId,
    ) -> Result<Course> {
        let mut course = self
            .store
            .find_course(course_id)?
            .ok_or_else(|| CatalogError::not_found("course", course_id.0))?;
        let mut instructor = self
            .store
            .find_instructor(instructor_id)?
            .ok_or_else(|| CatalogError::not_found("instructor", instructor_id.0))?;

        if !course.instructors.remove(&instructor_id) {
            return Ok(course);
        }
        instructor.courses.remove(&course_id);
        let saved = self.store.save_course(&course)?;
        self.store.save_instructor(&instructor)?;

        self.cache.invalidate_course(saved.id, &saved.code);
        self.cache.invalidate_course_listing();
        self.cache.invalidate_instructor(instructor_id);
        self.cache.invalidate_instructor_listing();
        tracing::info!(
            course = course_id.0,
            instructor = instructor_id.0,
            "instructor unassigned"
        );
        Ok(saved)
    }

    /// Transitive closure of a course's prerequisites, for display.
    pub fn transitive_prerequisites(&self, course_id: CourseId) -> Result<Vec<Course>> {
        if self.store.find_course(course_id)?.is_none() {
            return Err(CatalogError::not_found("course", course_id.0));
        }
        let courses = self.store.all_courses()?;
        let graph = PrereqGraph::from_courses(&courses);
        let closure = graph.transitive_prerequisites(course_id);
        Ok(courses
            .into_iter()
            .filter(|c| closure.contains(&c.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{course_service, fixtures};
    use pensum_core::store::{CourseStore, InstructorStore};

    #[test]
    fn test_add_prerequisite_writes_both_sides() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();

        let mat201 = service.get(CourseId(2)).unwrap().unwrap();
        let mat101 = service.get(CourseId(1)).unwrap().unwrap();
        assert!(mat201.prerequisites.contains(&CourseId(1)));
        assert!(mat101.is_prerequisite_of.contains(&CourseId(2)));
    }

    #[test]
    fn test_remove_prerequisite_clears_both_sides() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        service
            .remove_prerequisite(CourseId(2), CourseId(1))
            .unwrap();

        let mat201 = service.get(CourseId(2)).unwrap().unwrap();
        let mat101 = service.get(CourseId(1)).unwrap().unwrap();
        assert!(mat201.prerequisites.is_empty());
        assert!(mat101.is_prerequisite_of.is_empty());

        // removing again is a quiet no-op
        service
            .remove_prerequisite(CourseId(2), CourseId(1))
            .unwrap();
    }

    #[test]
    fn test_cycle_is_rejected_without_mutation() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        assert!(service.would_form_cycle(CourseId(1), CourseId(2)).unwrap());

        let result = service.add_prerequisite(CourseId(1), CourseId(2));
        assert!(matches!(
            result,
            Err(CatalogError::CircularPrerequisite { .. })
        ));

        let mat101 = service.get(CourseId(1)).unwrap().unwrap();
        assert!(mat101.prerequisites.is_empty());
    }

    #[test]
    fn test_self_prerequisite_rejected() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);
        let result = service.add_prerequisite(CourseId(1), CourseId(1));
        assert!(matches!(
            result,
            Err(CatalogError::CircularPrerequisite { .. })
        ));
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        service.add_prerequisite(CourseId(3), CourseId(2)).unwrap();

        assert!(service.would_form_cycle(CourseId(1), CourseId(3)).unwrap());
        let result = service.add_prerequisite(CourseId(1), CourseId(3));
        assert!(matches!(
            result,
            Err(CatalogError::CircularPrerequisite { .. })
        ));
    }

    #[test]
    fn test_would_form_cycle_requires_the_course() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);
        assert!(matches!(
            service.would_form_cycle(CourseId(99), CourseId(1)),
            Err(CatalogError::NotFound { .. })
        ));
        // absent candidate: no determination possible
        assert!(!service.would_form_cycle(CourseId(1), CourseId(99)).unwrap());
    }

    #[test]
    fn test_get_reflects_update_immediately() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        // warm the caches
        assert_eq!(service.list().unwrap().len(), 3);
        service.get(CourseId(1)).unwrap().unwrap();

        let draft = pensum_core::CourseDraft {
            name: "Calculus I (honors)".to_string(),
            code: "MAT-101".to_string(),
            credits: 6,
        };
        service.update(CourseId(1), &draft).unwrap();

        let reread = service.get(CourseId(1)).unwrap().unwrap();
        assert_eq!(reread.credits, 6);
        let listed = service.list().unwrap();
        let listed_101 = listed.iter().find(|c| c.id == CourseId(1)).unwrap();
        assert_eq!(listed_101.name, "Calculus I (honors)");
    }

    #[test]
    fn test_get_by_code_reflects_code_change() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);
        service.get_by_code("MAT-101").unwrap().unwrap();

        let draft = pensum_core::CourseDraft {
            name: "Calculus I".to_string(),
            code: "MAT-110".to_string(),
            credits: 4,
        };
        service.update(CourseId(1), &draft).unwrap();

        assert!(service.get_by_code("MAT-101").unwrap().is_none());
        assert!(service.get_by_code("MAT-110").unwrap().is_some());
    }

    #[test]
    fn test_assign_instructor_is_idempotent() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service
            .assign_instructor(CourseId(1), InstructorId(1))
            .unwrap();
        let course = service
            .assign_instructor(CourseId(1), InstructorId(1))
            .unwrap();

        assert_eq!(course.instructors.len(), 1);
        let instructor = store.find_instructor(InstructorId(1)).unwrap().unwrap();
        assert_eq!(instructor.courses.len(), 1);
    }

    #[test]
    fn test_unassign_instructor_clears_both_sides() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service
            .assign_instructor(CourseId(1), InstructorId(1))
            .unwrap();
        service
            .unassign_instructor(CourseId(1), InstructorId(1))
            .unwrap();

        let course = service.get(CourseId(1)).unwrap().unwrap();
        let instructor = store.find_instructor(InstructorId(1)).unwrap().unwrap();
        assert!(course.instructors.is_empty());
        assert!(instructor.courses.is_empty());
    }

    #[test]
    fn test_delete_refused_while_depended_upon() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        let result = service.delete(CourseId(1));
        assert!(matches!(result, Err(CatalogError::CourseInUse { .. })));
        assert!(service.get(CourseId(1)).unwrap().is_some());
    }

    #[test]
    fn test_delete_unlinks_outgoing_edges() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        service
            .assign_instructor(CourseId(2), InstructorId(1))
            .unwrap();
        service.delete(CourseId(2)).unwrap();

        let mat101 = service.get(CourseId(1)).unwrap().unwrap();
        assert!(mat101.is_prerequisite_of.is_empty());
        let instructor = store.find_instructor(InstructorId(1)).unwrap().unwrap();
        assert!(instructor.courses.is_empty());
        assert!(service.get(CourseId(2)).unwrap().is_none());
    }

    #[test]
    fn test_stale_writer_gets_conflict() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        let stale = store.find_course(CourseId(1)).unwrap().unwrap();
        service.add_prerequisite(CourseId(1), CourseId(2)).unwrap();

        // a writer holding the pre-edge version must fail its save
        let result = store.save_course(&stale);
        assert!(matches!(result, Err(CatalogError::VersionConflict { .. })));
    }

    #[test]
    fn test_transitive_prerequisites_for_display() {
        let (store, cache) = fixtures();
        let service = course_service(&store, &cache);

        service.add_prerequisite(CourseId(2), CourseId(1)).unwrap();
        service.add_prerequisite(CourseId(3), CourseId(2)).unwrap();

        let closure = service.transitive_prerequisites(CourseId(3)).unwrap();
        let codes: Vec<&str> = closure.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["MAT-101", "MAT-201"]);
    }
}
