//! Read-through caches and their invalidation surface

use crate::error::Result;
use crate::model::{
    Course, CourseId, Enrollment, EnrollmentId, Instructor, InstructorId, StudentId,
};
use dashmap::DashMap;
use std::hash::Hash;

/// One cache family: concurrent keyed storage with get-or-load semantics.
///
/// Entries are whole values, replaced atomically; a reader never observes a
/// partially updated entry. Concurrent misses on the same key may each run
/// the loader; loaders are store reads and must stay side-effect-free.
pub struct Cache<K: Eq + Hash, V: Clone> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    pub fn new() -> Self {
        Cache {
            entries: DashMap::new(),
        }
    }

    /// Return the cached value, or run `load`, cache a present result, and
    /// return it. Absent results are not cached, so a later insert becomes
    /// visible without an invalidation.
    pub fn get_or_load<F>(&self, key: K, load: F) -> Result<Option<V>>
    where
        F: FnOnce() -> Result<Option<V>>,
    {
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Some(hit.clone()));
        }
        let loaded = load()?;
        if let Some(value) = &loaded {
            self.entries.insert(key, value.clone());
        }
        Ok(loaded)
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry in the family.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared cache families, one per entity family and query shape.
///
/// Every mutating service operation invalidates through the helpers below,
/// naming exactly the keys it touched; nothing else may invalidate them.
/// Students are read straight from the store and have no family here.
pub struct CatalogCache {
    pub course_by_id: Cache<CourseId, Course>,
    pub course_by_code: Cache<String, Course>,
    pub course_listing: Cache<(), Vec<Course>>,
    pub instructor_by_id: Cache<InstructorId, Instructor>,
    pub instructor_listing: Cache<(), Vec<Instructor>>,
    pub enrollment_by_id: Cache<EnrollmentId, Enrollment>,
    pub enrollments_by_student: Cache<StudentId, Vec<Enrollment>>,
    pub enrollments_by_course: Cache<CourseId, Vec<Enrollment>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        CatalogCache {
            course_by_id: Cache::new(),
            course_by_code: Cache::new(),
            course_listing: Cache::new(),
            instructor_by_id: Cache::new(),
            instructor_listing: Cache::new(),
            enrollment_by_id: Cache::new(),
            enrollments_by_student: Cache::new(),
            enrollments_by_course: Cache::new(),
        }
    }

    /// Drop the single-course entries (by id and by code) for one course.
    pub fn invalidate_course(&self, id: CourseId, code: &str) {
        self.course_by_id.invalidate(&id);
        self.course_by_code.invalidate(&code.to_string());
    }

    /// Drop the all-courses listing. Listing entries embed full objects, so
    /// every course mutation ends up here.
    pub fn invalidate_course_listing(&self) {
        self.course_listing.clear();
    }

    pub fn invalidate_instructor(&self, id: InstructorId) {
        self.instructor_by_id.invalidate(&id);
    }

    pub fn invalidate_instructor_listing(&self) {
        self.instructor_listing.clear();
    }

    pub fn invalidate_enrollment(&self, id: EnrollmentId) {
        self.enrollment_by_id.invalidate(&id);
    }

    /// Drop the by-student and by-course listings an enrollment mutation
    /// touched.
    pub fn invalidate_enrollment_listings(&self, student: StudentId, course: CourseId) {
        self.enrollments_by_student.invalidate(&student);
        self.enrollments_by_course.invalidate(&course);
    }

    /// Drop everything. Used when the backing store is swapped wholesale.
    pub fn clear(&self) {
        self.course_by_id.clear();
        self.course_by_code.clear();
        self.course_listing.clear();
        self.instructor_by_id.clear();
        self.instructor_listing.clear();
        self.enrollment_by_id.clear();
        self.enrollments_by_student.clear();
        self.enrollments_by_course.clear();
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}
