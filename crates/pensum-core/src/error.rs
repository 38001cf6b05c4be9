//! Error currency for the catalog core

use crate::model::{CourseId, StudentId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A write referenced an id that does not resolve. Reads report absence
    /// as `Ok(None)` instead.
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i64 },

    #[error("adding {prerequisite} as a prerequisite of {course} would close a cycle")]
    CircularPrerequisite {
        course: CourseId,
        prerequisite: CourseId,
    },

    #[error("student {student} is already enrolled in course {course}")]
    DuplicateEnrollment {
        student: StudentId,
        course: CourseId,
    },

    /// Optimistic save against a stale read. Reload and retry.
    #[error("course {course} was modified concurrently (saved version {expected}, store has {actual})")]
    VersionConflict {
        course: CourseId,
        expected: u64,
        actual: u64,
    },

    #[error("course {course} is still required by {dependents} course(s) and referenced by {enrollments} enrollment(s)")]
    CourseInUse {
        course: CourseId,
        dependents: usize,
        enrollments: usize,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("storage failure: {0}")]
    StoreFailure(String),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CatalogError::NotFound { entity, id }
    }
}
