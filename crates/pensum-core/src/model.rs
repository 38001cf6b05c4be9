//! Core data structures for the academic catalog

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique, store-assigned identifier for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct CourseId(pub i64);

/// Unique, store-assigned identifier for an instructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct InstructorId(pub i64);

/// Unique, store-assigned identifier for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StudentId(pub i64);

/// Unique, store-assigned identifier for an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EnrollmentId(pub i64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for InstructorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A course in the catalog.
///
/// The two prerequisite sets are mirror views of the same edge relation:
/// `b ∈ a.prerequisites` iff `a ∈ b.is_prerequisite_of`. Both sides are kept
/// in sync by the course service; neither is ever overwritten wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Unique human-readable code, e.g. "MAT-101".
    pub code: String,
    pub credits: u32,
    /// Optimistic version counter, bumped by the store on every save.
    pub version: u64,
    /// Courses this course depends on (outgoing edges).
    pub prerequisites: BTreeSet<CourseId>,
    /// Courses that depend on this course (incoming edges).
    pub is_prerequisite_of: BTreeSet<CourseId>,
    pub instructors: BTreeSet<InstructorId>,
}

/// Caller-settable course fields; everything else is managed by the store
/// and the edge-mutation operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseDraft {
    pub name: String,
    pub code: String,
    pub credits: u32,
}

impl Course {
    /// Build a fresh course row from a draft. Id and version are placeholders
    /// until the store assigns them.
    pub fn from_draft(draft: &CourseDraft) -> Self {
        Course {
            id: CourseId::default(),
            name: draft.name.clone(),
            code: draft.code.clone(),
            credits: draft.credits,
            version: 0,
            prerequisites: BTreeSet::new(),
            is_prerequisite_of: BTreeSet::new(),
            instructors: BTreeSet::new(),
        }
    }
}

/// An instructor employable across many courses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instructor {
    pub id: InstructorId,
    /// Unique employee number.
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub department: String,
    /// Courses this instructor teaches (inverse of `Course::instructors`).
    pub courses: BTreeSet<CourseId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructorDraft {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub department: String,
}

impl Instructor {
    pub fn from_draft(draft: &InstructorDraft) -> Self {
        Instructor {
            id: InstructorId::default(),
            employee_number: draft.employee_number.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            birth_date: draft.birth_date,
            department: draft.department.clone(),
            courses: BTreeSet::new(),
        }
    }
}

/// Whether a student is currently part of the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

/// A student. Students are never physically removed; deactivation flips the
/// status and records the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: StudentId,
    /// Unique admission number.
    pub enrollment_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub status: StudentStatus,
    pub inactive_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentDraft {
    pub enrollment_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
}

impl Student {
    pub fn from_draft(draft: &StudentDraft) -> Self {
        Student {
            id: StudentId::default(),
            enrollment_number: draft.enrollment_number.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            email: draft.email.clone(),
            birth_date: draft.birth_date,
            status: StudentStatus::Active,
            inactive_reason: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

/// Enrollment lifecycle. Starts at `activo`, moves through `cursando` into
/// one of the terminal grades; transition legality is not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    Activo,
    Cursando,
    Aprobado,
    Reprobado,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Activo => "activo",
            EnrollmentStatus::Cursando => "cursando",
            EnrollmentStatus::Aprobado => "aprobado",
            EnrollmentStatus::Reprobado => "reprobado",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activo" => Ok(EnrollmentStatus::Activo),
            "cursando" => Ok(EnrollmentStatus::Cursando),
            "aprobado" => Ok(EnrollmentStatus::Aprobado),
            "reprobado" => Ok(EnrollmentStatus::Reprobado),
            other => Err(crate::error::CatalogError::Invalid {
                field: "status",
                reason: format!("unknown enrollment status {other:?}"),
            }),
        }
    }
}

/// A student's registration in a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student: StudentId,
    pub course: CourseId,
    pub enrolled_on: NaiveDate,
    pub status: EnrollmentStatus,
    pub grade: Option<f64>,
}

/// Caller-settable enrollment fields. `enrolled_on` and `status` fall back
/// to today / `activo` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentDraft {
    pub student: StudentId,
    pub course: CourseId,
    pub enrolled_on: Option<NaiveDate>,
    pub status: Option<EnrollmentStatus>,
    pub grade: Option<f64>,
}
