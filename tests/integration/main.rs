//! Integration tests for Pensum
//!
//! These run the catalog scenarios end-to-end: services over a shared store
//! and cache, the way the CLI wires them up.

use std::sync::Arc;

use chrono::NaiveDate;
use pensum_core::model::{
    CourseDraft, EnrollmentDraft, EnrollmentStatus, InstructorDraft, StudentDraft,
};
use pensum_core::{save_catalog, load_catalog, CatalogCache, CatalogError, MemoryStore};
use pensum_service::{CourseService, EnrollmentService, InstructorService, StudentService};

struct Catalog {
    store: Arc<MemoryStore>,
    cache: Arc<CatalogCache>,
}

impl Catalog {
    fn new() -> Self {
        Catalog {
            store: Arc::new(MemoryStore::new()),
            cache: Arc::new(CatalogCache::new()),
        }
    }

    fn courses(&self) -> CourseService<MemoryStore> {
        CourseService::new(Arc::clone(&self.store), Arc::clone(&self.cache))
    }

    fn instructors(&self) -> InstructorService<MemoryStore> {
        InstructorService::new(Arc::clone(&self.store), Arc::clone(&self.cache))
    }

    fn students(&self) -> StudentService<MemoryStore> {
        StudentService::new(Arc::clone(&self.store))
    }

    fn enrollments(&self) -> EnrollmentService<MemoryStore> {
        EnrollmentService::new(Arc::clone(&self.store), Arc::clone(&self.cache))
    }
}

fn course_draft(name: &str, code: &str, credits: u32) -> CourseDraft {
    CourseDraft {
        name: name.to_string(),
        code: code.to_string(),
        credits,
    }
}

fn birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1999, 3, 2).unwrap()
}

/// The prerequisite scenario: MAT-201 requires MAT-101, so the reverse edge
/// must be reported and refused as a cycle.
#[test]
fn test_prerequisite_cycle_scenario() {
    let catalog = Catalog::new();
    let courses = catalog.courses();

    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let mat201 = courses.create(&course_draft("Calculus II", "MAT-201", 4)).unwrap();

    courses.add_prerequisite(mat201.id, mat101.id).unwrap();

    assert!(courses.would_form_cycle(mat101.id, mat201.id).unwrap());
    let reverse = courses.add_prerequisite(mat101.id, mat201.id);
    assert!(matches!(
        reverse,
        Err(CatalogError::CircularPrerequisite { .. })
    ));

    // the accepted graph stays acyclic and bidirectionally consistent
    let mat201 = courses.get(mat201.id).unwrap().unwrap();
    let mat101 = courses.get(mat101.id).unwrap().unwrap();
    assert!(mat201.prerequisites.contains(&mat101.id));
    assert!(mat101.is_prerequisite_of.contains(&mat201.id));
    assert!(mat101.prerequisites.is_empty());
}

/// The enrollment scenario: a second enrollment in the same course must be
/// refused and leave the count untouched.
#[test]
fn test_duplicate_enrollment_scenario() {
    let catalog = Catalog::new();
    let courses = catalog.courses();
    let students = catalog.students();
    let enrollments = catalog.enrollments();

    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let s1 = students
        .create(&StudentDraft {
            enrollment_number: "2024-001".to_string(),
            first_name: "Sofia".to_string(),
            last_name: "Rivas".to_string(),
            email: "sofia.rivas@example.edu".to_string(),
            birth_date: birth_date(),
        })
        .unwrap();

    let draft = EnrollmentDraft {
        student: s1.id,
        course: mat101.id,
        enrolled_on: None,
        status: None,
        grade: None,
    };
    let first = enrollments.create(&draft).unwrap();
    assert_eq!(first.status, EnrollmentStatus::Activo);

    let second = enrollments.create(&draft);
    assert!(matches!(
        second,
        Err(CatalogError::DuplicateEnrollment { .. })
    ));
    assert_eq!(enrollments.list_by_course(mat101.id).unwrap().len(), 1);
}

/// Assigning the same instructor twice leaves exactly one assignment.
#[test]
fn test_repeated_assignment_scenario() {
    let catalog = Catalog::new();
    let courses = catalog.courses();
    let instructors = catalog.instructors();

    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let d1 = instructors
        .create(&InstructorDraft {
            employee_number: "EMP-1905".to_string(),
            first_name: "Elena".to_string(),
            last_name: "Quiroga".to_string(),
            email: "elena.quiroga@example.edu".to_string(),
            birth_date: birth_date(),
            department: "Mathematics".to_string(),
        })
        .unwrap();

    courses.assign_instructor(mat101.id, d1.id).unwrap();
    let course = courses.assign_instructor(mat101.id, d1.id).unwrap();

    assert_eq!(course.instructors.len(), 1);
    assert!(course.instructors.contains(&d1.id));
}

/// Cached reads must reflect every mutation immediately, across services.
#[test]
fn test_cache_coherence_across_services() {
    let catalog = Catalog::new();
    let courses = catalog.courses();

    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let mat201 = courses.create(&course_draft("Calculus II", "MAT-201", 4)).unwrap();

    // warm every course cache family
    courses.list().unwrap();
    courses.get(mat101.id).unwrap();
    courses.get_by_code("MAT-101").unwrap();

    courses.add_prerequisite(mat201.id, mat101.id).unwrap();

    let by_id = courses.get(mat101.id).unwrap().unwrap();
    assert!(by_id.is_prerequisite_of.contains(&mat201.id));
    let by_code = courses.get_by_code("MAT-101").unwrap().unwrap();
    assert!(by_code.is_prerequisite_of.contains(&mat201.id));
    let listed = courses.list().unwrap();
    let listed_201 = listed.iter().find(|c| c.id == mat201.id).unwrap();
    assert!(listed_201.prerequisites.contains(&mat101.id));
}

/// A longer chain: the graph stays acyclic through a realistic sequence of
/// edits, and deletes are refused while dependents remain.
#[test]
fn test_chain_editing_scenario() {
    let catalog = Catalog::new();
    let courses = catalog.courses();

    let c1 = courses.create(&course_draft("Algebra", "ALG-100", 3)).unwrap();
    let c2 = courses.create(&course_draft("Linear Algebra", "ALG-200", 4)).unwrap();
    let c3 = courses.create(&course_draft("Numerical Methods", "NUM-300", 5)).unwrap();

    courses.add_prerequisite(c2.id, c1.id).unwrap();
    courses.add_prerequisite(c3.id, c2.id).unwrap();

    // the tail may not become a prerequisite of the head
    assert!(courses.would_form_cycle(c1.id, c3.id).unwrap());

    // deleting the middle of the chain is refused until the edge is gone
    assert!(matches!(
        courses.delete(c2.id),
        Err(CatalogError::CourseInUse { .. })
    ));
    courses.remove_prerequisite(c3.id, c2.id).unwrap();
    courses.delete(c2.id).unwrap();

    let c1 = courses.get(c1.id).unwrap().unwrap();
    assert!(c1.is_prerequisite_of.is_empty());
    assert!(courses.would_form_cycle(c1.id, c3.id).is_ok_and(|c| !c));
}

/// The catalog survives a snapshot round trip with its graph intact.
#[test]
fn test_snapshot_round_trip_keeps_graph() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let root = temp_dir.path();

    let catalog = Catalog::new();
    let courses = catalog.courses();
    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let mat201 = courses.create(&course_draft("Calculus II", "MAT-201", 4)).unwrap();
    courses.add_prerequisite(mat201.id, mat101.id).unwrap();

    save_catalog(&catalog.store, root).unwrap();

    let reloaded = Catalog {
        store: Arc::new(load_catalog(root).unwrap().expect("snapshot present")),
        cache: Arc::new(CatalogCache::new()),
    };
    let courses = reloaded.courses();

    assert!(courses.would_form_cycle(mat101.id, mat201.id).unwrap());
    let mat201 = courses.get(mat201.id).unwrap().unwrap();
    assert!(mat201.prerequisites.contains(&mat101.id));
}

/// Deactivated students stay on file but drop out of the active listing;
/// their enrollments remain untouched.
#[test]
fn test_student_deactivation_scenario() {
    let catalog = Catalog::new();
    let courses = catalog.courses();
    let students = catalog.students();
    let enrollments = catalog.enrollments();

    let mat101 = courses.create(&course_draft("Calculus I", "MAT-101", 4)).unwrap();
    let s1 = students
        .create(&StudentDraft {
            enrollment_number: "2024-007".to_string(),
            first_name: "Bruno".to_string(),
            last_name: "Paz".to_string(),
            email: "bruno.paz@example.edu".to_string(),
            birth_date: birth_date(),
        })
        .unwrap();
    enrollments
        .create(&EnrollmentDraft {
            student: s1.id,
            course: mat101.id,
            enrolled_on: None,
            status: None,
            grade: None,
        })
        .unwrap();

    students.deactivate(s1.id, "transferred out").unwrap();

    assert!(students.list_active().unwrap().is_empty());
    assert_eq!(students.list().unwrap().len(), 1);
    assert_eq!(enrollments.list_by_student(s1.id).unwrap().len(), 1);
}
