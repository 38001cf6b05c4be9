//! Storage ports and the in-memory reference store

use crate::error::{CatalogError, Result};
use crate::model::{
    Course, CourseId, Enrollment, EnrollmentId, Instructor, InstructorId, Student, StudentId,
};
use crate::snapshot::{CatalogSnapshot, Sequences};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Course persistence port. `insert_*` assigns the id; `save_course` is the
/// optimistic-locking point and the only place a version is checked.
pub trait CourseStore {
    fn find_course(&self, id: CourseId) -> Result<Option<Course>>;
    fn find_course_by_code(&self, code: &str) -> Result<Option<Course>>;
    fn all_courses(&self) -> Result<Vec<Course>>;
    fn insert_course(&self, course: Course) -> Result<Course>;
    fn save_course(&self, course: &Course) -> Result<Course>;
    fn delete_course(&self, id: CourseId) -> Result<bool>;
}

pub trait InstructorStore {
    fn find_instructor(&self, id: InstructorId) -> Result<Option<Instructor>>;
    fn find_instructor_by_employee_number(&self, number: &str) -> Result<Option<Instructor>>;
    fn all_instructors(&self) -> Result<Vec<Instructor>>;
    fn insert_instructor(&self, instructor: Instructor) -> Result<Instructor>;
    fn save_instructor(&self, instructor: &Instructor) -> Result<Instructor>;
    fn delete_instructor(&self, id: InstructorId) -> Result<bool>;
}

pub trait StudentStore {
    fn find_student(&self, id: StudentId) -> Result<Option<Student>>;
    fn find_student_by_enrollment_number(&self, number: &str) -> Result<Option<Student>>;
    fn all_students(&self) -> Result<Vec<Student>>;
    fn insert_student(&self, student: Student) -> Result<Student>;
    fn save_student(&self, student: &Student) -> Result<Student>;
}

/// Enrollment persistence port. The (student, course) pair is unique;
/// `insert_enrollment` performs the existence check and the insert as one
/// operation, so a racing duplicate loses even if the caller's own
/// pre-check passed.
pub trait EnrollmentStore {
    fn find_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>>;
    fn all_enrollments(&self) -> Result<Vec<Enrollment>>;
    fn enrollments_by_student(&self, student: StudentId) -> Result<Vec<Enrollment>>;
    fn enrollments_by_course(&self, course: CourseId) -> Result<Vec<Enrollment>>;
    fn enrollment_pair_exists(&self, student: StudentId, course: CourseId) -> Result<bool>;
    fn insert_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment>;
    fn save_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment>;
    fn delete_enrollment(&self, id: EnrollmentId) -> Result<bool>;
}

/// The full storage seam the services operate against.
pub trait CatalogStore:
    CourseStore + InstructorStore + StudentStore + EnrollmentStore + Send + Sync
{
}

impl<T> CatalogStore for T where
    T: CourseStore + InstructorStore + StudentStore + EnrollmentStore + Send + Sync
{
}

/// In-memory store: one table per entity family plus unique-key indices.
///
/// Row mutations go through `get_mut`, so a writer holds the row's shard
/// lock across its check-and-write; that is what serializes concurrent
/// course saves for the version check.
pub struct MemoryStore {
    courses: DashMap<CourseId, Course>,
    course_codes: DashMap<String, CourseId>,
    instructors: DashMap<InstructorId, Instructor>,
    employee_numbers: DashMap<String, InstructorId>,
    students: DashMap<StudentId, Student>,
    student_numbers: DashMap<String, StudentId>,
    enrollments: DashMap<EnrollmentId, Enrollment>,
    enrollment_pairs: DashMap<(StudentId, CourseId), EnrollmentId>,
    course_seq: AtomicI64,
    instructor_seq: AtomicI64,
    student_seq: AtomicI64,
    enrollment_seq: AtomicI64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("courses", &self.courses.len())
            .field("instructors", &self.instructors.len())
            .field("students", &self.students.len())
            .field("enrollments", &self.enrollments.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            courses: DashMap::new(),
            course_codes: DashMap::new(),
            instructors: DashMap::new(),
            employee_numbers: DashMap::new(),
            students: DashMap::new(),
            student_numbers: DashMap::new(),
            enrollments: DashMap::new(),
            enrollment_pairs: DashMap::new(),
            course_seq: AtomicI64::new(0),
            instructor_seq: AtomicI64::new(0),
            student_seq: AtomicI64::new(0),
            enrollment_seq: AtomicI64::new(0),
        }
    }

    fn next_id(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reserve a unique-key index slot, failing on collision. The entry
    /// guard is dropped before any other map is touched.
    fn claim_index<K: Eq + std::hash::Hash, V: Copy>(
        index: &DashMap<K, V>,
        key: K,
        value: V,
        what: &str,
    ) -> Result<()> {
        match index.entry(key) {
            Entry::Occupied(_) => Err(CatalogError::StoreFailure(format!(
                "unique constraint violated: {what} already exists"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Export the full catalog, sequences included.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let mut snap = CatalogSnapshot {
            saved_at: String::new(),
            courses: self.courses.iter().map(|r| r.value().clone()).collect(),
            instructors: self.instructors.iter().map(|r| r.value().clone()).collect(),
            students: self.students.iter().map(|r| r.value().clone()).collect(),
            enrollments: self.enrollments.iter().map(|r| r.value().clone()).collect(),
            sequences: Sequences {
                courses: self.course_seq.load(Ordering::SeqCst),
                instructors: self.instructor_seq.load(Ordering::SeqCst),
                students: self.student_seq.load(Ordering::SeqCst),
                enrollments: self.enrollment_seq.load(Ordering::SeqCst),
            },
        };
        snap.courses.sort_by_key(|c| c.id);
        snap.instructors.sort_by_key(|i| i.id);
        snap.students.sort_by_key(|s| s.id);
        snap.enrollments.sort_by_key(|e| e.id);
        snap
    }

    /// Rebuild a store, indices included, from an exported snapshot.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let store = MemoryStore::new();
        let mut max_course = 0;
        for course in snapshot.courses {
            max_course = max_course.max(course.id.0);
            store.course_codes.insert(course.code.clone(), course.id);
            store.courses.insert(course.id, course);
        }
        let mut max_instructor = 0;
        for instructor in snapshot.instructors {
            max_instructor = max_instructor.max(instructor.id.0);
            store
                .employee_numbers
                .insert(instructor.employee_number.clone(), instructor.id);
            store.instructors.insert(instructor.id, instructor);
        }
        let mut max_student = 0;
        for student in snapshot.students {
            max_student = max_student.max(student.id.0);
            store
                .student_numbers
                .insert(student.enrollment_number.clone(), student.id);
            store.students.insert(student.id, student);
        }
        let mut max_enrollment = 0;
        for enrollment in snapshot.enrollments {
            max_enrollment = max_enrollment.max(enrollment.id.0);
            store
                .enrollment_pairs
                .insert((enrollment.student, enrollment.course), enrollment.id);
            store.enrollments.insert(enrollment.id, enrollment);
        }
        store
            .course_seq
            .store(snapshot.sequences.courses.max(max_course), Ordering::SeqCst);
        store.instructor_seq.store(
            snapshot.sequences.instructors.max(max_instructor),
            Ordering::SeqCst,
        );
        store
            .student_seq
            .store(snapshot.sequences.students.max(max_student), Ordering::SeqCst);
        store.enrollment_seq.store(
            snapshot.sequences.enrollments.max(max_enrollment),
            Ordering::SeqCst,
        );
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseStore for MemoryStore {
    fn find_course(&self, id: CourseId) -> Result<Option<Course>> {
        Ok(self.courses.get(&id).map(|r| r.value().clone()))
    }

    fn find_course_by_code(&self, code: &str) -> Result<Option<Course>> {
        // copy the id out so the index guard is released before the row read
        let id = self.course_codes.get(code).map(|r| *r.value());
        match id {
            Some(id) => self.find_course(id),
            None => Ok(None),
        }
    }

    fn all_courses(&self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self.courses.iter().map(|r| r.value().clone()).collect();
        courses.sort_by_key(|c| c.id);
        Ok(courses)
    }

    fn insert_course(&self, mut course: Course) -> Result<Course> {
        let id = CourseId(Self::next_id(&self.course_seq));
        course.id = id;
        course.version = 0;
        Self::claim_index(
            &self.course_codes,
            course.code.clone(),
            id,
            &format!("course code {:?}", course.code),
        )?;
        self.courses.insert(id, course.clone());
        Ok(course)
    }

    fn save_course(&self, course: &Course) -> Result<Course> {
        let mut slot = self
            .courses
            .get_mut(&course.id)
            .ok_or_else(|| CatalogError::not_found("course", course.id.0))?;
        if slot.version != course.version {
            return Err(CatalogError::VersionConflict {
                course: course.id,
                expected: course.version,
                actual: slot.version,
            });
        }
        if slot.code != course.code {
            Self::claim_index(
                &self.course_codes,
                course.code.clone(),
                course.id,
                &format!("course code {:?}", course.code),
            )?;
            self.course_codes.remove(&slot.code);
        }
        let mut stored = course.clone();
        stored.version = slot.version + 1;
        *slot = stored.clone();
        Ok(stored)
    }

    fn delete_course(&self, id: CourseId) -> Result<bool> {
        match self.courses.remove(&id) {
            Some((_, course)) => {
                self.course_codes.remove(&course.code);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl InstructorStore for MemoryStore {
    fn find_instructor(&self, id: InstructorId) -> Result<Option<Instructor>> {
        Ok(self.instructors.get(&id).map(|r| r.value().clone()))
    }

    fn find_instructor_by_employee_number(&self, number: &str) -> Result<Option<Instructor>> {
        let id = self.employee_numbers.get(number).map(|r| *r.value());
        match id {
            Some(id) => self.find_instructor(id),
            None => Ok(None),
        }
    }

    fn all_instructors(&self) -> Result<Vec<Instructor>> {
        let mut instructors: Vec<Instructor> =
            self.instructors.iter().map(|r| r.value().clone()).collect();
        instructors.sort_by_key(|i| i.id);
        Ok(instructors)
    }

    fn insert_instructor(&self, mut instructor: Instructor) -> Result<Instructor> {
        let id = InstructorId(Self::next_id(&self.instructor_seq));
        instructor.id = id;
        Self::claim_index(
            &self.employee_numbers,
            instructor.employee_number.clone(),
            id,
            &format!("employee number {:?}", instructor.employee_number),
        )?;
        self.instructors.insert(id, instructor.clone());
        Ok(instructor)
    }

    fn save_instructor(&self, instructor: &Instructor) -> Result<Instructor> {
        let mut slot = self
            .instructors
            .get_mut(&instructor.id)
            .ok_or_else(|| CatalogError::not_found("instructor", instructor.id.0))?;
        if slot.employee_number != instructor.employee_number {
            Self::claim_index(
                &self.employee_numbers,
                instructor.employee_number.clone(),
                instructor.id,
                &format!("employee number {:?}", instructor.employee_number),
            )?;
            self.employee_numbers.remove(&slot.employee_number);
        }
        *slot = instructor.clone();
        Ok(instructor.clone())
    }

    fn delete_instructor(&self, id: InstructorId) -> Result<bool> {
        match self.instructors.remove(&id) {
            Some((_, instructor)) => {
                self.employee_numbers.remove(&instructor.employee_number);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl StudentStore for MemoryStore {
    fn find_student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self.students.get(&id).map(|r| r.value().clone()))
    }

    fn find_student_by_enrollment_number(&self, number: &str) -> Result<Option<Student>> {
        let id = self.student_numbers.get(number).map(|r| *r.value());
        match id {
            Some(id) => self.find_student(id),
            None => Ok(None),
        }
    }

    fn all_students(&self) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self.students.iter().map(|r| r.value().clone()).collect();
        students.sort_by_key(|s| s.id);
        Ok(students)
    }

    fn insert_student(&self, mut student: Student) -> Result<Student> {
        let id = StudentId(Self::next_id(&self.student_seq));
        student.id = id;
        Self::claim_index(
            &self.student_numbers,
            student.enrollment_number.clone(),
            id,
            &format!("enrollment number {:?}", student.enrollment_number),
        )?;
        self.students.insert(id, student.clone());
        Ok(student)
    }

    fn save_student(&self, student: &Student) -> Result<Student> {
        let mut slot = self
            .students
            .get_mut(&student.id)
            .ok_or_else(|| CatalogError::not_found("student", student.id.0))?;
        if slot.enrollment_number != student.enrollment_number {
            Self::claim_index(
                &self.student_numbers,
                student.enrollment_number.clone(),
                student.id,
                &format!("enrollment number {:?}", student.enrollment_number),
            )?;
            self.student_numbers.remove(&slot.enrollment_number);
        }
        *slot = student.clone();
        Ok(student.clone())
    }
}

impl EnrollmentStore for MemoryStore {
    fn find_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
        Ok(self.enrollments.get(&id).map(|r| r.value().clone()))
    }

    fn all_enrollments(&self) -> Result<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> =
            self.enrollments.iter().map(|r| r.value().clone()).collect();
        enrollments.sort_by_key(|e| e.id);
        Ok(enrollments)
    }

    fn enrollments_by_student(&self, student: StudentId) -> Result<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = self
            .enrollments
            .iter()
            .filter(|r| r.value().student == student)
            .map(|r| r.value().clone())
            .collect();
        enrollments.sort_by_key(|e| e.id);
        Ok(enrollments)
    }

    fn enrollments_by_course(&self, course: CourseId) -> Result<Vec<Enrollment>> {
        let mut enrollments: Vec<Enrollment> = self
            .enrollments
            .iter()
            .filter(|r| r.value().course == course)
            .map(|r| r.value().clone())
            .collect();
        enrollments.sort_by_key(|e| e.id);
        Ok(enrollments)
    }

    fn enrollment_pair_exists(&self, student: StudentId, course: CourseId) -> Result<bool> {
        Ok(self.enrollment_pairs.contains_key(&(student, course)))
    }

    fn insert_enrollment(&self, mut enrollment: Enrollment) -> Result<Enrollment> {
        let id = EnrollmentId(Self::next_id(&self.enrollment_seq));
        enrollment.id = id;
        match self
            .enrollment_pairs
            .entry((enrollment.student, enrollment.course))
        {
            Entry::Occupied(_) => {
                return Err(CatalogError::DuplicateEnrollment {
                    student: enrollment.student,
                    course: enrollment.course,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        self.enrollments.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    fn save_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment> {
        let old_pair = {
            let existing = self
                .enrollments
                .get(&enrollment.id)
                .ok_or_else(|| CatalogError::not_found("enrollment", enrollment.id.0))?;
            (existing.student, existing.course)
        };
        let new_pair = (enrollment.student, enrollment.course);
        if old_pair != new_pair {
            match self.enrollment_pairs.entry(new_pair) {
                Entry::Occupied(_) => {
                    return Err(CatalogError::DuplicateEnrollment {
                        student: enrollment.student,
                        course: enrollment.course,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(enrollment.id);
                }
            }
            self.enrollment_pairs.remove(&old_pair);
        }
        self.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment.clone())
    }

    fn delete_enrollment(&self, id: EnrollmentId) -> Result<bool> {
        match self.enrollments.remove(&id) {
            Some((_, enrollment)) => {
                self.enrollment_pairs
                    .remove(&(enrollment.student, enrollment.course));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
