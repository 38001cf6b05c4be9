//! CLI command implementations

use pensum_core::model::{
    CourseDraft, CourseId, EnrollmentDraft, EnrollmentId, InstructorDraft, InstructorId,
    StudentDraft, StudentId,
};
use pensum_core::{load_catalog, save_catalog, CatalogCache, MemoryStore};
use pensum_service::{CourseService, EnrollmentService, InstructorService, StudentService};
use std::path::Path;
use std::sync::Arc;

use crate::{CourseCommands, EnrollCommands, InstructorCommands, PrereqCommands, StudentCommands};

/// Load the catalog snapshot (or start empty) with a fresh cache.
fn open(root: &Path) -> anyhow::Result<(Arc<MemoryStore>, Arc<CatalogCache>)> {
    let store = load_catalog(root)?.unwrap_or_default();
    Ok((Arc::new(store), Arc::new(CatalogCache::new())))
}

pub fn course(root: &Path, command: CourseCommands) -> anyhow::Result<()> {
    let (store, cache) = open(root)?;
    let service = CourseService::new(Arc::clone(&store), Arc::clone(&cache));

    match command {
        CourseCommands::List => {
            for course in service.list()? {
                println!(
                    "{:>4}  {:<10}  {:<32}  {} cr",
                    course.id, course.code, course.name, course.credits
                );
            }
            return Ok(());
        }
        CourseCommands::Show { id } => {
            let id = CourseId(id);
            match service.get(id)? {
                None => println!("course {id} not found"),
                Some(course) => {
                    println!("{}  {}  ({} cr)", course.code, course.name, course.credits);
                    if !course.prerequisites.is_empty() {
                        let direct: Vec<String> =
                            course.prerequisites.iter().map(|p| p.to_string()).collect();
                        println!("  requires: {}", direct.join(", "));
                    }
                    if !course.is_prerequisite_of.is_empty() {
                        let dependents: Vec<String> = course
                            .is_prerequisite_of
                            .iter()
                            .map(|d| d.to_string())
                            .collect();
                        println!("  required by: {}", dependents.join(", "));
                    }
                    if !course.instructors.is_empty() {
                        let instructors: Vec<String> =
                            course.instructors.iter().map(|i| i.to_string()).collect();
                        println!("  taught by: {}", instructors.join(", "));
                    }
                    let closure = service.transitive_prerequisites(id)?;
                    if !closure.is_empty() {
                        let codes: Vec<&str> = closure.iter().map(|c| c.code.as_str()).collect();
                        println!("  full chain: {}", codes.join(" <- "));
                    }
                }
            }
            return Ok(());
        }
        CourseCommands::Add {
            name,
            code,
            credits,
        } => {
            let created = service.create(&CourseDraft {
                name,
                code,
                credits,
            })?;
            println!("created course {} ({})", created.id, created.code);
        }
        CourseCommands::Update {
            id,
            name,
            code,
            credits,
        } => {
            let saved = service.update(
                CourseId(id),
                &CourseDraft {
                    name,
                    code,
                    credits,
                },
            )?;
            println!("updated course {} ({})", saved.id, saved.code);
        }
        CourseCommands::Rm { id } => {
            service.delete(CourseId(id))?;
            println!("deleted course {id}");
        }
        CourseCommands::Prereq { command } => match command {
            PrereqCommands::Add { course, prereq } => {
                service.add_prerequisite(CourseId(course), CourseId(prereq))?;
                println!("course {prereq} is now a prerequisite of {course}");
            }
            PrereqCommands::Rm { course, prereq } => {
                service.remove_prerequisite(CourseId(course), CourseId(prereq))?;
                println!("course {prereq} is no longer a prerequisite of {course}");
            }
            PrereqCommands::Check { course, prereq } => {
                let cycle = service.would_form_cycle(CourseId(course), CourseId(prereq))?;
                if cycle {
                    println!("adding {prereq} as a prerequisite of {course} would close a cycle");
                } else {
                    println!("no cycle: {prereq} can be a prerequisite of {course}");
                }
                return Ok(());
            }
        },
        CourseCommands::Assign { course, instructor } => {
            service.assign_instructor(CourseId(course), InstructorId(instructor))?;
            println!("instructor {instructor} assigned to course {course}");
        }
        CourseCommands::Unassign { course, instructor } => {
            service.unassign_instructor(CourseId(course), InstructorId(instructor))?;
            println!("instructor {instructor} unassigned from course {course}");
        }
    }

    save_catalog(&store, root)
}

pub fn instructor(root: &Path, command: InstructorCommands) -> anyhow::Result<()> {
    let (store, cache) = open(root)?;
    let service = InstructorService::new(Arc::clone(&store), Arc::clone(&cache));

    match command {
        InstructorCommands::List => {
            for instructor in service.list()? {
                println!(
                    "{:>4}  {:<10}  {} {}  ({})",
                    instructor.id,
                    instructor.employee_number,
                    instructor.first_name,
                    instructor.last_name,
                    instructor.department
                );
            }
            return Ok(());
        }
        InstructorCommands::Add {
            employee_number,
            first_name,
            last_name,
            email,
            birth_date,
            department,
        } => {
            let created = service.create(&InstructorDraft {
                employee_number,
                first_name,
                last_name,
                email,
                birth_date,
                department,
            })?;
            println!(
                "created instructor {} ({})",
                created.id, created.employee_number
            );
        }
        InstructorCommands::Rm { id } => {
            service.delete(InstructorId(id))?;
            println!("deleted instructor {id}");
        }
    }

    save_catalog(&store, root)
}

pub fn student(root: &Path, command: StudentCommands) -> anyhow::Result<()> {
    let (store, _cache) = open(root)?;
    let service = StudentService::new(Arc::clone(&store));

    match command {
        StudentCommands::List { active } => {
            let students = if active {
                service.list_active()?
            } else {
                service.list()?
            };
            for student in students {
                println!(
                    "{:>4}  {:<10}  {} {}  [{}]",
                    student.id,
                    student.enrollment_number,
                    student.first_name,
                    student.last_name,
                    if student.is_active() {
                        "active"
                    } else {
                        "inactive"
                    }
                );
            }
            return Ok(());
        }
        StudentCommands::Add {
            enrollment_number,
            first_name,
            last_name,
            email,
            birth_date,
        } => {
            let created = service.create(&StudentDraft {
                enrollment_number,
                first_name,
                last_name,
                email,
                birth_date,
            })?;
            println!(
                "created student {} ({})",
                created.id, created.enrollment_number
            );
        }
        StudentCommands::Deactivate { id, reason } => {
            service.deactivate(StudentId(id), &reason)?;
            println!("student {id} deactivated");
        }
    }

    save_catalog(&store, root)
}

pub fn enroll(root: &Path, command: EnrollCommands) -> anyhow::Result<()> {
    let (store, cache) = open(root)?;
    let service = EnrollmentService::new(Arc::clone(&store), Arc::clone(&cache));

    match command {
        EnrollCommands::Add {
            student,
            course,
            date,
            status,
            grade,
        } => {
            let created = service.create(&EnrollmentDraft {
                student: StudentId(student),
                course: CourseId(course),
                enrolled_on: date,
                status,
                grade,
            })?;
            println!(
                "enrollment {} created: student {} in course {} ({})",
                created.id, created.student, created.course, created.status
            );
        }
        EnrollCommands::List { student, course } => {
            let enrollments = match (student, course) {
                (Some(student), _) => service.list_by_student(StudentId(student))?,
                (None, Some(course)) => service.list_by_course(CourseId(course))?,
                (None, None) => service.list()?,
            };
            for enrollment in enrollments {
                let grade = enrollment
                    .grade
                    .map(|g| format!("  grade {g}"))
                    .unwrap_or_default();
                println!(
                    "{:>4}  student {:>4}  course {:>4}  {}  {}{}",
                    enrollment.id,
                    enrollment.student,
                    enrollment.course,
                    enrollment.enrolled_on,
                    enrollment.status,
                    grade
                );
            }
            return Ok(());
        }
        EnrollCommands::Rm { id } => {
            service.delete(EnrollmentId(id))?;
            println!("deleted enrollment {id}");
        }
    }

    save_catalog(&store, root)
}

pub fn clear(root: &Path) -> anyhow::Result<()> {
    tracing::info!("clearing catalog data under: {}", root.display());
    pensum_core::clear_data(root)?;
    println!("catalog data removed");
    Ok(())
}
