//! Pensum CLI entry point

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pensum_core::model::EnrollmentStatus;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "pensum")]
#[command(about = "Academic catalog with prerequisite-graph integrity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Data root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Course catalog operations
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Instructor roster operations
    Instructor {
        #[command(subcommand)]
        command: InstructorCommands,
    },
    /// Student roster operations
    Student {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Enrollment operations
    Enroll {
        #[command(subcommand)]
        command: EnrollCommands,
    },
    /// Remove the data directory
    Clear,
    /// Show version
    Version,
}

#[derive(Subcommand)]
pub enum CourseCommands {
    /// List every course
    List,
    /// Show one course, its edges, and its transitive prerequisites
    Show { id: i64 },
    /// Register a new course
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        credits: u32,
    },
    /// Overwrite a course's name, code, and credits
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        credits: u32,
    },
    /// Delete a course nothing depends on
    Rm { id: i64 },
    /// Prerequisite edge operations
    Prereq {
        #[command(subcommand)]
        command: PrereqCommands,
    },
    /// Assign an instructor to a course
    Assign { course: i64, instructor: i64 },
    /// Unassign an instructor from a course
    Unassign { course: i64, instructor: i64 },
}

#[derive(Subcommand)]
pub enum PrereqCommands {
    /// Record that `prereq` must be completed before `course`
    Add { course: i64, prereq: i64 },
    /// Remove a prerequisite edge
    Rm { course: i64, prereq: i64 },
    /// Ask whether the edge would close a cycle, without writing anything
    Check { course: i64, prereq: i64 },
}

#[derive(Subcommand)]
pub enum InstructorCommands {
    /// List every instructor
    List,
    /// Register a new instructor
    Add {
        #[arg(long)]
        employee_number: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        birth_date: NaiveDate,
        #[arg(long)]
        department: String,
    },
    /// Delete an instructor, unassigning it everywhere
    Rm { id: i64 },
}

#[derive(Subcommand)]
pub enum StudentCommands {
    /// List students
    List {
        /// Only active students
        #[arg(long)]
        active: bool,
    },
    /// Register a new student
    Add {
        #[arg(long)]
        enrollment_number: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        birth_date: NaiveDate,
    },
    /// Flip a student to inactive, recording the reason
    Deactivate { id: i64, reason: String },
}

#[derive(Subcommand)]
pub enum EnrollCommands {
    /// Enroll a student in a course
    Add {
        student: i64,
        course: i64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        status: Option<EnrollmentStatus>,
        #[arg(long)]
        grade: Option<f64>,
    },
    /// List enrollments, optionally narrowed to one student or course
    List {
        #[arg(long)]
        student: Option<i64>,
        #[arg(long)]
        course: Option<i64>,
    },
    /// Delete an enrollment
    Rm { id: i64 },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "pensum={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Course { command } => commands::course(&cli.root, command),
        Commands::Instructor { command } => commands::instructor(&cli.root, command),
        Commands::Student { command } => commands::student(&cli.root, command),
        Commands::Enroll { command } => commands::enroll(&cli.root, command),
        Commands::Clear => commands::clear(&cli.root),
        Commands::Version => {
            println!("Pensum v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
