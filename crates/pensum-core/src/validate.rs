//! Field-level validation for incoming drafts

use crate::error::{CatalogError, Result};
use crate::model::{CourseDraft, InstructorDraft, StudentDraft};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

fn require_nonblank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Invalid {
            field,
            reason: "must not be blank".to_string(),
        });
    }
    Ok(())
}

fn require_email(field: &'static str, value: &str) -> Result<()> {
    require_nonblank(field, value)?;
    if !EMAIL_RE.is_match(value) {
        return Err(CatalogError::Invalid {
            field,
            reason: format!("{value:?} is not a valid email address"),
        });
    }
    Ok(())
}

fn require_past(field: &'static str, date: NaiveDate) -> Result<()> {
    let today = chrono::Utc::now().date_naive();
    if date >= today {
        return Err(CatalogError::Invalid {
            field,
            reason: format!("{date} is not in the past"),
        });
    }
    Ok(())
}

pub fn validate_course(draft: &CourseDraft) -> Result<()> {
    require_nonblank("name", &draft.name)?;
    require_nonblank("code", &draft.code)?;
    if draft.credits == 0 {
        return Err(CatalogError::Invalid {
            field: "credits",
            reason: "must be a positive number".to_string(),
        });
    }
    Ok(())
}

pub fn validate_instructor(draft: &InstructorDraft) -> Result<()> {
    require_nonblank("employee_number", &draft.employee_number)?;
    require_nonblank("first_name", &draft.first_name)?;
    require_nonblank("last_name", &draft.last_name)?;
    require_email("email", &draft.email)?;
    require_past("birth_date", draft.birth_date)?;
    require_nonblank("department", &draft.department)
}

pub fn validate_student(draft: &StudentDraft) -> Result<()> {
    require_nonblank("enrollment_number", &draft.enrollment_number)?;
    require_nonblank("first_name", &draft.first_name)?;
    require_nonblank("last_name", &draft.last_name)?;
    require_email("email", &draft.email)?;
    require_past("birth_date", draft.birth_date)
}
