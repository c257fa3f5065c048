//! Field constraints for contact submissions and projects.
//!
//! Each validator trims its input, checks it, and returns the normalized
//! value. The record-level functions collect every field error before
//! failing so clients can fix a form in one round trip.

use url::Url;

use crate::error::{AppError, AppResult, FieldError};
use crate::models::{CreateContactRequest, CreateProjectRequest, NewContact, NewProject};

// =============================================================================
// Validation Constants
// =============================================================================

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_SUBJECT_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// RFC 5321 path limit.
pub const MAX_EMAIL_LENGTH: usize = 254;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_TECHNOLOGIES: usize = 20;
pub const MAX_TECHNOLOGY_LENGTH: usize = 50;
pub const MAX_URL_LENGTH: usize = 2048;

/// Validate and normalize a contact form submission.
pub fn validate_contact(request: CreateContactRequest) -> AppResult<NewContact> {
    let mut errors = Vec::new();

    let name = collect(
        &mut errors,
        validate_text("name", "Name", &request.name, MAX_NAME_LENGTH),
    );
    let email = collect(&mut errors, validate_email(&request.email));
    let subject = collect(
        &mut errors,
        validate_text("subject", "Subject", &request.subject, MAX_SUBJECT_LENGTH),
    );
    let message = collect(
        &mut errors,
        validate_text("message", "Message", &request.message, MAX_MESSAGE_LENGTH),
    );

    match (name, email, subject, message) {
        (Some(name), Some(email), Some(subject), Some(message)) if errors.is_empty() => {
            Ok(NewContact {
                name,
                email,
                subject,
                message,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

/// Validate and normalize a new project.
pub fn validate_project(request: CreateProjectRequest) -> AppResult<NewProject> {
    let mut errors = Vec::new();

    let title = collect(
        &mut errors,
        validate_text("title", "Title", &request.title, MAX_TITLE_LENGTH),
    );
    let description = collect(
        &mut errors,
        validate_text(
            "description",
            "Description",
            &request.description,
            MAX_DESCRIPTION_LENGTH,
        ),
    );
    let technologies = validate_technologies(&request.technologies)
        .map_err(|tech_errors| errors.extend(tech_errors))
        .ok();
    let image_url = collect(
        &mut errors,
        validate_http_url("imageUrl", request.image_url.as_deref()),
    );
    let project_url = collect(
        &mut errors,
        validate_http_url("projectUrl", request.project_url.as_deref()),
    );

    match (title, description, technologies, image_url, project_url) {
        (Some(title), Some(description), Some(technologies), Some(image_url), Some(project_url))
            if errors.is_empty() =>
        {
            Ok(NewProject {
                title,
                description,
                technologies,
                image_url,
                project_url,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

/// Validate a required free-text field.
///
/// Rules:
/// - Leading/trailing whitespace is removed
/// - Must not be empty after trimming
/// - Must not exceed `max_chars` characters (not bytes)
pub fn validate_text(
    field: &str,
    label: &str,
    value: &str,
    max_chars: usize,
) -> Result<String, FieldError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(FieldError::new(field, format!("{label} is required")));
    }

    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(FieldError::new(
            field,
            format!("{label} cannot exceed {max_chars} characters (got {len})"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validate an email address and return it lowercased.
///
/// The check is structural (`local@domain.tld`, no whitespace); deliverability
/// is not verified.
pub fn validate_email(value: &str) -> Result<String, FieldError> {
    const FIELD: &str = "email";
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(FieldError::new(FIELD, "Email is required"));
    }

    if trimmed.chars().count() > MAX_EMAIL_LENGTH {
        return Err(FieldError::new(
            FIELD,
            format!("Email cannot exceed {MAX_EMAIL_LENGTH} characters"),
        ));
    }

    let invalid = || FieldError::new(FIELD, "Please provide a valid email address");

    if trimmed.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = trimmed.rsplit_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");

    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }

    Ok(trimmed.to_lowercase())
}

/// Validate the technology tags of a project.
///
/// Every bad entry is reported under its own `technologies[i]` field.
pub fn validate_technologies(values: &[String]) -> Result<Vec<String>, Vec<FieldError>> {
    const FIELD: &str = "technologies";

    if values.len() > MAX_TECHNOLOGIES {
        return Err(vec![FieldError::new(
            FIELD,
            format!("At most {MAX_TECHNOLOGIES} technologies are allowed"),
        )]);
    }

    let mut technologies = Vec::with_capacity(values.len());
    let mut errors = Vec::new();

    for (index, tech) in values.iter().enumerate() {
        match validate_text(
            &format!("{FIELD}[{index}]"),
            "Technology",
            tech,
            MAX_TECHNOLOGY_LENGTH,
        ) {
            Ok(tech) => technologies.push(tech),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(technologies)
    } else {
        Err(errors)
    }
}

/// Validate an optional absolute `http`/`https` URL.
///
/// `None` and blank strings both mean "not provided".
pub fn validate_http_url(field: &str, value: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(trimmed) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if trimmed.chars().count() > MAX_URL_LENGTH {
        return Err(FieldError::new(
            field,
            format!("URL cannot exceed {MAX_URL_LENGTH} characters"),
        ));
    }

    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Ok(Some(trimmed.to_string()))
        }
        _ => Err(FieldError::new(
            field,
            "Must be an absolute http(s) URL",
        )),
    }
}
