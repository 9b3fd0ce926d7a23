/// Field constraints enforced by the services
///
/// The HTTP layer validates request shapes too, but these checks run for
/// every caller. Each function returns the first failing constraint as a
/// `ServiceError::Validation`; on success it returns the normalized value
/// (trimmed strings, lowercased emails, parsed dates).

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{ServiceError, ServiceResult};

pub const TASK_TITLE_MIN: usize = 3;
pub const TASK_TITLE_MAX: usize = 200;
pub const TASK_DESCRIPTION_MAX: usize = 1000;
pub const PROJECT_NAME_MAX: usize = 100;
pub const PROJECT_DESCRIPTION_MAX: usize = 500;
pub const COMMENT_MAX: usize = 1000;
pub const USER_NAME_MIN: usize = 2;
pub const USER_NAME_MAX: usize = 50;

/// 10 MiB
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "txt", "zip", "rar", "7z", "mp4", "mov",
    "avi", "mp3", "wav",
];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/zip",
    "application/x-zip-compressed",
    "application/vnd.rar",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
];

fn length_between(value: &str, min: usize, max: usize, message: &str) -> ServiceResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ServiceError::validation(message));
    }
    Ok(())
}

pub fn task_title(raw: &str) -> ServiceResult<String> {
    let title = raw.trim();
    length_between(
        title,
        TASK_TITLE_MIN,
        TASK_TITLE_MAX,
        "Title must be between 3 and 200 characters",
    )?;
    Ok(title.to_string())
}

pub fn task_description(raw: &str) -> ServiceResult<String> {
    length_between(
        raw,
        0,
        TASK_DESCRIPTION_MAX,
        "Description cannot exceed 1000 characters",
    )?;
    Ok(raw.to_string())
}

/// Accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC)
pub fn due_date(raw: &str) -> ServiceResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ServiceError::validation("Due date must be a valid date"))
}

pub fn project_name(raw: &str) -> ServiceResult<String> {
    let name = raw.trim();
    length_between(
        name,
        1,
        PROJECT_NAME_MAX,
        "Project name must be between 1 and 100 characters",
    )?;
    Ok(name.to_string())
}

pub fn project_description(raw: &str) -> ServiceResult<String> {
    let description = raw.trim();
    length_between(
        description,
        0,
        PROJECT_DESCRIPTION_MAX,
        "Description cannot exceed 500 characters",
    )?;
    Ok(description.to_string())
}

/// `#RRGGBB`, normalized to uppercase
pub fn color(raw: &str) -> ServiceResult<String> {
    let raw = raw.trim();
    let valid = raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ServiceError::validation(
            "Color must be a hex color like #3B82F6",
        ));
    }
    Ok(raw.to_ascii_uppercase())
}

pub fn comment_content(raw: &str) -> ServiceResult<String> {
    let content = raw.trim();
    length_between(
        content,
        1,
        COMMENT_MAX,
        "Comment must be between 1 and 1000 characters",
    )?;
    Ok(content.to_string())
}

pub fn user_name(raw: &str) -> ServiceResult<String> {
    let name = raw.trim();
    length_between(
        name,
        USER_NAME_MIN,
        USER_NAME_MAX,
        "Name must be between 2 and 50 characters",
    )?;
    Ok(name.to_string())
}

/// Structural email check; returns the address trimmed and lowercased
pub fn email(raw: &str) -> ServiceResult<String> {
    let email = raw.trim().to_lowercase();
    let invalid = || ServiceError::validation("Please provide a valid email");

    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");

    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }
    Ok(email)
}

/// Checks size, extension, and declared MIME type of an upload
///
/// Returns the lowercased extension. Both the extension and the MIME type
/// must be on their allow-lists.
pub fn attachment(original_name: &str, mime_type: &str, size: usize) -> ServiceResult<String> {
    if size == 0 {
        return Err(ServiceError::validation("Uploaded file is empty"));
    }
    if size > MAX_ATTACHMENT_SIZE {
        return Err(ServiceError::validation("File size cannot exceed 10MB"));
    }

    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) || !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ServiceError::validation(
            "File type not allowed. Allowed types: images, documents, archives, audio, and video",
        ));
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_task_title_bounds() {
        assert!(task_title("ab").is_err());
        assert!(task_title("   ab   ").is_err());
        assert_eq!(task_title("  abc ").unwrap(), "abc");
        assert!(task_title(&"x".repeat(200)).is_ok());
        assert!(task_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_due_date_formats() {
        let ts = due_date("2026-03-01T12:30:00Z").unwrap();
        assert_eq!((ts.month(), ts.day(), ts.hour()), (3, 1, 12));

        let date = due_date("2026-03-01").unwrap();
        assert_eq!((date.day(), date.hour()), (1, 0));

        assert!(due_date("2026-02-30").is_err());
        assert!(due_date("tomorrow").is_err());
    }

    #[test]
    fn test_color() {
        assert_eq!(color("#3b82f6").unwrap(), "#3B82F6");
        assert!(color("3B82F6").is_err());
        assert!(color("#3B82F").is_err());
        assert!(color("#GGGGGG").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "ada@", "@example.com", "ada@example", "a b@example.com", "a@b@c.com"] {
            assert!(email(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_attachment_rules() {
        assert_eq!(attachment("report.PDF", "application/pdf", 1024).unwrap(), "pdf");
        assert_eq!(attachment("notes.txt", "text/plain; charset=utf-8", 10).unwrap(), "txt");

        // Extension and MIME type must both be allowed
        assert!(attachment("setup.exe", "application/pdf", 10).is_err());
        assert!(attachment("report.pdf", "application/x-msdownload", 10).is_err());
        assert!(attachment("noext", "text/plain", 10).is_err());

        assert!(attachment("big.png", "image/png", MAX_ATTACHMENT_SIZE).is_ok());
        assert!(attachment("big.png", "image/png", MAX_ATTACHMENT_SIZE + 1).is_err());
        assert!(attachment("empty.png", "image/png", 0).is_err());
    }

    #[test]
    fn test_comment_content() {
        assert!(comment_content("   ").is_err());
        assert_eq!(comment_content(" ok ").unwrap(), "ok");
        assert!(comment_content(&"c".repeat(1001)).is_err());
    }
}
