use crate::pipeline::parse_currency;
use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PATH_LEN: usize = 64;

/// Display names: firms, subsidiaries, stages, lanes, tickets, tags, and so
/// on. Free-form text, but never empty and never absurdly long.
pub fn validate_display_name(name: &str, entity: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot be empty"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::bad_request("Invalid email address"));
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    Ok(())
}

/// Ticket values are stored as strings but must parse as currency:
/// digits with at most two decimal places.
pub fn validate_ticket_value(value: &str) -> Result<(), ApiError> {
    if parse_currency(value).is_none() {
        return Err(ApiError::bad_request(
            "Ticket value must be a number with at most two decimal places",
        ));
    }
    Ok(())
}

/// Campaign page paths. The root page uses the empty string; every other
/// page needs a lowercase slug.
pub fn validate_page_path(path_name: &str, is_root: bool) -> Result<(), ApiError> {
    if path_name.is_empty() {
        if is_root {
            return Ok(());
        }
        return Err(ApiError::bad_request(
            "Pages other than the first need a path name",
        ));
    }

    if path_name.len() > MAX_PATH_LEN {
        return Err(ApiError::bad_request(format!(
            "Page path cannot exceed {MAX_PATH_LEN} characters"
        )));
    }
    if !path_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::bad_request(
            "Page path can only contain lowercase letters, digits, and hyphens",
        ));
    }
    Ok(())
}

/// Campaign subdomains follow the same slug rules but may not be empty.
pub fn validate_sub_domain(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > MAX_PATH_LEN {
        return Err(ApiError::bad_request("Invalid subdomain name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        || name.starts_with('-')
        || name.ends_with('-')
    {
        return Err(ApiError::bad_request(
            "Subdomain can only contain lowercase letters, digits, and interior hyphens",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert!(validate_display_name("Sales Pipeline", "Stage").is_ok());
        assert!(validate_display_name("", "Stage").is_err());
        assert!(validate_display_name("   ", "Stage").is_err());
        assert!(validate_display_name(&"x".repeat(121), "Stage").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("first.last@sub.domain.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@c.co").is_err());
    }

    #[test]
    fn test_ticket_value() {
        assert!(validate_ticket_value("1500").is_ok());
        assert!(validate_ticket_value("99.99").is_ok());
        assert!(validate_ticket_value("99.999").is_err());
        assert!(validate_ticket_value("-5").is_err());
    }

    #[test]
    fn test_page_path() {
        assert!(validate_page_path("", true).is_ok());
        assert!(validate_page_path("", false).is_err());
        assert!(validate_page_path("pricing", false).is_ok());
        assert!(validate_page_path("step-2", false).is_ok());
        assert!(validate_page_path("Bad Path", false).is_err());
    }

    #[test]
    fn test_sub_domain() {
        assert!(validate_sub_domain("launch").is_ok());
        assert!(validate_sub_domain("spring-sale-24").is_ok());
        assert!(validate_sub_domain("").is_err());
        assert!(validate_sub_domain("-lead").is_err());
        assert!(validate_sub_domain("UPPER").is_err());
    }
}
