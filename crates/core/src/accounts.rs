//! Account-level input rules shared by registration and login.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Permission tag given to self-registered accounts.
pub const DEFAULT_PERMISSIONS: &str = "user";

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Validate an email address and derive the username from its local part.
///
/// # Examples
///
/// ```
/// use shortlink_core::accounts::username_from_email;
///
/// assert_eq!(username_from_email("ada@example.com").unwrap(), "ada");
/// assert!(username_from_email("not-an-email").is_err());
/// ```
pub fn username_from_email(email: &str) -> Result<String, CoreError> {
    if !email.validate_email() {
        return Err(CoreError::Malformed(format!("{email:?} is not a valid email")));
    }

    match email.split_once('@') {
        Some((local, _domain)) if !local.is_empty() => Ok(local.to_string()),
        _ => Err(CoreError::Malformed(format!("{email:?} is not a valid email"))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn username_is_local_part() {
        assert_eq!(username_from_email("first.last@example.org").unwrap(), "first.last");
    }

    #[test]
    fn invalid_emails_are_malformed() {
        for email in ["", "plain", "@example.com", "a@", "a b@example.com"] {
            assert_matches!(
                username_from_email(email),
                Err(CoreError::Malformed(_)),
                "email {email:?}"
            );
        }
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(normalize_email("  ada@example.com \n"), "ada@example.com");
    }
}
