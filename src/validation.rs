use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const CODE_LEN: usize = 6;
pub const CONTENT_MIN: usize = 5;
pub const CONTENT_MAX: usize = 500;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Request bodies checked before any store access.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

pub fn username(value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < USERNAME_MIN {
        return Err(AppError::validation("Username must be at least 2 characters"));
    }
    if len > USERNAME_MAX {
        return Err(AppError::validation("Username must be no more than 20 characters"));
    }
    if !USERNAME_RE.is_match(value) {
        return Err(AppError::validation(
            "Username must not contain special characters",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), AppError> {
    if !EMAIL_RE.is_match(value) {
        return Err(AppError::validation("Invalid email address"));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

pub fn code(value: &str) -> Result<(), AppError> {
    if value.chars().count() != CODE_LEN {
        return Err(AppError::validation("Verification code must be 6 digits"));
    }
    Ok(())
}

pub fn content(value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < CONTENT_MIN {
        return Err(AppError::validation(
            "Content must be at least 5 characters.",
        ));
    }
    if len > CONTENT_MAX {
        return Err(AppError::validation(
            "Content must not be longer than 500 characters.",
        ));
    }
    Ok(())
}

pub fn required(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{what} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(username("al").is_ok());
        assert!(username("user_name_42").is_ok());
        assert!(username("a").is_err());
        assert!(username(&"x".repeat(21)).is_err());
        assert!(username(&"x".repeat(20)).is_ok());
        let err = username("bad name!").unwrap_err();
        assert_eq!(err.to_string(), "Username must not contain special characters");
    }

    #[test]
    fn email_rules() {
        assert!(email("me@example.com").is_ok());
        assert!(email("me@example").is_err());
        assert!(email("me example@x.io").is_err());
    }

    #[test]
    fn content_counts_chars_not_bytes() {
        // five two-byte characters
        assert!(content("ééééé").is_ok());
        assert!(content("abcd").is_err());
        assert!(content(&"é".repeat(500)).is_ok());
        assert!(content(&"a".repeat(501)).is_err());
    }

    #[test]
    fn code_and_password_rules() {
        assert!(code("123456").is_ok());
        assert!(code("12345").is_err());
        assert!(password("123456").is_ok());
        assert!(password("12345").is_err());
        assert!(required("  ", "Identifier").is_err());
    }
}
