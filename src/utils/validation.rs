//! Validation Utilities
//!
//! Input validation functions for account data and API requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format using a comprehensive regex pattern
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 255 {
        return false;
    }

    // Letters (including accented ones), spaces, hyphens and apostrophes
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[\p{L}\s\-']+$").expect("Failed to compile name regex")
    });

    regex.is_match(trimmed)
}

/// Validates a numeric one-time code (digits only, 4-8 characters)
pub fn validate_otp_code(code: &str) -> bool {
    (4..=8).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit())
}

/// Validates a national identification number (digits only, 6-13 characters)
pub fn validate_national_id(national_id: &str) -> bool {
    (6..=13).contains(&national_id.len()) && national_id.chars().all(|c| c.is_ascii_digit())
}

/// Validates a phone number in E.164-ish form (optional +, 7-15 digits)
pub fn validate_phone(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Failed to compile phone regex"));

    regex.is_match(phone)
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name"))
    }
}

/// Custom validator for one-time-code fields using the validator crate
pub fn otp_code_validator(code: &str) -> Result<(), ValidationError> {
    if validate_otp_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_otp_code"))
    }
}

/// Custom validator for national-id fields using the validator crate
pub fn national_id_validator(national_id: &str) -> Result<(), ValidationError> {
    if validate_national_id(national_id) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_national_id"))
    }
}

/// Custom validator for phone fields using the validator crate
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("John Doe"));
        assert!(validate_name("Mary-Jane O'Connor"));
        assert!(validate_name("José Núñez"));
        assert!(!validate_name(""));
        assert!(!validate_name("John123"));
        assert!(!validate_name(&"a".repeat(256)));
    }

    #[test]
    fn test_validate_otp_code() {
        assert!(validate_otp_code("123456"));
        assert!(validate_otp_code("0000"));
        assert!(!validate_otp_code("123"));
        assert!(!validate_otp_code("12345a"));
        assert!(!validate_otp_code("123456789"));
    }

    #[test]
    fn test_validate_national_id() {
        assert!(validate_national_id("1712345678"));
        assert!(!validate_national_id("12345"));
        assert!(!validate_national_id("17123456AB"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+593987654321"));
        assert!(validate_phone("0987654321"));
        assert!(!validate_phone("12-34"));
        assert!(!validate_phone("phone"));
    }
}
