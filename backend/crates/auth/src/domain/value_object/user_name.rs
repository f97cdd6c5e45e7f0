//! User Name Value Object
//!
//! Local registrations use the email address as user name; federated
//! accounts start with the local part of the provider email. Users may
//! change it later through the profile.
//!
//! ## Invariants
//! - NFKC normalized and trimmed
//! - 1 to 256 characters
//! - Only ASCII letters, digits and `_ . - + @`
//! - Uniqueness is checked on the lower-cased canonical form

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::error::AuthError;

pub const USER_NAME_MAX_LENGTH: usize = 256;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-', '+', '@'];

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("User name cannot be empty.")]
    Empty,

    #[error("User name must be at most {max} characters.")]
    TooLong { max: usize },

    #[error("User name '{name}' is invalid, can only contain letters or digits.")]
    InvalidCharacter { name: String },
}

impl From<UserNameError> for AuthError {
    fn from(err: UserNameError) -> Self {
        AuthError::Validation(vec![kernel::error::detail::ErrorDetail::new(
            "InvalidUserName",
            err.to_string(),
        )])
    }
}

/// Validated, normalized user name
///
/// `original` keeps the user's casing for display; `canonical` is the
/// lower-cased form used for uniqueness checks.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();

        if original.is_empty() {
            return Err(UserNameError::Empty);
        }
        if original.chars().count() > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: USER_NAME_MAX_LENGTH,
            });
        }
        if !original
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c))
        {
            return Err(UserNameError::InvalidCharacter { name: original });
        }

        let canonical = original.to_lowercase();
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_lowercase();
        Self {
            original,
            canonical,
        }
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserName")
            .field("original", &self.original)
            .field("canonical", &self.canonical)
            .finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_a_valid_user_name() {
        let name = UserName::new("Jane.Doe+news@Example.com").unwrap();
        assert_eq!(name.original(), "Jane.Doe+news@Example.com");
        assert_eq!(name.canonical(), "jane.doe+news@example.com");
    }

    #[test]
    fn test_trim_and_nfkc() {
        // Full-width 'Ａ' (U+FF21) normalizes to 'A'
        let name = UserName::new("  Ａlice ").unwrap();
        assert_eq!(name.original(), "Alice");
    }

    #[test]
    fn test_empty_fails() {
        assert_eq!(UserName::new("   "), Err(UserNameError::Empty));
    }

    #[test]
    fn test_too_long() {
        let input = "a".repeat(USER_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            UserName::new(&input),
            Err(UserNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(UserName::new("alice bob").is_err());
        assert!(UserName::new("日本語").is_err());
        assert!(UserName::new("alice🎉").is_err());
    }

    #[test]
    fn test_case_insensitive_equality_via_canonical() {
        let a = UserName::new("Alice").unwrap();
        let b = UserName::new("alice").unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_converts_to_field_error() {
        let err: AuthError = UserNameError::Empty.into();
        match err {
            AuthError::Validation(details) => assert_eq!(details[0].code, "InvalidUserName"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
