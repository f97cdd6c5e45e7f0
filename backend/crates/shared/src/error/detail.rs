//! Field-level error descriptors
//!
//! Validation failures (password policy, malformed email, wrong current
//! password) are reported as a list of `{code, description}` pairs so the
//! client can attach each message to the offending form field.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable code, e.g. `PasswordTooShort`
    pub code: Cow<'static, str>,
    /// Human-readable message
    pub description: Cow<'static, str>,
}

impl ErrorDetail {
    pub fn new(
        code: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_code_and_description() {
        let detail = ErrorDetail::new("PasswordTooShort", "Passwords must be at least 6 characters.");
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["code"], "PasswordTooShort");
        assert_eq!(json["description"], "Passwords must be at least 6 characters.");
    }

    #[test]
    fn test_display() {
        let detail = ErrorDetail::new("InvalidEmail", "Email 'x' is invalid.");
        assert_eq!(detail.to_string(), "InvalidEmail: Email 'x' is invalid.");
    }
}
