//! API request and response bodies.

use serde::Serialize;

use crate::line::LineConfiguration;
use crate::validate::ErrorSet;

/// Result of `/validate`.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// `true` when `errors` is empty.
    pub valid: bool,
    /// Field errors, in field order.
    pub errors: ErrorSet,
}

/// Result of an accepted `/submit`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// Configuration as delivered, after the length rule was applied.
    pub line: LineConfiguration,
}

/// Error response body for 4xx/5xx replies.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Field errors, when the failure is a validation failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorSet>,
}

impl ErrorResponse {
    /// Plain message without field errors.
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Field, FieldError};

    #[test]
    fn error_response_omits_empty_errors() {
        let json = serde_json::to_value(ErrorResponse::message("bad")).ok();
        assert!(json.as_ref().and_then(|v| v.get("errors")).is_none());
    }

    #[test]
    fn validate_response_lists_errors() {
        let mut errors = ErrorSet::new();
        errors.push(Field::Poles, FieldError::NotPositive { value: 0.0 });
        let json = serde_json::to_value(ValidateResponse {
            valid: false,
            errors,
        })
        .ok();
        let listed = json
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(|v| v.as_array())
            .map(Vec::len);
        assert_eq!(listed, Some(1));
    }
}
