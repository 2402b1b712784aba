//! Error types for primitive operations
//!
//! These errors are raised when an operation cannot be applied to the current
//! value it targets. A failed operation never partially mutates the store.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while applying a diff or building an operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// Insert or delete position past the end of the target
    #[error("Position {pos} out of bounds for length {len}")]
    OutOfBounds { pos: usize, len: usize },

    /// The element or text found at the position differs from the diff's value
    ///
    /// Indicates the operation was built against a different version of the
    /// property.
    #[error("Expected {expected} at position {pos}, found {actual}")]
    ValueMismatch {
        pos: usize,
        expected: Value,
        actual: Value,
    },

    /// Array diff applied to a non-array value, or text diff to a non-string
    #[error("Cannot apply {diff} diff to {found}")]
    TypeMismatch { diff: String, found: String },

    /// Operation path is missing required segments
    #[error("Invalid operation path: {reason}")]
    InvalidPath { reason: String },
}

impl OperationError {
    pub fn out_of_bounds(pos: usize, len: usize) -> Self {
        Self::OutOfBounds { pos, len }
    }

    pub fn value_mismatch(pos: usize, expected: Value, actual: Value) -> Self {
        Self::ValueMismatch {
            pos,
            expected,
            actual,
        }
    }

    pub fn type_mismatch(diff: impl Into<String>, found: &Value) -> Self {
        Self::TypeMismatch {
            diff: diff.into(),
            found: json_type_name(found).to_string(),
        }
    }

    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            reason: reason.into(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            OperationError::out_of_bounds(4, 2).to_string(),
            "Position 4 out of bounds for length 2"
        );
        assert_eq!(
            OperationError::type_mismatch("array", &json!("text")).to_string(),
            "Cannot apply array diff to string"
        );
        assert_eq!(
            OperationError::value_mismatch(0, json!("a"), json!("b")).to_string(),
            "Expected \"a\" at position 0, found \"b\""
        );
    }
}
