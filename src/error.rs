// ABOUTME: Error taxonomy for the reader, expander, and evaluator

use crate::value::Value;
use thiserror::Error;

// ===== Arity description strings (shared by builtins) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ONE_TO_THREE: &str = "1-3";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Reader failure with source position and the underlying cause
    #[error("{cause} at line {line}, column {column}")]
    Reader {
        line: u32,
        column: u32,
        cause: String,
    },

    /// Expander-detected malformed special form
    #[error("{0}")]
    Syntax(String),

    /// Symbol or namespace could not be resolved
    #[error("{0}")]
    Resolution(String),

    /// Function invoked with the wrong number of arguments
    #[error("{function} takes exactly {expected} argument{} ({actual} given)", if *.expected == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: String, // "2", "1-3", "at least 1"
        actual: usize,
    },

    /// Native callable given incompatible operands
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    Type {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    /// Applied value is not a function
    #[error("not callable: {0}")]
    NotCallable(String),

    /// Bubbled from a native callable or a macro
    #[error("{0}")]
    User(String),
}

impl Error {
    pub fn syntax(message: impl Into<String>) -> Self {
        Error::Syntax(message.into())
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        Error::Resolution(message.into())
    }

    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        Error::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Type mismatch naming the offending argument position
    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        Error::Type {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Error::User(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_display_pluralizes() {
        let one = Error::arity("fn", ARITY_ONE, 2);
        assert_eq!(one.to_string(), "fn takes exactly 1 argument (2 given)");

        let two = Error::arity("fn", ARITY_TWO, 1);
        assert_eq!(two.to_string(), "fn takes exactly 2 arguments (1 given)");
    }

    #[test]
    fn test_reader_display_carries_position() {
        let err = Error::Reader {
            line: 3,
            column: 14,
            cause: "Unmatched delimiter: )".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unmatched delimiter: ) at line 3, column 14"
        );
    }

    #[test]
    fn test_type_error_names_argument() {
        let err = Error::type_error("mod", "integer", &Value::Float(1.5), 1);
        assert_eq!(
            err.to_string(),
            "mod: expected integer, got float at argument 1"
        );
    }
}
