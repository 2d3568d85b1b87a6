//! Unified error handling for sqlshape.
//!
//! This module defines [`ShapeError`], the single error type propagated by
//! every layer of the crate: the SQL front-end, the normalization engine,
//! plan generation and configuration loading.
//!
//! A convenience [`Result<T>`] type alias is re-exported so that callers can
//! write `Result<T>` instead of `std::result::Result<T, ShapeError>`.

use std::io;

use thiserror::Error;

/// The canonical error type for all sqlshape operations.
///
/// Variants are organised by subsystem so that callers can match on the
/// error category without inspecting free-form strings.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// The SQL text could not be tokenized or parsed into a SELECT
    /// statement.
    #[error("invalid SQL: {0}")]
    InvalidSql(String),

    /// The syntax tree handed to the normalizer is not a SELECT construct,
    /// or one of its nodes carries a span that is inconsistent with its
    /// kind or with its parent. No partial result is produced.
    #[error("malformed syntax tree: {0}")]
    MalformedTree(String),

    /// A plan generator failed for the given normalized text. Nothing is
    /// cached for the key, so the caller may retry.
    #[error("plan generation failed: {0}")]
    PlanGeneration(String),

    /// A configuration value is missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error, e.g. while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShapeError {
    pub fn invalid_sql<S: Into<String>>(msg: S) -> Self {
        Self::InvalidSql(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedTree(msg.into())
    }

    pub fn plan_generation<S: Into<String>>(msg: S) -> Self {
        Self::PlanGeneration(msg.into())
    }
}

/// A specialised [`Result`] type for sqlshape operations.
pub type Result<T> = std::result::Result<T, ShapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts_via_question_mark() {
        fn might_fail() -> Result<()> {
            let _f = std::fs::File::open("/non/existent/path/sqlshape_test")?;
            Ok(())
        }

        let err = might_fail().unwrap_err();
        assert!(matches!(err, ShapeError::Io(_)));
    }

    #[test]
    fn json_error_converts_via_from() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ShapeError = json_err.into();
        assert!(matches!(err, ShapeError::Json(_)));
    }

    #[test]
    fn display_messages_are_human_readable() {
        let cases: Vec<(ShapeError, &str)> = vec![
            (
                ShapeError::invalid_sql("unexpected token"),
                "invalid SQL: unexpected token",
            ),
            (
                ShapeError::malformed("root is not a SELECT"),
                "malformed syntax tree: root is not a SELECT",
            ),
            (
                ShapeError::plan_generation("backend offline"),
                "plan generation failed: backend offline",
            ),
            (
                ShapeError::Config("unknown key".into()),
                "configuration error: unknown key",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn error_source_chains_io_errors() {
        use std::error::Error;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = ShapeError::Io(io_err);
        assert!(err.source().is_some());

        let non_io = ShapeError::malformed("bad span");
        assert!(non_io.source().is_none());
    }
}
