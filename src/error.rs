//! Error taxonomy for fixture generation.
//!
//! Recoverable conditions never show up here: "not my concern" and "blocked on
//! another value" travel as `GeneratorResult::Empty` / `GeneratorResult::Delayed`.
//! Everything in this module terminates the current population call.

use thiserror::Error;

/// Error type returned by user callbacks (generators, predicates, mappers, plugins).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FixtureError {
    /// Caller-supplied configuration is contradictory, or a user callback failed.
    #[error("usage error: {message}")]
    Usage {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    /// Assignment rules that were still blocked after the last retry pass.
    #[error("unresolved assignment expression\n\n{report}")]
    UnresolvedAssignment { report: String },

    /// A bounded sequence ran out of items and its policy is to fail.
    #[error("sequence exhausted: {report}")]
    SequenceExhausted { report: String },

    /// Engine invariant violation.
    #[error("internal error: {0}")]
    Internal(String),

    /// Model or settings could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FixtureError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage { message: message.into(), cause: None }
    }

    pub fn usage_with_cause(message: impl Into<String>, cause: BoxError) -> Self {
        Self::Usage { message: message.into(), cause: Some(cause) }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Usage errors are the only kind a caller may choose to survive
    /// (see `Settings::fail_on_error`).
    pub fn is_recoverable_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Recover a `FixtureError` that travelled through a user callback as a
    /// `BoxError`, or hand the foreign error back.
    pub fn from_boxed(error: BoxError) -> Result<Self, BoxError> {
        error.downcast::<FixtureError>().map(|e| *e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_display_includes_message() {
        let err = FixtureError::usage("bad predicate");
        assert_eq!(err.to_string(), "usage error: bad predicate");
        assert!(err.is_recoverable_usage());
    }

    #[test]
    fn boxed_fixture_error_is_recovered_unchanged() {
        let boxed: BoxError = Box::new(FixtureError::internal("boom"));
        let recovered = FixtureError::from_boxed(boxed).expect("fixture error");
        assert!(matches!(recovered, FixtureError::Internal(ref m) if m == "boom"));
    }

    #[test]
    fn foreign_boxed_error_is_handed_back() {
        let boxed: BoxError = "plain failure".into();
        let back = FixtureError::from_boxed(boxed).expect_err("foreign error");
        assert_eq!(back.to_string(), "plain failure");
    }
}
