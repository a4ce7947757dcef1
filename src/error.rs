//! Error types for the restart engine

use thiserror::Error;

/// Main error type for the restart engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestartError {
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    #[error("Unknown operator '{operator}' in condition: {condition}")]
    UnknownOperator { operator: String, condition: String },

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Age config not found: {0}")]
    AgeNotFound(i32),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("No eligible events at age {0}")]
    NoCandidates(i32),

    #[error("Allocated {total} points, but the budget is {budget}")]
    SizeExceeded { total: i32, budget: i32 },

    #[error("{attribute} was given {value}, but the cap is {cap}")]
    ValueExceeded {
        attribute: &'static str,
        value: i32,
        cap: i32,
    },

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Attributes have already been allocated")]
    AlreadyAllocated,

    #[error("Attributes have not been allocated yet")]
    AttributesNotAllocated,

    #[error("The game has already ended")]
    AlreadyEnded,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Follow-up chain exceeds the maximum depth at event {0}")]
    ChainTooDeep(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl RestartError {
    /// True for failures caused by a broken condition string rather than by
    /// the player's state.
    pub fn is_condition_error(&self) -> bool {
        matches!(
            self,
            RestartError::MalformedCondition(_)
                | RestartError::UnknownOperator { .. }
                | RestartError::MissingAttribute(_)
                | RestartError::TypeMismatch(_)
        )
    }
}

impl From<serde_json::Error> for RestartError {
    fn from(err: serde_json::Error) -> Self {
        RestartError::Deserialization(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RestartError> for pyo3::PyErr {
    fn from(err: RestartError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};

        let msg = err.to_string();
        match err {
            RestartError::AgeNotFound(_)
            | RestartError::EventNotFound(_)
            | RestartError::SessionNotFound(_) => PyKeyError::new_err(msg),
            RestartError::NoCandidates(_)
            | RestartError::AlreadyAllocated
            | RestartError::AttributesNotAllocated
            | RestartError::AlreadyEnded
            | RestartError::ChainTooDeep(_) => PyRuntimeError::new_err(msg),
            _ => PyValueError::new_err(msg),
        }
    }
}

/// Result type alias for the restart engine
pub type Result<T> = std::result::Result<T, RestartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_error_classification() {
        assert!(RestartError::MissingAttribute("XYZ".into()).is_condition_error());
        assert!(RestartError::TypeMismatch("EVT>1".into()).is_condition_error());
        assert!(!RestartError::NoCandidates(3).is_condition_error());
        assert!(!RestartError::AlreadyEnded.is_condition_error());
    }

    #[test]
    fn test_display() {
        let err = RestartError::SizeExceeded {
            total: 12,
            budget: 10,
        };
        assert_eq!(err.to_string(), "Allocated 12 points, but the budget is 10");
    }
}
