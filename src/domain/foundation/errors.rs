//! Validation errors for identifiers and lifecycle transitions.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An identifier parsed from external input was blank.
    #[error("{kind} must not be blank")]
    BlankIdentifier { kind: &'static str },

    /// A lifecycle enum was asked to move somewhere it cannot go.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

impl ValidationError {
    pub fn blank(kind: &'static str) -> Self {
        Self::BlankIdentifier { kind }
    }

    pub fn illegal_transition(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        Self::IllegalTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}
