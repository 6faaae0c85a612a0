//! Errors raised back to the calling script.
//!
//! "Not applicable" outcomes (non-bot, free bot) are not errors and never
//! show up here; see [`crate::projection::Outcome`].

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed a wrong-shaped or semantically illegal value.
    Argument,
    /// Preconditions held but the engine failed to produce a result.
    Operation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BotError {
    #[error("bad argument #{position} to '{operation}' ({expected} expected, got {found})")]
    ArgumentType {
        operation: &'static str,
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("bad argument #{position} to '{operation}' ({message})")]
    ArgumentValue {
        operation: &'static str,
        position: usize,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentType { .. } | Self::ArgumentValue { .. } => ErrorKind::Argument,
            Self::Operation { .. } => ErrorKind::Operation,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::ArgumentType { operation, .. }
            | Self::ArgumentValue { operation, .. }
            | Self::Operation { operation, .. } => *operation,
        }
    }
}
