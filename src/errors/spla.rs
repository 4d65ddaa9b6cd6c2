// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Top-level error type surfaced by submission, registration and dispatch.

use thiserror::Error;

use crate::errors::ExecutionError;

/// Errors raised by the expression core.
///
/// The two caller-facing kinds mirror how the failure should be handled:
/// - `InvalidArgument` is a usage error (bad expression, bad operands). Never retried.
/// - `InvalidState` is a configuration gap (nothing registered or nothing matched).
///
/// Both are raised synchronously, before any module of the task graph runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A sub-task failed while the task graph was running.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl SplaError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Short kind name used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SplaError::InvalidArgument(_) => "InvalidArgument",
            SplaError::InvalidState(_) => "InvalidState",
            SplaError::Execution(_) => "Execution",
        }
    }
}

pub type SplaResult<T> = Result<T, SplaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let test_cases = vec![
            (
                SplaError::invalid_argument("Passed null expression"),
                "Invalid argument: Passed null expression",
                "InvalidArgument",
            ),
            (
                SplaError::invalid_state("No processors for such op=VxM"),
                "Invalid state: No processors for such op=VxM",
                "InvalidState",
            ),
            (
                SplaError::from(ExecutionError::TaskJoin("panicked".to_string())),
                "Task join error: panicked",
                "Execution",
            ),
        ];

        for (error, expected_display, expected_kind) in test_cases {
            assert_eq!(error.to_string(), expected_display);
            assert_eq!(error.kind(), expected_kind);
        }
    }
}
