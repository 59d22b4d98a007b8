use thiserror::Error;

use super::types::MAX_RUNS;

/// Errors surfaced by the simulation engine's entry points.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// A scenario field failed validation.
    #[error("invalid scenario: {field} {reason}")]
    InvalidScenario { field: &'static str, reason: String },

    /// The requested run count was zero, negative or above `MAX_RUNS`.
    #[error(
        "run count must be a positive integer no greater than {max}, got {requested}",
        max = MAX_RUNS
    )]
    InvalidRunCount { requested: i64 },

    /// The ensemble was stopped before every run completed.
    #[error("ensemble cancelled after {completed} runs")]
    Cancelled { completed: usize },
}

impl SimulationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidScenario {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
