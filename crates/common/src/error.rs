//! Error types for the poll-until engine

use serde_json::Value;
use thiserror::Error;

/// Boxed cause carried by a failed probe
pub type ProbeFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using the poll error
pub type PollResult<T> = std::result::Result<T, PollError>;

/// Terminal failures of a poll.
///
/// These are the only two error kinds the engine produces. A probe failure
/// is never retried; a no-match is only reported once the attempt budget is
/// spent.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("Probe failed on attempt {attempt}: {source}")]
    Probe {
        attempt: u32,
        #[source]
        source: ProbeFailure,
    },

    #[error("{message} (after {attempts} attempts)")]
    NoMatchFound {
        message: String,
        attempts: u32,
        /// Last response the match condition was evaluated against
        last_result: Option<Value>,
    },
}

impl PollError {
    /// Whether this is an exhausted attempt budget rather than a probe failure
    pub fn is_no_match(&self) -> bool {
        matches!(self, PollError::NoMatchFound { .. })
    }

    /// Failure message without the attempt suffix
    pub fn message(&self) -> String {
        match self {
            PollError::Probe { source, .. } => source.to_string(),
            PollError::NoMatchFound { message, .. } => message.clone(),
        }
    }
}
