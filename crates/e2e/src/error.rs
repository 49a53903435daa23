//! Error types for E2E testing

use journeykit_common::PollError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Unknown user '{user}' in environment '{environment}'")]
    UnknownUser { environment: String, user: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The test could not run meaningfully and should be reported as
    /// skipped, e.g. the environment lacks the data it needs
    #[error("Skipped: {0}")]
    Skipped(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Value not found: {0}")]
    ValueNotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("TestRail request failed with status {status}: {body}")]
    TestRail { status: u16, body: String },

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether the failure should be reported as a skip rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, E2eError::Skipped(_))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
