//! journeykit Common Library
//!
//! The poll-until engine used to wait out eventual consistency between a
//! test action and the backend state it should produce, plus the JSON path
//! helpers it shares with the rest of the workspace.

pub mod error;
pub mod matcher;
pub mod path;
pub mod poll;
pub mod probe;
pub mod sleep;

// Re-export commonly used types
pub use error::{PollError, PollResult, ProbeFailure};
pub use matcher::MatchSpec;
pub use path::{get_path, set_path};
pub use poll::{poll_until, Backoff, PollOptions, Poller, DEFAULT_EXTRACT_PATH, DEFAULT_MAX_ATTEMPTS};
pub use probe::{Page, ProbeResult};
pub use sleep::{Sleeper, TokioSleeper};

/// journeykit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
