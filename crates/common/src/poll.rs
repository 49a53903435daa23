//! Poll-until engine
//!
//! Repeatedly invokes a probe, checks its result against a [`MatchSpec`] and
//! backs off between attempts until the condition holds (or, in absence
//! mode, stops holding) or the attempt budget runs out.
//!
//! ```ignore
//! let id = poll_until(
//!     || async { fetch_orders().await.map(ProbeResult::from_response) },
//!     &MatchSpec::fields(json!({"status": "shipped"})),
//!     &PollOptions::default().attempts(5),
//! )
//! .await?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{PollError, PollResult, ProbeFailure};
use crate::matcher::MatchSpec;
use crate::probe::ProbeResult;
use crate::sleep::{Sleeper, TokioSleeper};

/// Default dotted path extracted from a successful match
pub const DEFAULT_EXTRACT_PATH: &str = "data.id";

/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait schedule between unsuccessful attempts.
///
/// The first wait is `initial_delay_secs`; each following wait is the
/// previous one multiplied by `2^growth_exponent`. An exponent of `0` keeps
/// the wait constant, `1` doubles it and `-1` halves it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backoff {
    pub initial_delay_secs: f64,
    pub growth_exponent: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay_secs: 1.0,
            growth_exponent: 1.0,
        }
    }
}

impl Backoff {
    pub fn new(initial_delay_secs: f64, growth_exponent: f64) -> Self {
        Self {
            initial_delay_secs,
            growth_exponent,
        }
    }

    /// Constant wait between attempts
    pub fn constant(delay_secs: f64) -> Self {
        Self::new(delay_secs, 0.0)
    }

    /// Wait scheduled after failed attempt `attempt` (1-based).
    ///
    /// Negative or NaN results collapse to zero; waits too long for a
    /// `Duration` saturate at `Duration::MAX`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1) as f64;
        let secs = self.initial_delay_secs * 2f64.powf(self.growth_exponent * steps);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Options of a single poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOptions {
    /// Dotted path of the value returned on success
    pub extract_path: String,

    /// Upper bound on probe invocations; `0` behaves as `1`
    pub max_attempts: u32,

    /// `true` waits for the condition to hold, `false` for it to stop holding
    pub expect_match: bool,

    pub backoff: Backoff,

    /// Message reported instead of the generated description
    pub failure_message: Option<String>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            extract_path: DEFAULT_EXTRACT_PATH.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            expect_match: true,
            backoff: Backoff::default(),
            failure_message: None,
        }
    }
}

impl PollOptions {
    pub fn extract(mut self, path: impl Into<String>) -> Self {
        self.extract_path = path.into();
        self
    }

    pub fn attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Succeed once the condition is no longer met
    pub fn expect_absent(mut self) -> Self {
        self.expect_match = false;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Runs polls with a given sleep primitive
#[derive(Debug, Clone, Default)]
pub struct Poller<S = TokioSleeper> {
    sleeper: S,
}

impl Poller<TokioSleeper> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Sleeper> Poller<S> {
    /// Use a custom sleep primitive
    pub fn with_sleeper(sleeper: S) -> Self {
        Self { sleeper }
    }

    /// Poll `probe` until `spec` is satisfied according to `options`.
    ///
    /// Returns the value at `options.extract_path` of the located match, or
    /// `None` when the path resolves to nothing or success meant absence.
    pub async fn run<P, Fut, E>(
        &self,
        mut probe: P,
        spec: &MatchSpec,
        options: &PollOptions,
    ) -> PollResult<Option<Value>>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<ProbeResult, E>>,
        E: Into<ProbeFailure>,
    {
        let budget = options.attempt_budget();
        let mut last_result = None;

        for attempt in 1..=budget {
            let result = probe().await.map_err(|e| PollError::Probe {
                attempt,
                source: e.into(),
            })?;

            let located = result.locate(spec);
            let is_found = located.is_some();

            if is_found == options.expect_match {
                debug!(attempt, is_found, "poll condition satisfied");
                return Ok(located.and_then(|m| m.extract(&options.extract_path)));
            }

            last_result = Some(result.to_value());

            if attempt < budget {
                let delay = options.backoff.delay_after(attempt);
                debug!(attempt, is_found, delay_ms = delay.as_millis() as u64, "poll condition not met, backing off");
                self.sleeper.sleep(delay).await;
            } else {
                debug!(attempt, is_found, "poll attempts exhausted");
            }
        }

        Err(PollError::NoMatchFound {
            message: options
                .failure_message
                .clone()
                .unwrap_or_else(|| spec.describe_miss()),
            attempts: budget,
            last_result,
        })
    }
}

/// Poll with the tokio timer. See [`Poller::run`].
pub async fn poll_until<P, Fut, E>(
    probe: P,
    spec: &MatchSpec,
    options: &PollOptions,
) -> PollResult<Option<Value>>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<ProbeResult, E>>,
    E: Into<ProbeFailure>,
{
    Poller::new().run(probe, spec, options).await
}
