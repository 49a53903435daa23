//! Polling assertions against eventually consistent APIs

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use journeykit_common::{MatchSpec, PollOptions, Poller, ProbeResult, Sleeper, TokioSleeper};

use crate::error::E2eResult;
use crate::session::{ApiResponse, ApiSession};

/// Wait for a number of seconds
pub async fn wait_seconds(seconds: f64) {
    if seconds.is_finite() && seconds > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    }
}

/// Call `search` until its response satisfies `spec`.
///
/// `search` receives the session on every attempt; its response is seen by
/// the matcher as `{"status": <code>, "data": <body>}`, so a paginated body
/// (`recordCount` / `records`) is scanned record by record and a predicate
/// can inspect the HTTP status. Returns the value at the extraction path.
///
/// ```ignore
/// let order_id = api_waiting(
///     &session,
///     |s| s.get("/orders?status=shipped"),
///     &MatchSpec::fields(json!({"reference": "PO-7"})),
///     &PollOptions::default().attempts(5),
/// )
/// .await?;
/// ```
pub async fn api_waiting<'s, F, Fut>(
    session: &'s ApiSession,
    search: F,
    spec: &MatchSpec,
    options: &PollOptions,
) -> E2eResult<Option<Value>>
where
    F: FnMut(&'s ApiSession) -> Fut,
    Fut: Future<Output = E2eResult<ApiResponse>>,
{
    api_waiting_with(&TokioSleeper, session, search, spec, options).await
}

/// [`api_waiting`] with a custom sleep primitive
pub async fn api_waiting_with<'s, S, F, Fut>(
    sleeper: &S,
    session: &'s ApiSession,
    mut search: F,
    spec: &MatchSpec,
    options: &PollOptions,
) -> E2eResult<Option<Value>>
where
    S: Sleeper,
    F: FnMut(&'s ApiSession) -> Fut,
    Fut: Future<Output = E2eResult<ApiResponse>>,
{
    debug!(?spec, attempts = options.max_attempts, expect_match = options.expect_match, "waiting on API state");

    let value = Poller::with_sleeper(sleeper)
        .run(
            || {
                let pending = search(session);
                async move {
                    let response = pending.await?;
                    Ok::<_, crate::error::E2eError>(ProbeResult::from_response(response.into_envelope()))
                }
            },
            spec,
            options,
        )
        .await?;

    info!(value = ?value, "API state reached");
    Ok(value)
}
