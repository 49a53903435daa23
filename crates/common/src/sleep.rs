//! Delay primitive used between poll attempts

use async_trait::async_trait;
use std::time::Duration;

/// Suspends the calling task for a delay.
///
/// The engine only ever sleeps through this trait, so callers can swap the
/// runtime timer for a recording or virtual clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<S: Sleeper + ?Sized> Sleeper for &S {
    async fn sleep(&self, delay: Duration) {
        (**self).sleep(delay).await;
    }
}
