use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Source of time for deadlines, polling and generated names.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Seconds since the Unix epoch.
    fn unix_timestamp(&self) -> i64;

    async fn sleep(&self, duration: Duration);

    /// Drive `future` until it completes or `deadline` passes.
    ///
    /// Returns `None` if the deadline passed first. A future that is already
    /// complete when first polled wins even at or after the deadline.
    async fn timeout_at<F>(&self, deadline: Instant, future: F) -> Option<F::Output>
    where
        F: Future + Send,
        F::Output: Send;
}
