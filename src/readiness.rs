//! Bounded polling until a remote resource reports ready.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Coarse readiness of a polled resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadinessState {
    /// Keep polling.
    Pending,
    /// The resource is usable.
    Ready,
    /// The resource reached a state it cannot recover from.
    Failed,
}

/// Implemented by resources the poller can wait on.
pub trait Readiness {
    /// Reports the readiness of this snapshot.
    fn readiness(&self) -> ReadinessState;
}

/// Reasons a poll loop stopped without a ready resource.
#[derive(Debug)]
pub enum PollError<T, E> {
    /// The refresh call itself failed; no further attempts were made.
    Refresh(E),
    /// The resource entered a terminal failure state.
    Terminal(T),
    /// The attempt cap or deadline ran out while the resource was pending.
    Exhausted {
        /// Number of refresh calls performed.
        attempts: u32,
        /// Last snapshot observed.
        last: T,
    },
}

/// Repeatedly refreshes a resource until it is ready.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadinessPoller {
    interval: Duration,
    timeout: Option<Duration>,
    max_attempts: Option<u32>,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self::new(Duration::from_secs(1)).with_timeout(Some(Duration::from_secs(600)))
    }
}

impl ReadinessPoller {
    /// Creates an unbounded poller sleeping `interval` between refreshes.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            max_attempts: None,
        }
    }

    /// Limits the total time spent polling.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limits the number of refresh calls.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay between refreshes.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Refreshes via `refresh` until the snapshot is ready.
    ///
    /// `on_attempt` runs after every refresh, before the snapshot is
    /// inspected, so callers can emit progress.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Refresh`] as soon as a refresh fails,
    /// [`PollError::Terminal`] when the resource fails, and
    /// [`PollError::Exhausted`] when the configured budget runs out.
    pub async fn wait_until_ready<T, E, F, Fut, P>(
        &self,
        mut refresh: F,
        mut on_attempt: P,
    ) -> Result<T, PollError<T, E>>
    where
        T: Readiness,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(u32, &T),
    {
        let deadline = self
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let mut attempts: u32 = 0;

        loop {
            let snapshot = refresh().await.map_err(PollError::Refresh)?;
            attempts = attempts.saturating_add(1);
            on_attempt(attempts, &snapshot);

            match snapshot.readiness() {
                ReadinessState::Ready => return Ok(snapshot),
                ReadinessState::Failed => return Err(PollError::Terminal(snapshot)),
                ReadinessState::Pending => {}
            }

            let out_of_attempts = self.max_attempts.is_some_and(|max| attempts >= max);
            let out_of_time = deadline.is_some_and(|at| Instant::now() >= at);
            if out_of_attempts || out_of_time {
                return Err(PollError::Exhausted {
                    attempts,
                    last: snapshot,
                });
            }

            sleep(self.interval).await;
        }
    }
}
