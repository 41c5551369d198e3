//! Clock abstraction for controllable backoff timing.
//!
//! The delivery client sleeps between retry attempts. Production code uses
//! [`RealClock`]; tests inject [`TestClock`] so backoff sequences can be
//! asserted without waiting out real delays.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Time source for backoff sleeps.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Deterministic clock for tests.
///
/// Sleeps complete immediately and are recorded in order, so a test can
/// assert the exact delay sequence a retry loop produced.
#[derive(Debug, Clone, Default)]
pub struct TestClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl TestClock {
    /// Creates a new test clock with no recorded sleeps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded sleep durations in the order they occurred.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().clone()
    }

    /// Returns the sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.lock().iter().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        self.sleeps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for TestClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.lock().push(duration);
        Box::pin(std::future::ready(()))
    }
}
