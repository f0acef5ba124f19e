use chrono::{DateTime, Utc};

/// The sole read of the real wall clock. Every other
/// component in this workspace that needs "now" takes a `MarketClock`
/// (or a raw timestamp passed down from one), never `Utc::now()`
/// directly, so tests can supply a [`FixedTimeSource`].
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production time source: the real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic time source for tests: always returns the same instant
/// unless advanced.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    at: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedTimeSource {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at: std::sync::Arc::new(std::sync::Mutex::new(at)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.at.lock().unwrap() = at;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.at.lock().unwrap();
        *guard += duration;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock().unwrap()
    }
}
