//! Time-bounded single-value cache
//!
//! Holds the last listing the background refresh wrote. Readers get it back
//! only while it is younger than the TTL.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Entry<T> {
    value: T,
    written_at: Instant,
}

pub struct TtlCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if written less than `ttl` ago
    pub fn get(&self) -> Option<T> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        entry
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.written_at) < self.ttl)
            .map(|e| e.value.clone())
    }

    pub fn put(&self, value: T) {
        let written_at = self.clock.now();
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(Entry { value, written_at });
    }

    pub fn invalidate(&self) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = None;
    }

    /// Time since the last write, fresh or not
    pub fn age(&self) -> Option<Duration> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        entry
            .as_ref()
            .map(|e| now.saturating_duration_since(e.written_at))
    }
}
