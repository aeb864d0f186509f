use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Time source for queue and debounce deadlines.
pub trait Clock: Send + Sync {
    /// Monotonic time used for expiry and debounce deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock time stamped on notifications.
    fn wall_clock(&self) -> DateTime<Utc>;
}

/// Clock backed by the tokio timer (honours `tokio::time::pause`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

#[derive(Debug)]
struct ManualTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                instant: Instant::now(),
                wall: Utc::now(),
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut time = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        time.instant += by;
        if let Ok(delta) = chrono::Duration::from_std(by) {
            time.wall += delta;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).instant
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_both_times() {
        let clock = ManualClock::new();
        let start = clock.now();
        let wall_start = clock.wall_clock();

        clock.advance(Duration::from_millis(1500));

        assert_eq!(clock.now() - start, Duration::from_millis(1500));
        assert_eq!((clock.wall_clock() - wall_start).num_milliseconds(), 1500);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = other.now();

        clock.advance(Duration::from_secs(2));

        assert_eq!(other.now() - start, Duration::from_secs(2));
    }
}
