use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Source of wall-clock time for a typing session
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Remembers when the first keystroke of a session landed.
#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    started_at: Option<SystemTime>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `now` as the start unless a start is already recorded.
    /// Always returns the effective start.
    pub fn mark_start(&mut self, now: SystemTime) -> SystemTime {
        *self.started_at.get_or_insert(now)
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

/// Minutes between two instants; zero when `end` precedes `start`.
pub fn elapsed_minutes_since(start: SystemTime, end: SystemTime) -> f64 {
    end.duration_since(start).unwrap_or_default().as_secs_f64() / 60.0
}
