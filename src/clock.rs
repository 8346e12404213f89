use crate::model::Timestamp;
use chrono::Local;

pub const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().format(DISPLAY_FORMAT).to_string()
    }
}

/// Always returns the same stamp. Used by tests and by callers that already
/// captured the time on their side.
#[derive(Debug, Clone)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.clone()
    }
}
