use chrono::{DateTime, TimeZone, Utc};

/// Source of the valuation timestamp, injectable so runs can be replayed
/// bit-for-bit in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time rendered in a display timezone.
    fn now_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz>
    where
        Self: Sized,
    {
        self.now().with_timezone(tz)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
