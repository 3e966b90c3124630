use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering::SeqCst;
use std::time::{SystemTime, UNIX_EPOCH};

use ClockSource::{FixedOffset, Mock, System};

/// A source of time.
///
/// The client fills in request times and judges trust expiries from one of
/// these; injecting `Mock` makes retry and expiry behavior deterministic
/// under test.
#[derive(Debug, Clone)]
pub enum ClockSource {
    /// Clock source based on the system clock.
    System,

    /// Maintains a fixed number of seconds offset (positive or negative)
    /// from the system clock. Only for testing.
    FixedOffset(i16),

    /// Only for testing.
    Mock(Arc<AtomicI64>),
}

impl ClockSource {
    pub fn new_mock(now: i64) -> ClockSource {
        Mock(Arc::new(AtomicI64::new(now)))
    }

    /// Returns the number of seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            System => match SystemTime::now().duration_since(UNIX_EPOCH) {
                Ok(n) => n.as_secs() as i64,
                Err(e) => panic!("SystemTime before UNIX EPOCH! {e:?}"),
            },
            FixedOffset(offset) => System.epoch_seconds() + *offset as i64,
            Mock(now) => now.load(SeqCst),
        }
    }

    /// Sets the current time of this Mock clock.
    /// For test use only.
    pub fn set_time(&self, now: i64) {
        match self {
            System | FixedOffset(_) => unreachable!(),
            Mock(n) => n.store(now, SeqCst),
        }
    }

    /// Advances this Mock clock by the given number of seconds.
    /// For test use only.
    pub fn advance(&self, delta: i64) {
        match self {
            System | FixedOffset(_) => unreachable!(),
            Mock(n) => n.store(n.load(SeqCst) + delta, SeqCst),
        }
    }
}
