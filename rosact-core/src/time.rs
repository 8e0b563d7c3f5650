//! Wall-clock timestamps for actionlib messages.

use std::time::{Duration, SystemTime};

/// A wall-clock timestamp carried inside goal ids, headers and cancel
/// messages.
///
/// The zero timestamp doubles as the protocol's "cancel everything"
/// sentinel, so `Time::zero()` is meaningful on the wire and not merely a
/// default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    /// Seconds since UNIX epoch.
    pub sec: i32,

    /// Nanoseconds component.
    pub nanosec: u32,
}

impl Time {
    /// Creates a new timestamp.
    pub const fn new(sec: i32, nanosec: u32) -> Self {
        Self { sec, nanosec }
    }

    /// The zero timestamp (UNIX epoch). Also the "all goals" cancel sentinel.
    pub const fn zero() -> Self {
        Self { sec: 0, nanosec: 0 }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        SystemTime::now().into()
    }

    /// Whether this is the zero timestamp.
    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nanosec == 0
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<&SystemTime> for Time {
    fn from(t: &SystemTime) -> Self {
        let dur = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        let sec = dur.as_secs();
        if sec > i32::MAX as u64 {
            panic!("SystemTime too far in future (year-2038 problem)");
        }

        Time {
            sec: sec as i32,
            nanosec: dur.subsec_nanos(),
        }
    }
}

impl From<SystemTime> for Time {
    fn from(t: SystemTime) -> Self {
        (&t).into()
    }
}

impl From<&Time> for SystemTime {
    fn from(t: &Time) -> Self {
        SystemTime::UNIX_EPOCH
            + Duration::from_secs(t.sec as u64)
            + Duration::from_nanos(t.nanosec as u64)
    }
}

impl From<Time> for SystemTime {
    fn from(t: Time) -> Self {
        (&t).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_sentinel() {
        assert!(Time::zero().is_zero());
        assert!(!Time::new(1, 0).is_zero());
        assert_eq!(Time::default(), Time::zero());
    }

    #[test]
    fn test_system_time_round_trip() {
        let now = SystemTime::now();
        let t: Time = now.into();
        let back: SystemTime = t.into();
        let diff = now
            .duration_since(back)
            .unwrap_or_else(|e| e.duration());
        assert!(diff < Duration::from_micros(1));
    }
}
