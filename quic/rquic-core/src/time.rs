// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Time related datatypes.
//!
//! `Timestamp`s are opaque points in time, similar to `std::time::Instant`,
//! but constructible without a standard library clock so tests can drive
//! them deterministically.

use core::{fmt, num::NonZeroU64, ops, time::Duration};

const ONE_MICROSECOND: NonZeroU64 = match NonZeroU64::new(1) {
    Some(v) => v,
    None => unreachable!(),
};

/// An absolute point in time, opaque except for comparison against other
/// `Timestamp`s sourced from the same clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NonZeroU64);

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0.get())
    }
}

impl Timestamp {
    /// Constructs a `Timestamp` from a `Duration` since an arbitrary, clock
    /// specific, epoch.
    #[inline]
    pub fn from_duration(duration: Duration) -> Self {
        let micros = duration.as_micros().min(u64::MAX as u128) as u64;
        let micros = NonZeroU64::new(micros).unwrap_or(ONE_MICROSECOND);
        Self(micros)
    }

    #[inline]
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(self.0.get())
    }

    #[inline]
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        self.as_duration()
            .checked_add(duration)
            .map(Self::from_duration)
    }

    #[inline]
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.as_duration()
            .checked_sub(duration)
            .map(Self::from_duration)
    }

    /// The `Duration` that elapsed since `earlier`. Returns `Duration::ZERO`
    /// if `earlier` is actually later than `self`.
    #[inline]
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        self.as_duration()
            .checked_sub(earlier.as_duration())
            .unwrap_or(Duration::ZERO)
    }
}

impl ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Timestamp {
        self.checked_add(rhs).expect("timestamp overflow")
    }
}

impl ops::Sub<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn sub(self, rhs: Duration) -> Timestamp {
        self.checked_sub(rhs).expect("timestamp underflow")
    }
}

impl ops::Sub<Timestamp> for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_since_never_goes_negative() {
        let earlier = Timestamp::from_duration(Duration::from_secs(5));
        let later = Timestamp::from_duration(Duration::from_secs(10));
        assert_eq!(later - earlier, Duration::from_secs(5));
        assert_eq!(earlier.saturating_duration_since(later), Duration::ZERO);
    }

    #[test]
    fn add_then_sub_is_identity() {
        let t = Timestamp::from_duration(Duration::from_millis(1500));
        let d = Duration::from_millis(250);
        assert_eq!((t + d) - d, t);
    }
}
