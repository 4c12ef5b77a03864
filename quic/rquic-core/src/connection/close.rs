// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The closing/draining sub-states a connection passes through once
//! `Error` has been decided (RFC 9000 section 10).

use crate::time::Timestamp;
use core::time::Duration;

/// How a connection behaves after it has decided to close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Still processing packets normally.
    Active,
    /// Retransmits the CONNECTION_CLOSE frame in response to any incoming
    /// packet, subject to an anti-amplification rate limit, until
    /// `deadline`.
    Closing { deadline: Timestamp },
    /// Discards incoming packets without responding until `deadline`,
    /// after which all connection state may be freed.
    Draining { deadline: Timestamp },
}

impl State {
    /// RFC 9000 section 10.2: three times the current PTO, bounded below
    /// to guarantee at least one round trip's worth of delayed packets
    /// are drained before state is freed.
    #[inline]
    pub fn draining_duration(pto: Duration) -> Duration {
        (pto * 3).max(Duration::from_millis(200))
    }

    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    #[inline]
    pub fn deadline(self) -> Option<Timestamp> {
        match self {
            Self::Active => None,
            Self::Closing { deadline } | Self::Draining { deadline } => Some(deadline),
        }
    }

    #[inline]
    pub fn is_expired(self, now: Timestamp) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draining_duration_has_a_floor() {
        assert_eq!(State::draining_duration(Duration::from_millis(1)), Duration::from_millis(200));
        assert_eq!(State::draining_duration(Duration::from_secs(1)), Duration::from_secs(3));
    }
}
