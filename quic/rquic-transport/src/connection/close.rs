//! Bounded exponential backoff for retransmitting the final
//! `CONNECTION_CLOSE` while a connection is `Draining` (RFC 9000 section
//! 10.2): each incoming packet that arrives during the drain period causes
//! one more retransmission, spaced further apart each time, until the
//! drain deadline expires.

use core::time::Duration;
use rquic_core::{connection::close::State, time::Timestamp};

#[derive(Debug)]
pub struct CloseRetry {
    pto: Duration,
    attempts: u32,
}

impl CloseRetry {
    pub fn new(pto: Duration) -> Self {
        Self { pto, attempts: 0 }
    }

    /// An incoming packet arrived while draining; returns the next backoff
    /// deadline to arm `timer::Kind::CloseRetry` with, capped at the same
    /// 3x PTO bound that sizes the overall draining period.
    pub fn on_packet_received(&mut self, now: Timestamp, draining_deadline: Timestamp) -> Timestamp {
        let backoff = self.pto.saturating_mul(1 << self.attempts.min(4));
        self.attempts += 1;
        let at = now.checked_add(backoff).unwrap_or(draining_deadline);
        at.min(draining_deadline)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// Convenience re-export so callers only need one import for both the
/// close sub-state and its retry backoff.
pub use rquic_core::connection::close::State as DrainState;

pub fn draining_deadline(now: Timestamp, pto: Duration) -> Timestamp {
    now.checked_add(State::draining_duration(pto)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_secs(secs))
    }

    #[test]
    fn backoff_grows_but_never_exceeds_the_draining_deadline() {
        let pto = Duration::from_millis(100);
        let mut retry = CloseRetry::new(pto);
        let deadline = draining_deadline(t(0), pto);

        let first = retry.on_packet_received(t(0), deadline);
        let second = retry.on_packet_received(first, deadline);
        assert!(second >= first);
        assert!(second <= deadline);

        for _ in 0..10 {
            let next = retry.on_packet_received(t(0), deadline);
            assert!(next <= deadline);
        }
    }
}
