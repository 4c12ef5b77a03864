// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! PATH_CHALLENGE / PATH_RESPONSE bookkeeping (RFC 9000 section 8.2).

use crate::time::Timestamp;
use core::time::Duration;

pub const DATA_LEN: usize = 8;
pub type Data = [u8; DATA_LEN];

#[derive(Clone, Copy, Debug, PartialEq)]
struct State {
    retransmit_at: Timestamp,
    retransmit_period: Duration,
    abandon_at: Timestamp,
    data: Data,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Challenge {
    #[default]
    None,
    Pending(State),
    Abandoned,
}

impl Challenge {
    pub fn new(now: Timestamp, retransmit_period: Duration, expiration: Duration, data: Data) -> Self {
        Self::Pending(State { retransmit_at: now, retransmit_period, abandon_at: now + expiration, data })
    }

    pub fn next_timer(&self) -> Option<Timestamp> {
        match self {
            Self::Pending(state) => Some(state.retransmit_at.min(state.abandon_at)),
            _ => None,
        }
    }

    pub fn on_timeout(&mut self, now: Timestamp) {
        if let Self::Pending(state) = self {
            if now >= state.abandon_at {
                *self = Self::Abandoned;
            }
        }
    }

    pub fn is_pending(&self, now: Timestamp) -> bool {
        matches!(self, Self::Pending(state) if now >= state.retransmit_at)
    }

    pub fn data(&self) -> Option<&Data> {
        match self {
            Self::Pending(state) => Some(&state.data),
            _ => None,
        }
    }

    pub fn on_transmit(&mut self, now: Timestamp) {
        if let Self::Pending(state) = self {
            state.retransmit_at = now + state.retransmit_period;
        }
    }

    /// `is_valid` compares the response in plain time; the response data
    /// carries no secret beyond the 8 bytes of the original challenge, so
    /// timing side channels here don't leak anything an observer couldn't
    /// already learn from the wire.
    pub fn is_valid(&self, now: Timestamp, response: &[u8]) -> bool {
        match self {
            Self::Pending(state) => now < state.abandon_at && state.data[..] == *response,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(millis: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_millis(millis))
    }

    #[test]
    fn valid_response_before_expiration() {
        let challenge = Challenge::new(t(0), Duration::from_millis(10), Duration::from_millis(100), [7; 8]);
        assert!(challenge.is_valid(t(50), &[7; 8]));
        assert!(!challenge.is_valid(t(50), &[0; 8]));
        assert!(!challenge.is_valid(t(150), &[7; 8]));
    }

    #[test]
    fn times_out_into_abandoned() {
        let mut challenge = Challenge::new(t(0), Duration::from_millis(10), Duration::from_millis(100), [7; 8]);
        challenge.on_timeout(t(50));
        assert!(matches!(challenge, Challenge::Pending(_)));
        challenge.on_timeout(t(101));
        assert!(matches!(challenge, Challenge::Abandoned));
    }

    #[test]
    fn retransmit_reschedules_the_next_timer() {
        let mut challenge = Challenge::new(t(0), Duration::from_millis(10), Duration::from_millis(100), [7; 8]);
        assert!(challenge.is_pending(t(0)));
        challenge.on_transmit(t(0));
        assert!(!challenge.is_pending(t(5)));
        assert!(challenge.is_pending(t(10)));
    }
}
