//! Per-connection timers (a small fixed set, one deadline per concern) and
//! the worker-level structure that finds the next one to fire across every
//! connection it owns.

pub mod wheel;

pub use wheel::Wheel;

use rquic_core::time::Timestamp;

/// The handful of deadlines a connection tracks. Order matches priority
/// when two timers land on the same instant (lower index fires first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Kind {
    LossDetection = 0,
    PathValidation = 1,
    KeepAlive = 2,
    Idle = 3,
    MtuProbe = 4,
    /// RFC 9000 section 10.2.2: bounded retransmission of the final
    /// CONNECTION_CLOSE while draining.
    CloseRetry = 5,
}

const COUNT: usize = 6;
const KINDS: [Kind; COUNT] = [Kind::LossDetection, Kind::PathValidation, Kind::KeepAlive, Kind::Idle, Kind::MtuProbe, Kind::CloseRetry];

/// One connection's armed deadlines. Finding the earliest is a linear scan
/// over six `Option<Timestamp>` slots, which is cheaper than a heap at this
/// size and keeps the type `Copy`-friendly.
#[derive(Clone, Copy, Debug, Default)]
pub struct Set {
    deadlines: [Option<Timestamp>; COUNT],
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: Kind, at: Timestamp) {
        self.deadlines[kind as usize] = Some(at);
    }

    pub fn cancel(&mut self, kind: Kind) {
        self.deadlines[kind as usize] = None;
    }

    pub fn get(&self, kind: Kind) -> Option<Timestamp> {
        self.deadlines[kind as usize]
    }

    /// The earliest armed deadline and which timer it belongs to, if any
    /// are armed.
    pub fn next_expiration(&self) -> Option<(Kind, Timestamp)> {
        KINDS.iter().filter_map(|&kind| self.deadlines[kind as usize].map(|at| (kind, at))).min_by_key(|&(_, at)| at)
    }

    /// Every timer whose deadline has passed, in priority order, clearing
    /// them as they're returned so they don't fire twice.
    pub fn expired(&mut self, now: Timestamp) -> impl Iterator<Item = Kind> + '_ {
        KINDS.into_iter().filter(move |&kind| {
            let fired = self.deadlines[kind as usize].is_some_and(|at| at <= now);
            if fired {
                self.deadlines[kind as usize] = None;
            }
            fired
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_secs(secs))
    }

    #[test]
    fn next_expiration_picks_the_earliest_armed_timer() {
        let mut set = Set::new();
        set.set(Kind::Idle, t(10));
        set.set(Kind::LossDetection, t(5));
        assert_eq!(set.next_expiration(), Some((Kind::LossDetection, t(5))));
    }

    #[test]
    fn expired_clears_fired_timers_but_leaves_future_ones_armed() {
        let mut set = Set::new();
        set.set(Kind::Idle, t(1));
        set.set(Kind::KeepAlive, t(100));

        let fired: Vec<_> = set.expired(t(5)).collect();
        assert_eq!(fired, vec![Kind::Idle]);
        assert!(set.get(Kind::Idle).is_none());
        assert_eq!(set.get(Kind::KeepAlive), Some(t(100)));
    }
}
