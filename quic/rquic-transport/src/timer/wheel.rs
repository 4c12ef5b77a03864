//! Aggregates the next deadline across every connection a worker owns, so
//! the worker's event loop can sleep until the single earliest timer
//! instead of polling each connection's `Set` on every tick.

use core::cmp::Reverse;
use rquic_core::time::Timestamp;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Entry<H> {
    at: Timestamp,
    handle: H,
}

impl<H> PartialEq for Entry<H> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}
impl<H> Eq for Entry<H> {}
impl<H> PartialOrd for Entry<H> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<H> Ord for Entry<H> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.at.cmp(&other.at)
    }
}

/// A min-heap of `(deadline, connection handle)`. Stale entries (a
/// connection re-armed its timer to a later time before the old one fired)
/// are left in place and discarded lazily when popped, rather than
/// removed eagerly, since `BinaryHeap` has no efficient decrease-key.
#[derive(Debug)]
pub struct Wheel<H> {
    heap: BinaryHeap<Reverse<Entry<H>>>,
}

impl<H> Default for Wheel<H> {
    fn default() -> Self {
        Self { heap: BinaryHeap::new() }
    }
}

impl<H: Copy + Eq> Wheel<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, handle: H, at: Timestamp) {
        self.heap.push(Reverse(Entry { at, handle }));
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.heap.peek().map(|Reverse(entry)| entry.at)
    }

    /// Pops every handle whose scheduled deadline has passed. A handle may
    /// be re-armed and pushed again while draining, so the caller should
    /// check the handle's own timer set for the current deadline rather
    /// than trusting the popped value is still live.
    pub fn pop_expired(&mut self, now: Timestamp, current: impl Fn(H) -> Option<Timestamp>) -> Vec<H> {
        let mut fired = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.at > now {
                break;
            }
            let Reverse(entry) = self.heap.pop().unwrap();
            if current(entry.handle) == Some(entry.at) {
                fired.push(entry.handle);
            }
        }
        fired
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
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
    fn pops_only_handles_whose_current_deadline_still_matches() {
        let mut wheel: Wheel<u32> = Wheel::new();
        wheel.schedule(1, t(5));
        wheel.schedule(2, t(10));
        wheel.schedule(1, t(20)); // 1 re-armed to a later deadline

        let fired = wheel.pop_expired(t(15), |handle| if handle == 1 { Some(t(20)) } else { Some(t(10)) });
        assert_eq!(fired, vec![2]);
        assert_eq!(wheel.next_deadline(), Some(t(20)));
    }
}
