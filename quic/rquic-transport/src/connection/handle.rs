//! A connection is referenced from several places at once — the lookup
//! table, in-flight lookup results, the owning worker, the timer wheel, a
//! pending route resolution, and each open stream's handle back to its
//! connection. `RefCount` tracks all of them in one atomic so the last
//! reference to go away can tell the difference between "still reachable
//! somewhere" and "safe to free".

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Kind {
    Handle = 0,
    LookupTable = 1,
    LookupResult = 2,
    Worker = 3,
    TimerWheel = 4,
    Route = 5,
    Stream = 6,
}

const KIND_COUNT: usize = 7;

#[derive(Debug)]
pub struct RefCount {
    counts: [AtomicUsize; KIND_COUNT],
}

impl Default for RefCount {
    fn default() -> Self {
        Self { counts: core::array::from_fn(|_| AtomicUsize::new(0)) }
    }
}

impl RefCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, kind: Kind) {
        self.counts[kind as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Releases one reference of `kind`. When the release is of
    /// `LookupResult` and it brings the total to zero, the caller should
    /// enqueue `Operation::Free` rather than dropping connection state
    /// synchronously, since a `Free` racing a fresh `acquire` on another
    /// thread is easier to reason about than a destructor running under a
    /// lock held by the lookup table.
    pub fn release(&self, kind: Kind) -> bool {
        let previous = self.counts[kind as usize].fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "released a reference that was never acquired");
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|count| count.load(Ordering::Acquire)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_reaches_zero_only_after_every_kind_releases() {
        let refs = RefCount::new();
        refs.acquire(Kind::Handle);
        refs.acquire(Kind::LookupTable);
        assert!(!refs.release(Kind::Handle));
        assert!(refs.release(Kind::LookupTable));
    }
}
