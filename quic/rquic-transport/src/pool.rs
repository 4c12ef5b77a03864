//! Per-worker free-lists for fixed-size buffer blocks. Each worker owns one
//! `Pool` and only ever allocates from its own; a block freed by a
//! different worker than the one that allocated it can't be pushed back
//! onto that worker's free-list without crossing a lock, so it's queued
//! for the owning worker to reclaim on its own time instead — slower for
//! that one block, but it keeps the common case lock-free.

use crate::worker::WorkerId;
use std::sync::Mutex;

#[derive(Debug)]
pub struct Block {
    pub bytes: Vec<u8>,
    owner: WorkerId,
}

impl Block {
    pub fn owner(&self) -> WorkerId {
        self.owner
    }
}

/// One worker's allocator: a local free-list it pops/pushes without
/// synchronization, and a `Mutex`-guarded return queue other workers push
/// blocks they're done with but didn't originally allocate.
#[derive(Debug)]
pub struct Pool {
    owner: WorkerId,
    block_size: usize,
    free: Vec<Block>,
    returned: Mutex<Vec<Block>>,
}

impl Pool {
    pub fn new(owner: WorkerId, block_size: usize) -> Self {
        Self { owner, block_size, free: Vec::new(), returned: Mutex::new(Vec::new()) }
    }

    /// Pops a free block, first reclaiming anything other workers have
    /// returned, allocating a fresh one only if both are empty.
    pub fn acquire(&mut self) -> Block {
        if self.free.is_empty() {
            self.reclaim_returned();
        }
        self.free.pop().unwrap_or_else(|| Block { bytes: vec![0u8; self.block_size], owner: self.owner })
    }

    fn reclaim_returned(&mut self) {
        let mut returned = self.returned.lock().expect("pool return queue poisoned");
        self.free.append(&mut returned);
    }

    /// Releases a block this pool owns back onto its local free-list.
    /// Releasing a block owned by a different worker is the caller's bug —
    /// it should have gone to `return_from_other_worker` on that worker's
    /// pool instead.
    pub fn release(&mut self, block: Block) {
        debug_assert_eq!(block.owner, self.owner);
        self.free.push(block);
    }

    /// Lets another worker deposit a block this pool owns without routing
    /// through that worker's own local free-list first.
    pub fn return_from_other_worker(&self, block: Block) {
        debug_assert_eq!(block.owner, self.owner);
        self.returned.lock().expect("pool return queue poisoned").push(block);
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquired_blocks_are_tagged_with_their_owner() {
        let mut pool = Pool::new(WorkerId::new(3), 64);
        let block = pool.acquire();
        assert_eq!(block.owner(), WorkerId::new(3));
        assert_eq!(block.bytes.len(), 64);
    }

    #[test]
    fn blocks_returned_by_another_worker_are_reclaimed_on_next_acquire() {
        let pool = Pool::new(WorkerId::new(1), 64);
        let foreign_block = Block { bytes: vec![0u8; 64], owner: WorkerId::new(1) };
        pool.return_from_other_worker(foreign_block);

        let mut pool = pool;
        assert_eq!(pool.len(), 0);
        let reclaimed = pool.acquire();
        assert_eq!(reclaimed.owner(), WorkerId::new(1));
    }
}
