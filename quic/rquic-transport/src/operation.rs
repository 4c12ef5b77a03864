//! The work items a connection's worker drains on each wake-up: received
//! datagrams, application requests, and internal signals, plus a priority
//! lane for the handful of operations that must jump the regular queue.

use std::collections::VecDeque;

use crate::stream::StreamRequestId;
use rquic_core::{
    connection,
    packet::{PacketNumber, PacketNumberSpace},
    stream,
};

/// The most operations `Connection::drain_operations` processes in one
/// pass before yielding back to the worker, so one busy connection cannot
/// starve its siblings on the same worker.
pub const OPERATION_BATCH: usize = 16;

#[derive(Debug)]
pub enum Operation {
    /// A datagram addressed to this connection arrived at the `Binding`.
    /// Header protection removal and AEAD decryption happen upstream of
    /// this queue (the packet-protection layer this crate doesn't
    /// implement); by the time a datagram reaches here its packet number
    /// space and number are already known, and `payload` is the decrypted
    /// frame stream.
    DatagramReceived { payload: Vec<u8>, ecn: rquic_core::inet::ExplicitCongestionNotification, space: PacketNumberSpace, packet_number: PacketNumber },
    /// The application issued a stream request (send/receive/reset/...).
    StreamRequest { id: StreamRequestId, request: stream::ops::Request },
    /// A previously armed timer fired.
    TimerExpired(crate::timer::Kind),
    /// Local API call to close the connection.
    Shutdown { error: connection::Error },
    /// A migration target resolved a destination worker for this connection.
    RouteResolved { worker: crate::worker::WorkerId },
    /// Drop this connection's state; no further operations are valid after.
    Free,
}

impl Operation {
    /// `Shutdown`/`RouteResolved`/`Free` skip the regular FIFO queue so a
    /// connection already being torn down doesn't keep processing
    /// unrelated work first.
    fn is_priority(&self) -> bool {
        matches!(self, Self::Shutdown { .. } | Self::RouteResolved { .. } | Self::Free)
    }
}

#[derive(Debug, Default)]
pub struct Queue {
    priority: VecDeque<Operation>,
    regular: VecDeque<Operation>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        if operation.is_priority() {
            self.priority.push_back(operation);
        } else {
            self.regular.push_back(operation);
        }
    }

    pub fn pop(&mut self) -> Option<Operation> {
        self.priority.pop_front().or_else(|| self.regular.pop_front())
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.regular.is_empty()
    }

    pub fn len(&self) -> usize {
        self.priority.len() + self.regular.len()
    }
}

/// What `drain_operations` tells the worker to do once a batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// More operations remain; re-enqueue this connection immediately.
    ReQueue,
    /// The queue emptied; park until the next wake-up (timer or new operation).
    Park,
    /// The connection is finished and may be freed.
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_operations_jump_the_regular_queue() {
        let mut queue = Queue::new();
        queue.push(Operation::TimerExpired(crate::timer::Kind::Idle));
        queue.push(Operation::Shutdown { error: connection::Error::Closed { initiator: connection::Initiator::Local } });

        assert!(matches!(queue.pop(), Some(Operation::Shutdown { .. })));
        assert!(matches!(queue.pop(), Some(Operation::TimerExpired(_))));
        assert!(queue.is_empty());
    }

    #[test]
    fn batch_size_bounds_one_drain_pass() {
        let mut queue = Queue::new();
        for _ in 0..OPERATION_BATCH * 2 {
            queue.push(Operation::TimerExpired(crate::timer::Kind::Idle));
        }
        let mut drained = 0;
        while drained < OPERATION_BATCH {
            queue.pop().unwrap();
            drained += 1;
        }
        assert_eq!(queue.len(), OPERATION_BATCH);
    }
}
