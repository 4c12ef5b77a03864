//! RFC 9221 DATAGRAM extension: an unreliable, unordered queue of
//! application payloads that bypasses stream flow control entirely.
//! Negotiated via the peer's `max_datagram_frame_size` transport
//! parameter rather than always-on, so a connection starts out unable to
//! send any until that's known.

use std::collections::VecDeque;

/// `None` until the peer's transport parameters are processed; `Some(0)`
/// means the peer advertised support but with no size limit communicated
/// beyond what the path MTU allows, matching RFC 9221 section 3's
/// "absence of the parameter disables the extension entirely" rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Negotiated {
    pub peer_max_frame_size: Option<u64>,
}

impl Negotiated {
    pub fn can_send(&self) -> bool {
        self.peer_max_frame_size.is_some()
    }

    pub fn max_frame_size(&self) -> u64 {
        self.peer_max_frame_size.unwrap_or(0)
    }
}

/// Send and receive queues for the extension. Unlike `stream::Manager`,
/// there's no per-item state machine: a datagram that doesn't fit in the
/// next packet opportunity is simply dropped, since RFC 9221 section 1
/// explicitly trades reliability for low latency.
#[derive(Debug, Default)]
pub struct Manager {
    negotiated: Negotiated,
    outbound: VecDeque<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_transport_parameters(&mut self, peer_max_frame_size: Option<u64>) {
        self.negotiated.peer_max_frame_size = peer_max_frame_size;
    }

    pub fn negotiated(&self) -> Negotiated {
        self.negotiated
    }

    /// Queues `data` to send, provided it fits under the peer's
    /// negotiated limit. Returns `false` (and drops nothing — the caller
    /// still owns `data`) if the extension isn't negotiated or the
    /// payload is too large to ever fit.
    pub fn queue(&mut self, data: Vec<u8>) -> bool {
        if !self.negotiated.can_send() || data.len() as u64 > self.negotiated.max_frame_size() {
            return false;
        }
        self.outbound.push_back(data);
        true
    }

    /// Pops the next datagram that fits in `max_len`, if any is queued.
    /// A datagram too large for the current packet opportunity is left in
    /// place rather than dropped — it may fit once the MTU search raises
    /// the budget, and FIFO order is preserved for same-size datagrams.
    pub fn take_next(&mut self, max_len: usize) -> Option<Vec<u8>> {
        let fits = self.outbound.front().is_some_and(|d| d.len() <= max_len);
        if fits {
            self.outbound.pop_front()
        } else {
            None
        }
    }

    pub fn on_datagram_received(&mut self, data: &[u8]) {
        self.inbound.push_back(data.to_vec());
    }

    pub fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queuing_before_negotiation_is_rejected() {
        let mut manager = Manager::new();
        assert!(!manager.queue(vec![1, 2, 3]));
    }

    #[test]
    fn oversized_datagrams_are_rejected_after_negotiation() {
        let mut manager = Manager::new();
        manager.on_transport_parameters(Some(4));
        assert!(!manager.queue(vec![0u8; 5]));
        assert!(manager.queue(vec![0u8; 4]));
    }

    #[test]
    fn take_next_waits_for_a_large_enough_packet_opportunity() {
        let mut manager = Manager::new();
        manager.on_transport_parameters(Some(100));
        manager.queue(vec![0u8; 50]);
        assert_eq!(manager.take_next(10), None);
        assert_eq!(manager.take_next(50).map(|d| d.len()), Some(50));
    }
}
