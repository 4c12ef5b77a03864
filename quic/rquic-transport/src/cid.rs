//! Connection-ID bookkeeping (RFC 9000 section 5.1): the set of IDs the
//! peer has told us we may use to address them (`peer_issued`), and the
//! set we've told the peer it may use to address us (`local_issued`).
//!
//! This is connection-local state. The endpoint-wide routing table that
//! maps a wire connection ID to a connection (`crate::endpoint::Lookup`)
//! lives outside `Connection` entirely, so changes here surface as
//! [`crate::event::Event::ConnectionIdIssued`] /
//! [`crate::event::Event::ConnectionIdRetired`] for whoever owns that
//! table to apply.

use rquic_core::{connection::id::Entry, connection::ConnectionId, stateless_reset::Token};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// A `NEW_CONNECTION_ID` frame's `retire_prior_to` moved backwards
    /// (RFC 9000 section 19.15 requires it be non-decreasing).
    RetirePriorToRegressed,
}

/// Tracks both directions of connection-ID exchange for one connection.
#[derive(Debug, Default)]
pub struct Table {
    peer_issued: VecDeque<Entry>,
    retire_prior_to: u64,
    local_issued: Vec<Entry>,
    next_local_sequence_number: u64,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a `NEW_CONNECTION_ID` frame: records the offered ID and
    /// retires any of the peer's earlier-issued IDs the new watermark
    /// covers.
    pub fn on_new_connection_id(&mut self, id: ConnectionId, sequence_number: u64, retire_prior_to: u64, stateless_reset_token: Token) -> Result<(), Rejected> {
        if retire_prior_to < self.retire_prior_to {
            return Err(Rejected::RetirePriorToRegressed);
        }
        self.retire_prior_to = retire_prior_to;
        self.peer_issued.retain(|entry| entry.sequence_number >= retire_prior_to);
        if !self.peer_issued.iter().any(|entry| entry.sequence_number == sequence_number) {
            self.peer_issued.push_back(Entry { id, sequence_number, stateless_reset_token });
        }
        Ok(())
    }

    /// Applies a `RETIRE_CONNECTION_ID` frame naming one of our own
    /// previously issued IDs, returning it so the caller can surface
    /// [`crate::event::Event::ConnectionIdRetired`].
    pub fn on_retire_connection_id(&mut self, sequence_number: u64) -> Option<ConnectionId> {
        let position = self.local_issued.iter().position(|entry| entry.sequence_number == sequence_number)?;
        Some(self.local_issued.remove(position).id)
    }

    /// Mints a new local connection ID to offer the peer, returning the
    /// sequence number a `NEW_CONNECTION_ID` frame should carry.
    pub fn issue(&mut self, id: ConnectionId, stateless_reset_token: Token) -> u64 {
        let sequence_number = self.next_local_sequence_number;
        self.next_local_sequence_number += 1;
        self.local_issued.push(Entry { id, sequence_number, stateless_reset_token });
        sequence_number
    }

    /// The connection ID this connection should currently use to address
    /// its peer, if the peer has offered one.
    pub fn peer_connection_id(&self) -> Option<ConnectionId> {
        self.peer_issued.front().map(|entry| entry.id)
    }

    pub fn local_issued_len(&self) -> usize {
        self.local_issued.len()
    }

    pub fn peer_issued_len(&self) -> usize {
        self.peer_issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ConnectionId {
        ConnectionId::try_from_bytes(&[byte; 8]).unwrap()
    }

    #[test]
    fn a_new_connection_id_becomes_available_to_address_the_peer_with() {
        let mut table = Table::new();
        table.on_new_connection_id(id(1), 0, 0, Token::ZEROED).unwrap();
        assert_eq!(table.peer_connection_id(), Some(id(1)));
    }

    #[test]
    fn retire_prior_to_drops_earlier_peer_issued_ids() {
        let mut table = Table::new();
        table.on_new_connection_id(id(1), 0, 0, Token::ZEROED).unwrap();
        table.on_new_connection_id(id(2), 1, 1, Token::ZEROED).unwrap();
        assert_eq!(table.peer_issued_len(), 1);
        assert_eq!(table.peer_connection_id(), Some(id(2)));
    }

    #[test]
    fn a_regressing_retire_prior_to_is_rejected() {
        let mut table = Table::new();
        table.on_new_connection_id(id(1), 0, 1, Token::ZEROED).unwrap();
        assert_eq!(table.on_new_connection_id(id(2), 1, 0, Token::ZEROED), Err(Rejected::RetirePriorToRegressed));
    }

    #[test]
    fn retiring_a_locally_issued_id_removes_it() {
        let mut table = Table::new();
        let sequence_number = table.issue(id(3), Token::ZEROED);
        assert_eq!(table.local_issued_len(), 1);
        assert_eq!(table.on_retire_connection_id(sequence_number), Some(id(3)));
        assert_eq!(table.local_issued_len(), 0);
    }

    #[test]
    fn retiring_an_unknown_sequence_number_is_a_no_op() {
        let mut table = Table::new();
        assert_eq!(table.on_retire_connection_id(99), None);
    }
}
