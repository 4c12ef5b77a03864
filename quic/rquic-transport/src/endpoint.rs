//! The process-wide shared state a connection's own code never touches
//! directly: the connection ID to connection lookup table, and the
//! `Binding` that peeks an incoming datagram's header just far enough to
//! route it there (RFC 9000 section 5.1 connection IDs are this lookup
//! key precisely because the UDP 4-tuple can't be trusted after NAT
//! rebinding or migration).

use hashbrown::HashMap;
use rquic_core::{connection::ConnectionId, inet::ExplicitCongestionNotification, packet};
use siphasher::sip::SipHasher13;
use std::hash::BuildHasher;

use crate::worker::WorkerId;

/// A cheap, `Copy` reference to a connection's shared state, routed to a
/// specific worker. `rquic-transport` never defines what's behind this
/// besides the owning worker, since the lookup table only needs to route,
/// not to touch connection-local state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    pub worker: WorkerId,
    /// Opaque slot index into that worker's connection table.
    pub slot: u32,
}

/// Seeded per-endpoint so an attacker who can observe or influence
/// connection IDs (they're visible on the wire) can't predict hash
/// bucketing well enough to force worst-case collisions in the lookup
/// table.
#[derive(Clone, Copy, Debug)]
pub struct LookupHasher {
    k0: u64,
    k1: u64,
}

impl LookupHasher {
    pub fn new(generator: &mut dyn rquic_core::random::Generator) -> Self {
        let mut seed = [0u8; 16];
        generator.private_random_fill(&mut seed);
        Self { k0: u64::from_le_bytes(seed[..8].try_into().unwrap()), k1: u64::from_le_bytes(seed[8..].try_into().unwrap()) }
    }
}

impl BuildHasher for LookupHasher {
    type Hasher = SipHasher13;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher13::new_with_keys(self.k0, self.k1)
    }
}

/// Maps every connection ID currently in use to the connection it
/// addresses. A connection may be reachable under several IDs at once
/// (RFC 9000 section 5.1.1 issues a batch up front so a NAT rebind or
/// migration doesn't expose the old one in use simultaneously).
#[derive(Debug)]
pub struct Lookup {
    table: HashMap<ConnectionId, ConnectionHandle, LookupHasher>,
}

impl Lookup {
    pub fn new(hasher: LookupHasher) -> Self {
        Self { table: HashMap::with_hasher(hasher) }
    }

    pub fn insert(&mut self, id: ConnectionId, handle: ConnectionHandle) {
        self.table.insert(id, handle);
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.table.remove(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.table.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteResult {
    Found(ConnectionHandle),
    Unknown,
    Malformed,
}

/// Owns the lookup table and the local connection ID length this endpoint
/// hands out, since that's what `packet::peek` needs to know where a
/// short header's destination ID ends.
#[derive(Debug)]
pub struct Binding {
    lookup: Lookup,
    local_connection_id_len: usize,
}

impl Binding {
    pub fn new(lookup: Lookup, local_connection_id_len: usize) -> Self {
        Self { lookup, local_connection_id_len }
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub fn lookup_mut(&mut self) -> &mut Lookup {
        &mut self.lookup
    }

    /// Routes one received datagram. `ecn` is carried through only for the
    /// caller's benefit; this crate doesn't interpret it before handing
    /// the datagram to a connection.
    pub fn route(&self, datagram: &[u8], _ecn: ExplicitCongestionNotification) -> RouteResult {
        match packet::peek(datagram, self.local_connection_id_len) {
            Ok(peek) => match ConnectionId::try_from_bytes(peek.destination_connection_id()) {
                Ok(id) => self.lookup.get(&id).map_or(RouteResult::Unknown, RouteResult::Found),
                Err(_) => RouteResult::Malformed,
            },
            Err(_) => RouteResult::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> LookupHasher {
        let mut generator = rquic_core::random::testing::Fixed::default();
        LookupHasher::new(&mut generator)
    }

    #[test]
    fn routes_a_short_header_datagram_to_its_registered_connection() {
        let mut lookup = Lookup::new(hasher());
        let id = ConnectionId::try_from_bytes(&[1, 2, 3, 4]).unwrap();
        let handle = ConnectionHandle { worker: WorkerId::new(0), slot: 5 };
        lookup.insert(id, handle);

        let binding = Binding::new(lookup, 4);
        let mut datagram = vec![0x40u8];
        datagram.extend_from_slice(&[1, 2, 3, 4]);
        datagram.extend_from_slice(&[0xaa; 8]);

        assert_eq!(binding.route(&datagram, ExplicitCongestionNotification::NotEct), RouteResult::Found(handle));
    }

    #[test]
    fn unregistered_connection_ids_report_unknown() {
        let lookup = Lookup::new(hasher());
        let binding = Binding::new(lookup, 4);
        let mut datagram = vec![0x40u8];
        datagram.extend_from_slice(&[9, 9, 9, 9]);
        assert_eq!(binding.route(&datagram, ExplicitCongestionNotification::NotEct), RouteResult::Unknown);
    }
}
