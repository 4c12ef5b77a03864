//! A single network path between the two endpoints: the address pair,
//! anti-amplification accounting, PATH_CHALLENGE bookkeeping, PMTU
//! discovery, and the recovery state that's scoped per path rather than
//! per connection (RFC 9000 section 9 migrates all of this together when
//! the peer's address changes).

use core::time::Duration;
use rquic_core::{
    inet::SocketAddress,
    path::{challenge::Challenge, migration, migration::Validator as _, mtu, AmplificationLimit, MaxMtu},
    random::Generator,
    time::Timestamp,
};

/// How often an unacknowledged PATH_CHALLENGE is retransmitted.
const CHALLENGE_RETRANSMIT_PERIOD: Duration = Duration::from_millis(200);

/// How long a PATH_CHALLENGE is retried before the path is abandoned.
const CHALLENGE_EXPIRATION: Duration = Duration::from_secs(3);

/// One path's full state: address pair, validation, MTU search, and the
/// loss-detection manager recovery tracks per path.
#[derive(Debug)]
pub struct Path {
    local_address: SocketAddress,
    remote_address: SocketAddress,
    amplification: AmplificationLimit,
    challenge: Challenge,
    mtu: mtu::Controller,
    recovery: crate::recovery::Manager,
    validated: bool,
}

impl Path {
    pub fn new(local_address: SocketAddress, remote_address: SocketAddress, max_mtu: MaxMtu, min_ip_header_len: u16, initial_rtt: Duration, congestion_controller: Box<dyn rquic_core::recovery::congestion_controller::CongestionController>) -> Self {
        Self {
            local_address,
            remote_address,
            amplification: AmplificationLimit::default(),
            challenge: Challenge::default(),
            mtu: mtu::Controller::new(max_mtu, min_ip_header_len),
            recovery: crate::recovery::Manager::new(rquic_core::packet::PacketNumberSpace::ApplicationData, initial_rtt, congestion_controller),
            validated: false,
        }
    }

    pub fn local_address(&self) -> SocketAddress {
        self.local_address
    }

    pub fn remote_address(&self) -> SocketAddress {
        self.remote_address
    }

    pub fn amplification_limit(&mut self) -> &mut AmplificationLimit {
        &mut self.amplification
    }

    pub fn mtu(&self) -> &mtu::Controller {
        &self.mtu
    }

    pub fn mtu_mut(&mut self) -> &mut mtu::Controller {
        &mut self.mtu
    }

    pub fn recovery(&self) -> &crate::recovery::Manager {
        &self.recovery
    }

    pub fn recovery_mut(&mut self) -> &mut crate::recovery::Manager {
        &mut self.recovery
    }

    /// A path is validated once its PATH_CHALLENGE has a matching
    /// PATH_RESPONSE, or from the outset if the connection never needed
    /// to challenge it (the path the handshake completed on).
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn mark_validated(&mut self) {
        self.validated = true;
    }

    /// Arms a PATH_CHALLENGE with `generator`-sourced data, returning the
    /// data so the caller can enqueue the frame.
    pub fn challenge(&mut self, generator: &mut dyn Generator, now: Timestamp) -> rquic_core::path::challenge::Data {
        let mut data = [0u8; rquic_core::path::challenge::DATA_LEN];
        generator.public_random_fill(&mut data);
        self.challenge = Challenge::new(now, CHALLENGE_RETRANSMIT_PERIOD, CHALLENGE_EXPIRATION, data);
        data
    }

    pub fn challenge_pending(&self, now: Timestamp) -> bool {
        self.challenge.is_pending(now)
    }

    pub fn challenge_data(&self) -> Option<&rquic_core::path::challenge::Data> {
        self.challenge.data()
    }

    pub fn on_challenge_transmitted(&mut self, now: Timestamp) {
        self.challenge.on_transmit(now);
    }

    /// Applies a received PATH_RESPONSE; validates the path on a match.
    pub fn on_path_response(&mut self, now: Timestamp, response: &[u8]) -> bool {
        if self.challenge.is_valid(now, response) {
            self.validated = true;
            true
        } else {
            false
        }
    }

    pub fn on_timeout(&mut self, now: Timestamp) {
        self.challenge.on_timeout(now);
        self.mtu.on_timeout(now);
    }
}

/// The set of paths a connection knows about. Exactly one is active at a
/// time; the rest persist only long enough to finish validating or to be
/// abandoned (RFC 9000 section 9.3).
#[derive(Debug, Default)]
pub struct Manager {
    paths: Vec<Path>,
    active: usize,
    validator: Box<dyn ValidatorPolicy>,
}

/// Object-safe wrapper so `Manager` can hold either the default or the
/// disabled migration policy without a generic parameter.
pub trait ValidatorPolicy: core::fmt::Debug {
    fn on_migration_attempt(&mut self, active: SocketAddress, candidate: SocketAddress) -> migration::Outcome;
}

impl Default for Box<dyn ValidatorPolicy> {
    fn default() -> Self {
        struct Wrap(migration::default::Validator);
        impl core::fmt::Debug for Wrap {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("default::Validator")
            }
        }
        impl ValidatorPolicy for Wrap {
            fn on_migration_attempt(&mut self, active: SocketAddress, candidate: SocketAddress) -> migration::Outcome {
                self.0.on_migration_attempt(active, candidate)
            }
        }
        Box::new(Wrap(migration::default::Validator))
    }
}

impl Manager {
    pub fn new(initial: Path) -> Self {
        Self { paths: vec![initial], active: 0, validator: Box::<dyn ValidatorPolicy>::default() }
    }

    pub fn active(&self) -> &Path {
        &self.paths[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Path {
        &mut self.paths[self.active]
    }

    pub fn find(&self, remote_address: SocketAddress) -> Option<usize> {
        self.paths.iter().position(|p| p.remote_address() == remote_address)
    }

    /// A datagram arrived from an address that isn't the active path.
    /// Consults the migration policy and, if allowed, either switches to
    /// an already-known path or provisions a new unvalidated one.
    pub fn on_migration_attempt(&mut self, candidate: SocketAddress, make_path: impl FnOnce() -> Path) -> migration::Outcome {
        let outcome = self.validator.on_migration_attempt(self.active().remote_address(), candidate);
        if outcome == migration::Outcome::Allow {
            match self.find(candidate) {
                Some(index) => self.active = index,
                None => {
                    self.paths.push(make_path());
                    self.active = self.paths.len() - 1;
                }
            }
        }
        outcome
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_core::recovery::cubic::Cubic;

    fn addr(port: u16) -> SocketAddress {
        SocketAddress::new(std::net::SocketAddr::from(([127, 0, 0, 1], port)))
    }

    fn path(port: u16) -> Path {
        Path::new(addr(4433), addr(port), MaxMtu::default(), 20, Duration::from_millis(100), Box::new(Cubic::new(rquic_core::path::MINIMUM_MTU)))
    }

    #[test]
    fn path_challenge_round_trip_validates() {
        let mut p = path(1);
        let mut generator = rquic_core::random::testing::Fixed::default();
        let now = Timestamp::from_duration(Duration::from_millis(0));
        let data = p.challenge(&mut generator, now);
        assert!(!p.is_validated());
        assert!(p.on_path_response(now, &data));
        assert!(p.is_validated());
    }

    #[test]
    fn migration_to_a_same_class_address_is_allowed_and_adds_a_path() {
        let mut manager = Manager::new(path(1));
        let outcome = manager.on_migration_attempt(addr(2), || path(2));
        assert_eq!(outcome, migration::Outcome::Allow);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.active().remote_address(), addr(2));
    }
}
