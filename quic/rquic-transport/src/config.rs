//! Endpoint-wide configuration: the connection-level limits every new
//! connection is seeded with, plus the knobs that live above a single
//! connection (path MTU ceiling, congestion controller choice, migration
//! policy). Builder-style, mirroring `rquic_core::connection::limits::Builder`.

use core::time::Duration;
use rquic_core::{connection::Limits as ConnectionLimits, path::MaxMtu, recovery::congestion_controller::CongestionController};

/// Which congestion controller new connections are constructed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CongestionControllerKind {
    #[default]
    Cubic,
    BbrLite,
}

impl CongestionControllerKind {
    pub fn build(self, max_datagram_size: u16) -> Box<dyn CongestionController> {
        match self {
            Self::Cubic => Box::new(rquic_core::recovery::Cubic::new(max_datagram_size)),
            Self::BbrLite => Box::new(rquic_core::recovery::BbrLite::new(max_datagram_size)),
        }
    }
}

/// Whether new paths must be explicitly validated before they carry
/// unlimited traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MigrationPolicy {
    #[default]
    Default,
    Disabled,
}

#[derive(Clone, Debug)]
pub struct Limits {
    pub connection: ConnectionLimits,
    pub max_mtu: MaxMtu,
    pub congestion_controller: CongestionControllerKind,
    pub migration: MigrationPolicy,
    pub initial_rtt: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            connection: ConnectionLimits::default(),
            max_mtu: MaxMtu::default(),
            congestion_controller: CongestionControllerKind::default(),
            migration: MigrationPolicy::default(),
            initial_rtt: Duration::from_millis(333),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Builder {
    limits: Limits,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection_limits(mut self, connection: rquic_core::connection::Limits) -> Self {
        self.limits.connection = connection;
        self
    }

    pub fn with_max_mtu(mut self, max_mtu: MaxMtu) -> Self {
        self.limits.max_mtu = max_mtu;
        self
    }

    pub fn with_congestion_controller(mut self, kind: CongestionControllerKind) -> Self {
        self.limits.congestion_controller = kind;
        self
    }

    pub fn with_migration_policy(mut self, policy: MigrationPolicy) -> Self {
        self.limits.migration = policy;
        self
    }

    pub fn with_initial_rtt(mut self, initial_rtt: Duration) -> Self {
        self.limits.initial_rtt = initial_rtt;
        self
    }

    pub fn build(self) -> Limits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_touched_fields() {
        let limits = Builder::new().with_congestion_controller(CongestionControllerKind::BbrLite).build();
        assert_eq!(limits.congestion_controller, CongestionControllerKind::BbrLite);
        assert_eq!(limits.max_mtu, MaxMtu::default());
    }
}
