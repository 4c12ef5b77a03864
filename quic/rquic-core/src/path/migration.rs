// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Policy for whether a server accepts a client's apparent change of
//! network path (RFC 9000 section 9, section 21.5.6 off-path attack notes).

#[cfg(feature = "std")]
use crate::inet::SocketAddress;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Outcome {
    /// Allow the migration attempt; path validation still proceeds as
    /// described in section 8.2.
    Allow,
    /// Reject the migration; the triggering packet is dropped and no state
    /// is reserved for the new path.
    Deny,
}

#[cfg(feature = "std")]
pub trait Validator {
    fn on_migration_attempt(&mut self, active: SocketAddress, candidate: SocketAddress) -> Outcome;
}

#[cfg(feature = "std")]
pub mod default {
    use super::*;

    /// Allows migration only within the same port-range class and the same
    /// IP address privacy class (loopback/private/global), to make it
    /// harder for an off-path attacker to bounce traffic toward arbitrary
    /// third parties by spoofing a source address.
    #[derive(Debug, Default)]
    pub struct Validator;

    impl super::Validator for Validator {
        fn on_migration_attempt(&mut self, active: SocketAddress, candidate: SocketAddress) -> Outcome {
            if PortRangeType::new(active.port()) != PortRangeType::new(candidate.port()) {
                return Outcome::Deny;
            }

            if AddressClass::new(active.ip()) == AddressClass::new(candidate.ip()) {
                Outcome::Allow
            } else {
                Outcome::Deny
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum PortRangeType {
        System,
        User,
        Dynamic,
    }

    impl PortRangeType {
        const fn new(value: u16) -> Self {
            match value {
                0..=1023 => Self::System,
                1024..=49151 => Self::User,
                _ => Self::Dynamic,
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum AddressClass {
        Loopback,
        Private,
        Global,
    }

    impl AddressClass {
        fn new(ip: std::net::IpAddr) -> Self {
            if ip.is_loopback() {
                Self::Loopback
            } else {
                match ip {
                    std::net::IpAddr::V4(v4) => {
                        if v4.is_private() || v4.is_link_local() {
                            Self::Private
                        } else {
                            Self::Global
                        }
                    }
                    std::net::IpAddr::V6(_) => Self::Global,
                }
            }
        }
    }
}

#[cfg(feature = "std")]
pub mod disabled {
    use super::*;

    #[derive(Debug, Default)]
    pub struct Validator;

    impl super::Validator for Validator {
        fn on_migration_attempt(&mut self, _active: SocketAddress, _candidate: SocketAddress) -> Outcome {
            Outcome::Deny
        }
    }
}
