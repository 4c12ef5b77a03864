// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Datagram Packetization Layer PMTU Discovery (RFC 8899), scoped to what
//! RFC 9000 section 14.3 asks of QUIC: a binary search for the largest
//! datagram size the path carries, starting from the 1200-byte floor.

use crate::{path::MaxMtu, time::Timestamp};
use core::time::Duration;

const BASE_PLPMTU: u16 = crate::path::MINIMUM_MTU;

/// RFC 8899 section 5.1.2: the limit on consecutive unacknowledged probes
/// of any one size before giving up on it.
const MAX_PROBES: u8 = 3;

/// Ethernet's MTU is a common step on the way up from the 1200-byte floor,
/// so the search tries it before falling back to bisection.
const ETHERNET_MTU: u16 = 1500;

/// Once the remaining search window is this small, searching is considered
/// complete rather than chasing single-byte improvements.
const PROBE_THRESHOLD: u16 = 20;

/// Consecutive losses of MTU-sized packets, following an acknowledged
/// MTU-sized packet, that indicate the path can no longer carry the
/// confirmed size and should fall back to the base PLPMTU.
const BLACK_HOLE_THRESHOLD: u8 = 3;

const BLACK_HOLE_COOL_OFF: Duration = Duration::from_secs(60);

/// RFC 8899 section 5.1.1: how long a confirmed PLPMTU is trusted before
/// the search resumes in case the path has improved.
const PMTU_RAISE_TIMER: Duration = Duration::from_secs(600);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Disabled,
    SearchRequested,
    Searching { probed_size: u16 },
    SearchComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The controller wants a probe packet padded to `size` sent.
    Probe { size: u16 },
    /// No probe is needed right now.
    None,
}

#[derive(Clone, Debug)]
pub struct Controller {
    state: State,
    /// The largest size confirmed by an acknowledged probe.
    confirmed: u16,
    max_udp_payload: u16,
    probe_count: u8,
    black_hole_counter: u8,
    raise_timer: Option<Timestamp>,
    black_hole_cooloff_until: Option<Timestamp>,
}

impl Controller {
    pub fn new(max_mtu: MaxMtu, min_ip_header_len: u16) -> Self {
        let max_udp_payload = (u16::from(max_mtu).saturating_sub(crate::path::UDP_HEADER_LEN + min_ip_header_len)).max(BASE_PLPMTU);
        Self {
            state: State::SearchRequested,
            confirmed: BASE_PLPMTU,
            max_udp_payload,
            probe_count: 0,
            black_hole_counter: 0,
            raise_timer: None,
            black_hole_cooloff_until: None,
        }
    }

    /// The current Packetization Layer PMTU: the largest datagram size
    /// known to cross the path.
    pub fn plpmtu(&self) -> u16 {
        self.confirmed
    }

    pub fn is_search_complete(&self) -> bool {
        matches!(self.state, State::SearchComplete)
    }

    fn next_probe_size(&self) -> u16 {
        if self.confirmed < ETHERNET_MTU && self.max_udp_payload >= ETHERNET_MTU {
            ETHERNET_MTU
        } else {
            self.confirmed + (self.max_udp_payload - self.confirmed) / 2
        }
    }

    /// Called when the connection is ready to transmit; returns whether a
    /// padded probe of a given size should be sent this round.
    pub fn on_transmit(&mut self, now: Timestamp) -> Event {
        if let Some(until) = self.black_hole_cooloff_until {
            if now < until {
                return Event::None;
            }
            self.black_hole_cooloff_until = None;
            self.state = State::SearchRequested;
        }

        match self.state {
            State::Disabled | State::SearchComplete => Event::None,
            State::SearchRequested => {
                let size = self.next_probe_size();
                self.state = State::Searching { probed_size: size };
                Event::Probe { size }
            }
            State::Searching { probed_size } => Event::Probe { size: probed_size },
        }
    }

    /// A probe of `acked_size` was acknowledged: raise the confirmed PLPMTU
    /// and either continue searching or declare completion.
    pub fn on_probe_acknowledged(&mut self, acked_size: u16, now: Timestamp) {
        if let State::Searching { probed_size } = self.state {
            if probed_size != acked_size {
                return;
            }
            self.confirmed = acked_size;
            self.probe_count = 0;
            self.black_hole_counter = 0;
            self.raise_timer = Some(now + PMTU_RAISE_TIMER);

            if self.max_udp_payload.saturating_sub(self.confirmed) <= PROBE_THRESHOLD {
                self.state = State::SearchComplete;
            } else {
                self.state = State::SearchRequested;
            }
        }
    }

    /// A probe went unacknowledged past loss detection. After `MAX_PROBES`
    /// consecutive failures at one size, halve the remaining window.
    pub fn on_probe_lost(&mut self) {
        if let State::Searching { probed_size } = self.state {
            self.probe_count += 1;
            if self.probe_count < MAX_PROBES {
                return;
            }
            self.probe_count = 0;
            if probed_size.saturating_sub(self.confirmed) <= PROBE_THRESHOLD {
                self.state = State::SearchComplete;
            } else {
                self.max_udp_payload = probed_size.saturating_sub(1).max(self.confirmed);
                self.state = State::SearchRequested;
            }
        }
    }

    /// A burst of non-probe, MTU-sized packets sent after the last
    /// confirmed MTU-sized ack was lost: a possible black hole. Falls back
    /// to the base PLPMTU and stays there for a cool-off period.
    pub fn on_black_hole_suspected(&mut self, now: Timestamp) {
        self.black_hole_counter = self.black_hole_counter.saturating_add(1);
        if self.black_hole_counter < BLACK_HOLE_THRESHOLD {
            return;
        }
        self.black_hole_counter = 0;
        self.confirmed = BASE_PLPMTU;
        self.max_udp_payload = self.max_udp_payload.max(BASE_PLPMTU);
        self.state = State::Disabled;
        self.black_hole_cooloff_until = Some(now + BLACK_HOLE_COOL_OFF);
    }

    /// Whether the raise timer (if any) has fired, meaning search should
    /// restart in case the path can now carry more.
    pub fn on_timeout(&mut self, now: Timestamp) {
        if let Some(deadline) = self.raise_timer {
            if now >= deadline && matches!(self.state, State::SearchComplete) {
                self.raise_timer = None;
                self.state = State::SearchRequested;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_secs(secs))
    }

    #[test]
    fn search_climbs_to_ethernet_mtu_then_completes() {
        let mut controller = Controller::new(MaxMtu::new(ETHERNET_MTU), 20);
        assert_eq!(controller.plpmtu(), BASE_PLPMTU);

        let Event::Probe { size } = controller.on_transmit(t(0)) else { panic!() };
        assert_eq!(size, ETHERNET_MTU);
        controller.on_probe_acknowledged(size, t(0));
        assert_eq!(controller.plpmtu(), ETHERNET_MTU);
        assert!(controller.is_search_complete());
    }

    #[test]
    fn repeated_probe_loss_shrinks_the_search_window() {
        let mut controller = Controller::new(MaxMtu::new(9000), 20);
        let Event::Probe { size: first_probe } = controller.on_transmit(t(0)) else { panic!() };
        assert_eq!(first_probe, ETHERNET_MTU);

        for _ in 0..MAX_PROBES {
            controller.on_probe_lost();
        }

        let Event::Probe { size: second_probe } = controller.on_transmit(t(0)) else { panic!() };
        assert!(second_probe < first_probe);
    }

    #[test]
    fn black_hole_detection_falls_back_to_base_and_cools_off() {
        let mut controller = Controller::new(MaxMtu::new(ETHERNET_MTU), 20);
        controller.confirmed = ETHERNET_MTU;
        controller.state = State::SearchComplete;

        for _ in 0..BLACK_HOLE_THRESHOLD {
            controller.on_black_hole_suspected(t(0));
        }

        assert_eq!(controller.plpmtu(), BASE_PLPMTU);
        assert!(matches!(controller.on_transmit(t(0)), Event::None));
        assert!(matches!(controller.on_transmit(t(61)), Event::Probe { .. }));
    }
}
