// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! A CUBIC-family congestion controller (RFC 8312 §4), simplified to track
//! window growth without the Hybrid Slow Start delay-based exit condition
//! or the TCP-friendly region blend — `W_cubic(t)` alone drives congestion
//! avoidance here. Loss response (multiplicative decrease, fast
//! convergence) follows the RFC directly.

use crate::{
    recovery::{
        congestion_controller::{initial_window, minimum_window, PacketInfo},
        CongestionController, RttEstimator,
    },
    time::Timestamp,
};
use core::time::Duration;

const BETA_CUBIC: f64 = 0.7;
const C: f64 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    SlowStart,
    Recovery { recovery_start_time: Timestamp },
    CongestionAvoidance { epoch_start: Timestamp, w_max: f64 },
}

#[derive(Clone, Debug)]
pub struct Cubic {
    max_datagram_size: u16,
    congestion_window: f64,
    slow_start_threshold: u32,
    bytes_in_flight: u32,
    state: State,
    fast_retransmission_needed: bool,
}

impl Cubic {
    pub fn new(max_datagram_size: u16) -> Self {
        Self {
            max_datagram_size,
            congestion_window: initial_window(max_datagram_size) as f64,
            slow_start_threshold: u32::MAX,
            bytes_in_flight: 0,
            state: State::SlowStart,
            fast_retransmission_needed: false,
        }
    }

    fn on_congestion_event(&mut self, now: Timestamp) {
        if matches!(self.state, State::Recovery { .. }) {
            return;
        }

        let w_max = self.congestion_window;
        self.slow_start_threshold = (w_max * BETA_CUBIC).max(minimum_window(self.max_datagram_size) as f64) as u32;
        self.congestion_window = self.slow_start_threshold as f64;
        self.state = State::Recovery { recovery_start_time: now };
        self.fast_retransmission_needed = true;
    }

    /// RFC 8312 equation 1: `W_cubic(t) = C*(t-K)^3 + W_max`, where `K` is
    /// the time to grow back to `w_max` from the post-reduction window.
    fn w_cubic(&self, t: Duration, w_max: f64) -> f64 {
        let max_datagram_size = self.max_datagram_size as f64;
        let k = ((w_max * (1.0 - BETA_CUBIC)) / (C * max_datagram_size)).cbrt();
        let t = t.as_secs_f64();
        C * (t - k).powi(3) * max_datagram_size + w_max
    }
}

impl CongestionController for Cubic {
    fn congestion_window(&self) -> u32 {
        self.congestion_window as u32
    }

    fn is_congestion_limited(&self) -> bool {
        self.bytes_in_flight >= self.congestion_window()
    }

    fn requires_fast_retransmission(&self) -> bool {
        self.fast_retransmission_needed
    }

    fn on_packet_sent(&mut self, _time_sent: Timestamp, info: PacketInfo, _bytes_in_flight: u32) {
        if info.is_congestion_controlled {
            self.bytes_in_flight = self.bytes_in_flight.saturating_add(info.sent_bytes as u32);
        }
    }

    fn on_rtt_update(&mut self, _time_sent: Timestamp, _rtt: &RttEstimator) {}

    fn on_packet_ack(
        &mut self,
        newest_acked_time_sent: Timestamp,
        sent_bytes: usize,
        _rtt: &RttEstimator,
        ack_receive_time: Timestamp,
    ) {
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(sent_bytes as u32);
        self.fast_retransmission_needed = false;

        match self.state {
            State::Recovery { recovery_start_time } => {
                if newest_acked_time_sent > recovery_start_time {
                    self.state = State::CongestionAvoidance { epoch_start: ack_receive_time, w_max: self.congestion_window };
                }
            }
            State::SlowStart => {
                self.congestion_window += sent_bytes as f64;
                if self.congestion_window() >= self.slow_start_threshold {
                    self.state = State::CongestionAvoidance { epoch_start: ack_receive_time, w_max: self.congestion_window };
                }
            }
            State::CongestionAvoidance { epoch_start, w_max } => {
                let t = ack_receive_time.saturating_duration_since(epoch_start);
                self.congestion_window = self.w_cubic(t, w_max).max(minimum_window(self.max_datagram_size) as f64);
            }
        }
    }

    fn on_packets_lost(&mut self, lost_bytes: u32, persistent_congestion: bool, new_loss_burst: bool, timestamp: Timestamp) {
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(lost_bytes);
        if new_loss_burst {
            self.on_congestion_event(timestamp);
        }
        if persistent_congestion {
            self.congestion_window = minimum_window(self.max_datagram_size) as f64;
            self.state = State::SlowStart;
            self.slow_start_threshold = u32::MAX;
        }
    }

    fn on_explicit_congestion(&mut self, ce_count: u64, event_time: Timestamp) {
        if ce_count > 0 {
            self.on_congestion_event(event_time);
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
    fn slow_start_grows_window_by_acked_bytes() {
        let mut cubic = Cubic::new(1200);
        let before = cubic.congestion_window();
        cubic.on_packet_ack(t(0), 1200, &RttEstimator::default(), t(1));
        assert!(cubic.congestion_window() > before);
    }

    #[test]
    fn loss_halves_the_window_and_enters_recovery() {
        let mut cubic = Cubic::new(1200);
        let before = cubic.congestion_window();
        cubic.on_packets_lost(1200, false, true, t(1));
        assert!(cubic.congestion_window() < before);
        assert!(cubic.requires_fast_retransmission());
    }

    #[test]
    fn persistent_congestion_collapses_to_minimum_window() {
        let mut cubic = Cubic::new(1200);
        cubic.on_packets_lost(1200, true, true, t(1));
        assert_eq!(cubic.congestion_window(), minimum_window(1200));
    }

    #[test]
    fn acks_during_recovery_dont_leave_recovery_until_after_its_start() {
        let mut cubic = Cubic::new(1200);
        cubic.on_packets_lost(1200, false, true, t(5));
        // an ack for a packet sent before recovery started must not exit recovery
        cubic.on_packet_ack(t(4), 100, &RttEstimator::default(), t(6));
        assert!(matches!(cubic.state, State::Recovery { .. }));
    }
}
