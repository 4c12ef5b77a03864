// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! A deliberately reduced BBR (draft-cardwell-iccrg-bbr-congestion-control):
//! bandwidth-delivery-rate estimation driving a bandwidth-delay-product
//! congestion window, cycling through `Startup`/`Drain`/`ProbeBw` with no
//! `ProbeRtt` phase or pacer — this crate's scope is the window the
//! connection's send budget is clamped to, not pacing the datagrams that
//! fill it.

use super::congestion_controller::{self, CongestionController, PacketInfo};
use crate::{recovery::RttEstimator, time::Timestamp};
use core::time::Duration;

/// RFC-adjacent default: BBR raises `pacing_gain` by this factor in
/// `Startup` until three rounds pass without a bandwidth increase.
const STARTUP_GAIN: u32 = 2;

/// `Drain`'s gain is `Startup`'s inverse, to work off the queue `Startup`
/// built before settling into steady-state probing.
const DRAIN_GAIN_NUM: u32 = 1;
const DRAIN_GAIN_DEN: u32 = 2;

/// How many consecutive rounds of a steady delivery rate end `Startup`.
const STARTUP_ROUNDS_WITHOUT_GROWTH: u8 = 3;

/// `ProbeBw`'s gain cycles mildly above and below 1.0 to occasionally
/// probe for more available bandwidth without chasing it aggressively.
const PROBE_BW_UP_NUM: u32 = 5;
const PROBE_BW_UP_DEN: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Startup,
    Drain,
    ProbeBw { probing: bool },
}

#[derive(Clone, Debug)]
pub struct BbrLite {
    state: State,
    max_datagram_size: u16,
    /// Windowed-max delivery rate estimate, in bytes/second.
    bandwidth: u64,
    rounds_without_growth: u8,
    bytes_in_flight: u32,
    congestion_window: u32,
    full_pipe_detected: bool,
}

impl BbrLite {
    pub fn new(max_datagram_size: u16) -> Self {
        Self {
            state: State::Startup,
            max_datagram_size,
            bandwidth: 0,
            rounds_without_growth: 0,
            bytes_in_flight: 0,
            congestion_window: congestion_controller::initial_window(max_datagram_size),
            full_pipe_detected: false,
        }
    }

    fn gain(&self) -> (u32, u32) {
        match self.state {
            State::Startup => (STARTUP_GAIN, 1),
            State::Drain => (DRAIN_GAIN_NUM, DRAIN_GAIN_DEN),
            State::ProbeBw { probing: true } => (PROBE_BW_UP_NUM, PROBE_BW_UP_DEN),
            State::ProbeBw { probing: false } => (1, 1),
        }
    }

    fn bandwidth_delay_product(&self, rtt: Duration) -> u64 {
        self.bandwidth.saturating_mul(rtt.as_micros() as u64) / 1_000_000
    }

    fn update_window(&mut self, rtt: &RttEstimator) {
        let (num, den) = self.gain();
        let bdp = self.bandwidth_delay_product(rtt.smoothed_rtt());
        let target = (bdp.saturating_mul(num as u64) / den as u64) as u32;
        self.congestion_window = target.max(congestion_controller::minimum_window(self.max_datagram_size));
    }
}

impl CongestionController for BbrLite {
    fn congestion_window(&self) -> u32 {
        self.congestion_window
    }

    fn is_congestion_limited(&self) -> bool {
        self.bytes_in_flight >= self.congestion_window
    }

    fn requires_fast_retransmission(&self) -> bool {
        false
    }

    fn on_packet_sent(&mut self, _time_sent: Timestamp, info: PacketInfo, bytes_in_flight: u32) {
        if info.is_congestion_controlled {
            self.bytes_in_flight = bytes_in_flight;
        }
    }

    fn on_rtt_update(&mut self, _time_sent: Timestamp, rtt: &RttEstimator) {
        self.update_window(rtt);
    }

    fn on_packet_ack(&mut self, _newest_acked_time_sent: Timestamp, sent_bytes: usize, rtt: &RttEstimator, _ack_receive_time: Timestamp) {
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(sent_bytes as u32);

        let rtt_micros = rtt.smoothed_rtt().as_micros().max(1) as u64;
        let delivery_rate = (sent_bytes as u64).saturating_mul(1_000_000) / rtt_micros;

        if delivery_rate > self.bandwidth {
            self.bandwidth = delivery_rate;
            self.rounds_without_growth = 0;
        } else {
            self.rounds_without_growth = self.rounds_without_growth.saturating_add(1);
        }

        match self.state {
            State::Startup if self.rounds_without_growth >= STARTUP_ROUNDS_WITHOUT_GROWTH => {
                self.full_pipe_detected = true;
                self.state = State::Drain;
            }
            State::Drain if self.bytes_in_flight <= self.bandwidth_delay_product(rtt.smoothed_rtt()) as u32 => {
                self.state = State::ProbeBw { probing: false };
            }
            State::ProbeBw { probing } => {
                self.state = State::ProbeBw { probing: !probing };
            }
            _ => {}
        }

        self.update_window(rtt);
    }

    fn on_packets_lost(&mut self, lost_bytes: u32, _persistent_congestion: bool, _new_loss_burst: bool, _timestamp: Timestamp) {
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(lost_bytes);
        // BBR treats loss as a bandwidth-probing signal rather than cutting
        // the window directly; a modest floor keeps a lossy path from
        // growing the window unchecked in this reduced model.
        self.congestion_window = self.congestion_window.max(congestion_controller::minimum_window(self.max_datagram_size));
    }

    fn on_explicit_congestion(&mut self, _ce_count: u64, _event_time: Timestamp) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    fn t(millis: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_millis(millis))
    }

    fn rtt() -> RttEstimator {
        let mut rtt = RttEstimator::new(Duration::from_millis(100));
        rtt.update_rtt(Duration::ZERO, Duration::from_millis(100), t(0), true, crate::packet::PacketNumberSpace::ApplicationData);
        rtt
    }

    #[test]
    fn startup_grows_the_window_as_bandwidth_samples_arrive() {
        let mut bbr = BbrLite::new(1200);
        let initial = bbr.congestion_window();
        let rtt = rtt();
        bbr.on_packet_ack(t(0), 120_000, &rtt, t(100));
        assert!(bbr.congestion_window() >= initial);
    }

    #[test]
    fn repeated_flat_bandwidth_samples_exit_startup() {
        let mut bbr = BbrLite::new(1200);
        let rtt = rtt();
        for _ in 0..10 {
            bbr.on_packet_ack(t(0), 1200, &rtt, t(100));
        }
        assert!(!matches!(bbr.state, State::Startup));
    }
}
