// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! RTT estimation and the PTO/persistent-congestion/loss-time thresholds
//! derived from it (RFC 9002 sections 5-7).

use crate::{packet::number::PacketNumberSpace, time::Timestamp};
use core::{
    cmp::{max, min},
    time::Duration,
};

pub const DEFAULT_INITIAL_RTT: Duration = Duration::from_millis(333);
pub const MIN_RTT: Duration = Duration::from_micros(1);
pub const K_GRANULARITY: Duration = Duration::from_millis(1);
const K_PERSISTENT_CONGESTION_THRESHOLD: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RttEstimator {
    latest_rtt: Duration,
    min_rtt: Duration,
    smoothed_rtt: Duration,
    rttvar: Duration,
    max_ack_delay: Duration,
    first_rtt_sample: Option<Timestamp>,
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_RTT)
    }
}

impl RttEstimator {
    #[inline]
    pub fn new(initial_rtt: Duration) -> Self {
        Self::new_with_max_ack_delay(Duration::ZERO, initial_rtt)
    }

    #[inline]
    fn new_with_max_ack_delay(max_ack_delay: Duration, initial_rtt: Duration) -> Self {
        let initial_rtt = initial_rtt.max(MIN_RTT);
        Self {
            latest_rtt: initial_rtt,
            min_rtt: initial_rtt,
            smoothed_rtt: initial_rtt,
            rttvar: initial_rtt / 2,
            max_ack_delay,
            first_rtt_sample: None,
        }
    }

    #[inline]
    pub fn for_new_path(&self, initial_rtt: Duration) -> Self {
        Self::new_with_max_ack_delay(self.max_ack_delay, initial_rtt)
    }

    #[inline]
    pub fn latest_rtt(&self) -> Duration {
        self.latest_rtt
    }

    #[inline]
    pub fn smoothed_rtt(&self) -> Duration {
        self.smoothed_rtt
    }

    #[inline]
    pub fn min_rtt(&self) -> Duration {
        self.min_rtt
    }

    #[inline]
    pub fn rttvar(&self) -> Duration {
        self.rttvar
    }

    #[inline]
    pub fn first_rtt_sample(&self) -> Option<Timestamp> {
        self.first_rtt_sample
    }

    #[inline]
    pub fn max_ack_delay(&self) -> Duration {
        self.max_ack_delay
    }

    #[inline]
    fn rttvar_4x(&self) -> Duration {
        self.rttvar * 4
    }

    #[inline]
    pub fn on_max_ack_delay(&mut self, max_ack_delay: Duration) {
        self.max_ack_delay = max_ack_delay;
    }

    /// RFC 9002 section 6.2.1: `PTO = smoothed_rtt + max(4*rttvar,
    /// kGranularity) + max_ack_delay`, doubled per consecutive expiry, with
    /// `max_ack_delay` zeroed outside the application data space since the
    /// peer isn't expected to delay those acknowledgments.
    #[inline]
    pub fn pto_period(&self, pto_backoff: u32, space: PacketNumberSpace) -> Duration {
        let mut pto_period = self.smoothed_rtt.as_micros() as u64;
        pto_period += max(self.rttvar_4x().as_micros() as u64, K_GRANULARITY.as_micros() as u64);
        if space.is_application_data() {
            pto_period += self.max_ack_delay.as_micros() as u64;
        }
        pto_period *= pto_backoff as u64;
        Duration::from_micros(pto_period)
    }

    /// Folds a new RTT sample in per RFC 9002 section 5.3, including the
    /// errata fix (eid7539) that compares `rttvar` to the *pre-update*
    /// `smoothed_rtt` when computing the new sample's deviation.
    #[inline]
    pub fn update_rtt(
        &mut self,
        mut ack_delay: Duration,
        rtt_sample: Duration,
        timestamp: Timestamp,
        is_handshake_confirmed: bool,
        space: PacketNumberSpace,
    ) {
        self.latest_rtt = rtt_sample.max(MIN_RTT);

        if self.first_rtt_sample.is_none() {
            self.first_rtt_sample = Some(timestamp);
            self.min_rtt = self.latest_rtt;
            self.smoothed_rtt = self.latest_rtt;
            self.rttvar = self.latest_rtt / 2;
            return;
        }

        self.min_rtt = min(self.min_rtt, self.latest_rtt);

        if space.is_initial() {
            ack_delay = Duration::ZERO;
        }
        if is_handshake_confirmed {
            ack_delay = min(ack_delay, self.max_ack_delay);
        }

        let mut adjusted_rtt = self.latest_rtt;
        if self.min_rtt + ack_delay < self.latest_rtt {
            adjusted_rtt -= ack_delay;
        } else if !is_handshake_confirmed {
            return;
        }

        let rttvar_sample = abs_difference(self.smoothed_rtt, adjusted_rtt);
        self.rttvar = weighted_average(self.rttvar, rttvar_sample, 4);
        self.smoothed_rtt = weighted_average(self.smoothed_rtt, adjusted_rtt, 8);
    }

    /// RFC 9002 section 7.6.1.
    #[inline]
    pub fn persistent_congestion_threshold(&self) -> Duration {
        Duration::from_millis(
            (self.smoothed_rtt.as_millis() as u64
                + max(self.rttvar_4x().as_millis() as u64, K_GRANULARITY.as_millis() as u64)
                + self.max_ack_delay.as_millis() as u64)
                * K_PERSISTENT_CONGESTION_THRESHOLD,
        )
    }

    /// RFC 9002 section 6.1.2: `max(9/8 * max(smoothed_rtt, latest_rtt), kGranularity)`.
    #[inline]
    pub fn loss_time_threshold(&self) -> Duration {
        let mut time_threshold = max(self.smoothed_rtt.as_nanos() as u64, self.latest_rtt.as_nanos() as u64);
        time_threshold += time_threshold / 8;
        Duration::from_nanos(max(time_threshold, K_GRANULARITY.as_nanos() as u64))
    }
}

#[inline]
fn abs_difference(a: Duration, b: Duration) -> Duration {
    if a > b { a - b } else { b - a }
}

#[inline]
fn weighted_average(current: Duration, sample: Duration, sample_weight_divisor: u32) -> Duration {
    let current_weight = sample_weight_divisor - 1;
    (current * current_weight + sample) / sample_weight_divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_seeds_smoothed_and_var() {
        let mut rtt = RttEstimator::new(DEFAULT_INITIAL_RTT);
        let now = Timestamp::from_duration(Duration::from_secs(1));
        rtt.update_rtt(Duration::ZERO, Duration::from_millis(100), now, true, PacketNumberSpace::ApplicationData);
        assert_eq!(rtt.smoothed_rtt(), Duration::from_millis(100));
        assert_eq!(rtt.rttvar(), Duration::from_millis(50));
        assert_eq!(rtt.min_rtt(), Duration::from_millis(100));
    }

    #[test]
    fn ack_delay_is_ignored_for_initial_space() {
        let mut rtt = RttEstimator::new(DEFAULT_INITIAL_RTT);
        let t0 = Timestamp::from_duration(Duration::from_secs(1));
        let t1 = Timestamp::from_duration(Duration::from_secs(2));
        rtt.update_rtt(Duration::ZERO, Duration::from_millis(100), t0, false, PacketNumberSpace::Initial);
        rtt.update_rtt(Duration::from_millis(500), Duration::from_millis(120), t1, false, PacketNumberSpace::Initial);
        // a 500ms ack_delay on a 120ms sample would normally make adjusted_rtt
        // negative; Initial space must zero it out instead of rejecting the sample.
        assert!(rtt.smoothed_rtt() > Duration::from_millis(100));
    }

    #[test]
    fn pto_period_skips_max_ack_delay_outside_application_data() {
        let mut rtt = RttEstimator::new(DEFAULT_INITIAL_RTT);
        rtt.on_max_ack_delay(Duration::from_millis(25));
        let handshake_pto = rtt.pto_period(1, PacketNumberSpace::Handshake);
        let app_pto = rtt.pto_period(1, PacketNumberSpace::ApplicationData);
        assert_eq!(app_pto - handshake_pto, Duration::from_millis(25));
    }

    #[test]
    fn pto_backoff_scales_linearly() {
        let rtt = RttEstimator::new(DEFAULT_INITIAL_RTT);
        let base = rtt.pto_period(1, PacketNumberSpace::Initial);
        let doubled = rtt.pto_period(2, PacketNumberSpace::Initial);
        assert_eq!(doubled, base * 2);
    }
}
