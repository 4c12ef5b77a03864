// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The pluggable congestion control interface `recovery::Manager` drives.
//! Simplified from a generic event-publishing trait down to the plain
//! capability signature this crate's scope actually needs: window size,
//! in-flight accounting, and the three feedback events (sent, acked, lost).

use crate::time::Timestamp;
use core::{fmt::Debug, time::Duration};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketInfo {
    pub sent_bytes: usize,
    pub is_congestion_controlled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RttSample {
    pub is_newest_acked: bool,
}

pub trait CongestionController: Debug {
    /// The current congestion window, in bytes.
    fn congestion_window(&self) -> u32;

    /// Whether `bytes_in_flight` is currently at or above the window.
    fn is_congestion_limited(&self) -> bool;

    /// Set after entering recovery; the next sent packet should go out
    /// immediately rather than wait on the pacer, per RFC 9002 section 7.3.2.
    fn requires_fast_retransmission(&self) -> bool;

    fn on_packet_sent(&mut self, time_sent: Timestamp, info: PacketInfo, bytes_in_flight: u32);

    fn on_rtt_update(&mut self, time_sent: Timestamp, rtt: &crate::recovery::RttEstimator);

    /// `newest_acked_time_sent` is the send time of the most recent newly
    /// acknowledged packet; used to tell whether the sender was in
    /// recovery when it sent what's now being acknowledged.
    fn on_packet_ack(
        &mut self,
        newest_acked_time_sent: Timestamp,
        sent_bytes: usize,
        rtt: &crate::recovery::RttEstimator,
        ack_receive_time: Timestamp,
    );

    fn on_packets_lost(
        &mut self,
        lost_bytes: u32,
        persistent_congestion: bool,
        new_loss_burst: bool,
        timestamp: Timestamp,
    );

    fn on_explicit_congestion(&mut self, ce_count: u64, event_time: Timestamp);
}

/// RFC 9002 section 7.2: the minimum congestion window, expressed in
/// multiples of the max datagram size.
pub const MINIMUM_WINDOW_PACKETS: u32 = 2;

#[inline]
pub fn minimum_window(max_datagram_size: u16) -> u32 {
    MINIMUM_WINDOW_PACKETS * max_datagram_size as u32
}

#[inline]
pub fn initial_window(max_datagram_size: u16) -> u32 {
    // RFC 9002 section 7.2: min(10 * max_datagram_size, max(2 * max_datagram_size, 14720)).
    (10 * max_datagram_size as u32).min((2 * max_datagram_size as u32).max(14_720))
}

pub const DEFAULT_LOSS_REDUCTION_FACTOR: f32 = 0.5;

#[inline]
pub fn persistent_congestion_duration_exceeded(
    first_sent: Timestamp,
    last_sent: Timestamp,
    threshold: Duration,
) -> bool {
    last_sent.saturating_duration_since(first_sent) > threshold
}
