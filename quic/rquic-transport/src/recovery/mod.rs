//! Wraps `rquic_core::recovery`'s estimator, sent-packet ledger, and
//! pluggable congestion controller into the loss-detection algorithm
//! itself (RFC 9002 section 6): per-space packet and time threshold
//! sweeps, PTO arming, and persistent-congestion detection.

use core::time::Duration;
use rquic_core::{
    packet::{PacketNumber, PacketNumberSpace},
    path::MINIMUM_MTU,
    recovery::{
        congestion_controller::{self, CongestionController, PacketInfo},
        pto::{Pto, ProbePackets},
        received::{ReceivedPackets, Rejected},
        sent_packets::{SentPacketInfo, SentPackets, SentStreamChunk},
        RttEstimator,
    },
    time::Timestamp,
    varint::VarInt,
};

use crate::send::PendingAck;

/// RFC 9002 section 6.1.1: packets more than this many behind the largest
/// acknowledged are declared lost outright.
const PACKET_THRESHOLD: u64 = 3;

/// The result of applying a received ACK frame: which sent packets it
/// newly covered, split by whether the sweep that follows judged them
/// acknowledged or lost. Both carry the stream chunks the packet sent, so
/// the connection can map either outcome back to stream send state.
#[derive(Debug, Default)]
pub struct AckOutcome {
    pub acked: Vec<SentPacketInfo>,
    pub lost: Vec<SentPacketInfo>,
}

/// Loss detection runs independently per packet number space (RFC 9002
/// section 6), though all three share one `RttEstimator` sample stream.
pub struct Manager {
    space: PacketNumberSpace,
    rtt: RttEstimator,
    congestion_controller: Box<dyn CongestionController>,
    sent_packets: SentPackets,
    pto: Pto,
    bytes_in_flight: u32,
    loss_time: Option<Timestamp>,
    /// The last packet number handed out by [`Self::next_packet_number`];
    /// `None` until this space has sent its first packet.
    largest_sent: Option<PacketNumber>,
    received: ReceivedPackets,
    largest_received_time: Option<Timestamp>,
    ack_pending: bool,
}

impl core::fmt::Debug for Manager {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Manager")
            .field("bytes_in_flight", &self.bytes_in_flight)
            .field("in_flight_packets", &self.sent_packets.len())
            .field("loss_time", &self.loss_time)
            .field("largest_sent", &self.largest_sent)
            .finish()
    }
}

impl Manager {
    pub fn new(space: PacketNumberSpace, initial_rtt: Duration, congestion_controller: Box<dyn CongestionController>) -> Self {
        Self {
            space,
            rtt: RttEstimator::new(initial_rtt),
            congestion_controller,
            sent_packets: SentPackets::new(),
            pto: Pto::new(),
            bytes_in_flight: 0,
            loss_time: None,
            largest_sent: None,
            received: ReceivedPackets::new(),
            largest_received_time: None,
            ack_pending: false,
        }
    }

    /// The next packet number this space should send, advancing its
    /// internal counter. Each space numbers its packets independently
    /// starting at 0 (RFC 9000 section 12.3).
    pub fn next_packet_number(&mut self) -> PacketNumber {
        let next = match self.largest_sent {
            Some(pn) => pn.next().expect("packet number space exhausted"),
            None => self.space.new_packet_number(VarInt::ZERO),
        };
        self.largest_sent = Some(next);
        next
    }

    /// Applies a received packet to this space's duplicate/too-old
    /// rejection and range tracking, arming an ACK if the packet was
    /// ack-eliciting (RFC 9000 section 13.2.1).
    pub fn on_packet_received(&mut self, packet_number: PacketNumber, ack_eliciting: bool, now: Timestamp) -> Result<(), Rejected> {
        self.received.on_packet_received(packet_number)?;
        self.largest_received_time = Some(now);
        if ack_eliciting {
            self.ack_pending = true;
        }
        Ok(())
    }

    /// Builds the ACK frame content owed to the peer, if any is pending,
    /// clearing the pending flag. `now` feeds the ack-delay field.
    pub fn take_pending_ack(&mut self, now: Timestamp) -> Option<PendingAck> {
        if !self.ack_pending {
            return None;
        }
        let ack_ranges: Vec<(VarInt, VarInt)> = self
            .received
            .ranges()
            .into_iter()
            .filter_map(|(smallest, largest)| Some((VarInt::new(smallest).ok()?, VarInt::new(largest).ok()?)))
            .collect();
        if ack_ranges.is_empty() {
            return None;
        }
        self.ack_pending = false;
        let delay = self.largest_received_time.map_or(Duration::ZERO, |sent_at| now.saturating_duration_since(sent_at));
        let ack_delay = VarInt::new(delay.as_micros().min(VarInt::MAX.as_u64() as u128) as u64).unwrap_or(VarInt::ZERO);
        Some(PendingAck { ack_delay, ack_ranges })
    }

    pub fn rtt(&self) -> &RttEstimator {
        &self.rtt
    }

    pub fn congestion_window(&self) -> u32 {
        self.congestion_controller.congestion_window()
    }

    pub fn bytes_in_flight(&self) -> u32 {
        self.bytes_in_flight
    }

    pub fn is_congestion_limited(&self) -> bool {
        self.congestion_controller.is_congestion_limited()
    }

    pub fn on_packet_sent(&mut self, packet_number: rquic_core::packet::PacketNumber, sent_bytes: usize, is_congestion_controlled: bool, ack_elicited: bool, stream_chunks: Vec<SentStreamChunk>, now: Timestamp) {
        if is_congestion_controlled {
            self.bytes_in_flight = self.bytes_in_flight.saturating_add(sent_bytes as u32);
            self.congestion_controller.on_packet_sent(now, PacketInfo { sent_bytes, is_congestion_controlled }, self.bytes_in_flight);
        }
        self.sent_packets.insert(packet_number, SentPacketInfo { time_sent: now, sent_bytes, is_congestion_controlled, ack_elicited, stream_chunks });
    }

    /// Applies newly acknowledged packet numbers, updates the RTT estimate
    /// from the largest one, runs the loss-detection sweep, and returns both
    /// the packets the ack newly covered and any it pushed past the loss
    /// threshold.
    pub fn on_ack_received(&mut self, newly_acked: &[rquic_core::packet::PacketNumber], largest_acked_sent_time: Option<Timestamp>, ack_delay: Duration, now: Timestamp) -> AckOutcome {
        let mut newest_acked_time_sent = None;
        let mut acked = Vec::new();
        for &pn in newly_acked {
            if let Some(info) = self.sent_packets.remove(pn) {
                if info.is_congestion_controlled {
                    self.bytes_in_flight = self.bytes_in_flight.saturating_sub(info.sent_bytes as u32);
                }
                if info.ack_elicited {
                    self.pto.on_ack_eliciting_packet_acknowledged();
                }
                newest_acked_time_sent = Some(newest_acked_time_sent.map_or(info.time_sent, |t: Timestamp| t.max(info.time_sent)));
                acked.push(info);
            }
        }

        if let Some(sent_time) = largest_acked_sent_time {
            self.rtt.update_rtt(ack_delay, now.saturating_duration_since(sent_time), now, true, self.space);
            self.congestion_controller.on_rtt_update(sent_time, &self.rtt);
        }

        if let Some(newest_acked_time_sent) = newest_acked_time_sent {
            self.congestion_controller.on_packet_ack(newest_acked_time_sent, 0, &self.rtt, now);
        }

        let lost = self.detect_and_remove_lost_packets(now);
        AckOutcome { acked, lost }
    }

    fn detect_and_remove_lost_packets(&mut self, now: Timestamp) -> Vec<SentPacketInfo> {
        let Some(largest_acked) = self.sent_packets.iter().map(|(pn, _)| pn).max() else {
            self.loss_time = None;
            return Vec::new();
        };

        let loss_delay = self.rtt.loss_time_threshold();
        let lost_send_time_threshold = now.checked_sub(loss_delay);
        let packet_number_threshold = largest_acked.saturating_sub(PACKET_THRESHOLD);

        let candidates: Vec<(u64, Timestamp)> = self
            .sent_packets
            .iter()
            .filter(|&(pn, _)| pn <= largest_acked)
            .map(|(pn, info)| (pn, info.time_sent))
            .collect();

        let mut lost = Vec::new();
        let mut lost_bytes = 0u32;
        let mut earliest_future_loss_time = None;

        for (pn, time_sent) in candidates {
            let by_packet_threshold = pn <= packet_number_threshold;
            let by_time_threshold = lost_send_time_threshold.is_some_and(|threshold| time_sent <= threshold);

            if by_packet_threshold || by_time_threshold {
                if let Some(info) = self.remove_by_u64(pn) {
                    if info.is_congestion_controlled {
                        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(info.sent_bytes as u32);
                        lost_bytes = lost_bytes.saturating_add(info.sent_bytes as u32);
                    }
                    lost.push(info);
                }
            } else if let Some(loss_time) = time_sent.checked_add(loss_delay) {
                earliest_future_loss_time = Some(earliest_future_loss_time.map_or(loss_time, |t: Timestamp| t.min(loss_time)));
            }
        }

        self.loss_time = earliest_future_loss_time;

        if !lost.is_empty() {
            let persistent_congestion = lost.iter().all(|info| info.is_congestion_controlled)
                && congestion_controller::persistent_congestion_duration_exceeded(lost.first().unwrap().time_sent, lost.last().unwrap().time_sent, self.rtt.persistent_congestion_threshold());
            self.congestion_controller.on_packets_lost(lost_bytes, persistent_congestion, true, now);
        }

        lost
    }

    fn remove_by_u64(&mut self, pn: u64) -> Option<SentPacketInfo> {
        let packet_number = self.space.new_packet_number(rquic_core::varint::VarInt::new(pn).ok()?);
        self.sent_packets.remove(packet_number)
    }

    pub fn loss_timer(&self) -> Option<Timestamp> {
        self.loss_time
    }

    pub fn on_pto_timer_expired(&mut self) -> ProbePackets {
        self.pto.on_timer_expired()
    }

    pub fn pto_period(&self) -> Duration {
        self.rtt.pto_period(self.pto.backoff(), self.space)
    }
}

pub fn default_congestion_controller() -> Box<dyn CongestionController> {
    Box::new(rquic_core::recovery::cubic::Cubic::new(MINIMUM_MTU))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_core::{packet::PacketNumberSpace, varint::VarInt};

    fn t(millis: u64) -> Timestamp {
        Timestamp::from_duration(Duration::from_millis(millis))
    }

    fn pn(value: u64) -> rquic_core::packet::PacketNumber {
        PacketNumberSpace::ApplicationData.new_packet_number(VarInt::new(value).unwrap())
    }

    fn manager() -> Manager {
        Manager::new(PacketNumberSpace::ApplicationData, Duration::from_millis(100), default_congestion_controller())
    }

    #[test]
    fn acking_a_packet_removes_it_from_flight() {
        let mut manager = manager();
        manager.on_packet_sent(pn(1), 1200, true, true, Vec::new(), t(0));
        assert_eq!(manager.bytes_in_flight(), 1200);

        let outcome = manager.on_ack_received(&[pn(1)], Some(t(0)), Duration::from_millis(0), t(50));
        assert_eq!(manager.bytes_in_flight(), 0);
        assert_eq!(outcome.acked.len(), 1);
    }

    #[test]
    fn packets_far_behind_the_largest_acked_are_declared_lost() {
        let mut manager = manager();
        for i in 1..=5 {
            manager.on_packet_sent(pn(i), 1200, true, true, Vec::new(), t(0));
        }
        let outcome = manager.on_ack_received(&[pn(5)], Some(t(0)), Duration::from_millis(0), t(10));
        // packet 1 is more than PACKET_THRESHOLD behind packet 5
        assert!(!outcome.lost.is_empty());
    }

    #[test]
    fn next_packet_number_increments_from_zero() {
        let mut manager = manager();
        assert_eq!(manager.next_packet_number().as_u64(), 0);
        assert_eq!(manager.next_packet_number().as_u64(), 1);
        assert_eq!(manager.next_packet_number().as_u64(), 2);
    }

    #[test]
    fn a_duplicate_received_packet_is_rejected_and_does_not_rearm_the_ack() {
        let mut manager = manager();
        manager.on_packet_received(pn(1), true, t(0)).unwrap();
        assert!(manager.take_pending_ack(t(0)).is_some());
        manager.on_packet_received(pn(1), true, t(1)).unwrap_err();
    }

    #[test]
    fn a_non_eliciting_packet_does_not_arm_an_ack() {
        let mut manager = manager();
        manager.on_packet_received(pn(1), false, t(0)).unwrap();
        assert!(manager.take_pending_ack(t(0)).is_none());
    }
}
