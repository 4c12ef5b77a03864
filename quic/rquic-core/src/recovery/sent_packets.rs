// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Per-space record of in-flight packets, kept in packet-number order so
//! the oldest unacknowledged packet is always at the front.

use crate::{packet::number::PacketNumber, time::Timestamp, varint::VarInt};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// A slice of stream data a sent packet carried, kept alongside the
/// packet's recovery bookkeeping so an ack or a loss can be mapped back to
/// the stream offsets it covers without the packet payload itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentStreamChunk {
    pub stream_id: VarInt,
    pub offset: VarInt,
    pub len: usize,
    pub is_fin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPacketInfo {
    pub time_sent: Timestamp,
    pub sent_bytes: usize,
    pub is_congestion_controlled: bool,
    pub ack_elicited: bool,
    pub stream_chunks: Vec<SentStreamChunk>,
}

/// Tracks unacknowledged packets for one packet number space.
#[derive(Clone, Debug, Default)]
pub struct SentPackets {
    packets: BTreeMap<u64, SentPacketInfo>,
}

impl SentPackets {
    pub fn new() -> Self {
        Self { packets: BTreeMap::new() }
    }

    pub fn insert(&mut self, packet_number: PacketNumber, info: SentPacketInfo) {
        self.packets.insert(packet_number.as_u64(), info);
    }

    pub fn remove(&mut self, packet_number: PacketNumber) -> Option<SentPacketInfo> {
        self.packets.remove(&packet_number.as_u64())
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn smallest_unacked(&self) -> Option<u64> {
        self.packets.keys().next().copied()
    }

    /// Packets sent at or before `time_sent_threshold`, oldest first —
    /// candidates for loss detection's time-threshold sweep.
    pub fn sent_before(&self, time_sent_threshold: Timestamp) -> impl Iterator<Item = (u64, &SentPacketInfo)> {
        self.packets.iter().filter(move |(_, info)| info.time_sent <= time_sent_threshold).map(|(k, v)| (*k, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &SentPacketInfo)> {
        self.packets.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{packet::number::PacketNumberSpace, varint::VarInt};

    fn pn(value: u64) -> PacketNumber {
        PacketNumberSpace::ApplicationData.new_packet_number(VarInt::new(value).unwrap())
    }

    fn info(time_sent: Timestamp) -> SentPacketInfo {
        SentPacketInfo { time_sent, sent_bytes: 100, is_congestion_controlled: true, ack_elicited: true, stream_chunks: Vec::new() }
    }

    #[test]
    fn smallest_unacked_tracks_the_lowest_key() {
        let mut sent = SentPackets::new();
        let t = Timestamp::from_duration(core::time::Duration::from_secs(1));
        sent.insert(pn(5), info(t));
        sent.insert(pn(3), info(t));
        assert_eq!(sent.smallest_unacked(), Some(3));
        sent.remove(pn(3));
        assert_eq!(sent.smallest_unacked(), Some(5));
    }
}
