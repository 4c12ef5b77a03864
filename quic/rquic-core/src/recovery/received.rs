// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Per-space inbound packet-number bookkeeping (RFC 9000 section 12.3):
//! duplicate and too-old rejection, plus the contiguous-range view an
//! outgoing ACK frame is built from.

use crate::packet::number::PacketNumber;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

/// How many packet numbers behind the largest received a space still
/// remembers. Anything older than this is indistinguishable from a
/// duplicate as far as ACK generation is concerned, so it's rejected the
/// same way (RFC 9000 section 13.2.3 allows bounding the ack range set).
const PACKET_NUMBER_WINDOW: u64 = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rejected {
    Duplicate,
    TooOld,
}

/// Tracks which packet numbers have been received in one packet number
/// space, bounded to the most recent [`PACKET_NUMBER_WINDOW`] values.
#[derive(Clone, Debug, Default)]
pub struct ReceivedPackets {
    received: BTreeSet<u64>,
    largest: Option<u64>,
}

impl ReceivedPackets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `packet_number` as received, rejecting it if it's a
    /// duplicate or has fallen out of the tracked window.
    pub fn on_packet_received(&mut self, packet_number: PacketNumber) -> Result<(), Rejected> {
        let value = packet_number.as_u64();

        if let Some(largest) = self.largest {
            if largest.saturating_sub(value) >= PACKET_NUMBER_WINDOW {
                return Err(Rejected::TooOld);
            }
        }

        if !self.received.insert(value) {
            return Err(Rejected::Duplicate);
        }

        self.largest = Some(self.largest.map_or(value, |largest| largest.max(value)));

        if let Some(largest) = self.largest {
            let floor = largest.saturating_sub(PACKET_NUMBER_WINDOW);
            while self.received.iter().next().is_some_and(|&smallest| smallest < floor) {
                let smallest = *self.received.iter().next().unwrap();
                self.received.remove(&smallest);
            }
        }

        Ok(())
    }

    pub fn largest(&self) -> Option<u64> {
        self.largest
    }

    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    /// Every contiguous run of received packet numbers, largest-first, as
    /// `(smallest, largest)` inclusive pairs — the shape an ACK frame's
    /// range list needs.
    pub fn ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges = Vec::new();
        let mut iter = self.received.iter().rev().copied();
        let Some(mut largest) = iter.next() else { return ranges };
        let mut smallest = largest;

        for value in iter {
            if value + 1 == smallest {
                smallest = value;
            } else {
                ranges.push((smallest, largest));
                largest = value;
                smallest = value;
            }
        }
        ranges.push((smallest, largest));
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::number::PacketNumberSpace;
    use crate::varint::VarInt;

    fn pn(value: u64) -> PacketNumber {
        PacketNumberSpace::ApplicationData.new_packet_number(VarInt::new(value).unwrap())
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut received = ReceivedPackets::new();
        received.on_packet_received(pn(5)).unwrap();
        assert_eq!(received.on_packet_received(pn(5)), Err(Rejected::Duplicate));
    }

    #[test]
    fn packets_older_than_the_window_are_rejected() {
        let mut received = ReceivedPackets::new();
        received.on_packet_received(pn(1000)).unwrap();
        assert_eq!(received.on_packet_received(pn(0)), Err(Rejected::TooOld));
    }

    #[test]
    fn contiguous_runs_collapse_into_one_range() {
        let mut received = ReceivedPackets::new();
        for value in [0, 1, 2, 5, 6, 9] {
            received.on_packet_received(pn(value)).unwrap();
        }
        assert_eq!(received.ranges(), vec![(9, 9), (5, 6), (0, 2)]);
    }

    #[test]
    fn out_of_order_arrivals_still_merge_correctly() {
        let mut received = ReceivedPackets::new();
        for value in [3, 1, 0, 2] {
            received.on_packet_received(pn(value)).unwrap();
        }
        assert_eq!(received.ranges(), vec![(0, 3)]);
    }
}
