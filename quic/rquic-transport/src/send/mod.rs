//! Packet builder: fills one outgoing packet from whatever a connection has
//! marked as pending, in the priority order ACK > CRYPTO > flow-control/limit
//! frames > STREAM data > RESET_STREAM/STOP_SENDING > connection-ID
//! maintenance > PING (probes) > PADDING.
//!
//! Anti-amplification is checked once, up front, as a hard ceiling on how
//! many bytes this call may write at all — every frame below still has to
//! fit inside both that ceiling and the caller-supplied buffer.

use rquic_codec::{Encoder, EncoderValue};
use rquic_core::{
    frame::{
        Ack, Crypto as CryptoFrame, DataBlocked, MaxData, MaxStreamData, MaxStreams,
        NewConnectionId, Padding, Ping, ResetStream, RetireConnectionId, StopSending,
        Stream as StreamFrame, StreamDataBlocked, StreamDirection, StreamsBlocked,
    },
    path::AmplificationLimit,
    varint::VarInt,
};
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAck {
    pub ack_delay: VarInt,
    pub ack_ranges: Vec<(VarInt, VarInt)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamChunk {
    pub stream_id: VarInt,
    pub offset: VarInt,
    pub data: Vec<u8>,
    pub is_fin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewConnectionIdChunk {
    pub sequence_number: VarInt,
    pub retire_prior_to: VarInt,
    pub connection_id: Vec<u8>,
    pub stateless_reset_token: [u8; 16],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionCloseChunk {
    pub error_code: VarInt,
    pub frame_type: Option<VarInt>,
    pub reason: Vec<u8>,
}

/// Everything a connection may currently want to send, queued up as it
/// accumulates between drain passes. `Builder::build` drains this in
/// priority order until the packet is full.
#[derive(Debug, Default)]
pub struct Pending {
    pub connection_close: Option<ConnectionCloseChunk>,
    pub ack: Option<PendingAck>,
    /// Handshake bytes for this packet number space, queued as
    /// `(offset, bytes)` pairs (RFC 9000 section 19.6). A connection in
    /// the `Initial`/`Handshake` spaces only ever populates this and
    /// `ack`/`connection_close`; the flow-control and stream queues below
    /// only apply to the application data space.
    pub crypto: VecDeque<(VarInt, Vec<u8>)>,
    pub max_data: Option<VarInt>,
    pub data_blocked: Option<VarInt>,
    pub max_stream_data: VecDeque<(VarInt, VarInt)>,
    pub stream_data_blocked: VecDeque<(VarInt, VarInt)>,
    pub max_streams_bidi: Option<VarInt>,
    pub max_streams_uni: Option<VarInt>,
    pub streams_blocked_bidi: Option<VarInt>,
    pub streams_blocked_uni: Option<VarInt>,
    pub stream_data: VecDeque<StreamChunk>,
    pub reset_stream: VecDeque<(VarInt, VarInt, VarInt)>,
    pub stop_sending: VecDeque<(VarInt, VarInt)>,
    pub new_connection_id: VecDeque<NewConnectionIdChunk>,
    pub retire_connection_id: VecDeque<VarInt>,
    pub path_challenge: Option<[u8; 8]>,
    pub path_response: Option<[u8; 8]>,
    /// Set when a PTO probe needs an ack-eliciting filler and nothing else
    /// pending happens to be one.
    pub ping_requested: bool,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        self.connection_close.is_none()
            && self.ack.is_none()
            && self.crypto.is_empty()
            && self.max_data.is_none()
            && self.data_blocked.is_none()
            && self.max_stream_data.is_empty()
            && self.stream_data_blocked.is_empty()
            && self.max_streams_bidi.is_none()
            && self.max_streams_uni.is_none()
            && self.streams_blocked_bidi.is_none()
            && self.streams_blocked_uni.is_none()
            && self.stream_data.is_empty()
            && self.reset_stream.is_empty()
            && self.stop_sending.is_empty()
            && self.new_connection_id.is_empty()
            && self.retire_connection_id.is_empty()
            && self.path_challenge.is_none()
            && self.path_response.is_none()
            && !self.ping_requested
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub bytes_written: usize,
    pub ack_eliciting: bool,
    /// Whether the packet carries anything other than ACK/PADDING — these
    /// count against the congestion window and loss detection tracks them.
    pub in_flight: bool,
}

pub struct Builder;

impl Builder {
    /// Fills `encoder` from `pending`, stopping when either runs out. A
    /// `CONNECTION_CLOSE` closes the packet immediately: RFC 9000 section
    /// 10.2 doesn't want it sharing space with anything else.
    pub fn build<E: Encoder>(encoder: &mut E, pending: &mut Pending, amplification: &mut AmplificationLimit, pad_to: Option<usize>) -> Outcome {
        let mut outcome = Outcome::default();
        let budget = amplification.clamp(encoder.remaining_capacity());

        fn write<E: Encoder, T: EncoderValue>(encoder: &mut E, bytes_written: &mut usize, budget: usize, frame: &T) -> bool {
            let size = frame.encoding_size();
            if *bytes_written + size > budget || size > encoder.remaining_capacity() {
                return false;
            }
            frame.encode(encoder);
            *bytes_written += size;
            true
        }

        if let Some(close) = pending.connection_close.take() {
            let frame = rquic_core::frame::ConnectionClose { error_code: close.error_code, frame_type: close.frame_type, reason: &close.reason };
            if write(encoder, &mut outcome.bytes_written, budget, &frame) {
                outcome.in_flight = true;
                return outcome;
            }
            pending.connection_close = Some(close);
            return outcome;
        }

        if let Some(ack) = &pending.ack {
            let frame = Ack::new(ack.ack_delay, ack.ack_ranges.clone(), None);
            if write(encoder, &mut outcome.bytes_written, budget, &frame) {
                pending.ack = None;
            }
        }

        while let Some((offset, data)) = pending.crypto.front() {
            let frame = CryptoFrame { offset: *offset, data };
            if !write(encoder, &mut outcome.bytes_written, budget, &frame) {
                break;
            }
            pending.crypto.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }

        if let Some(value) = pending.max_data {
            if write(encoder, &mut outcome.bytes_written, budget, &MaxData { value }) {
                pending.max_data = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        if let Some(value) = pending.data_blocked {
            if write(encoder, &mut outcome.bytes_written, budget, &DataBlocked { value }) {
                pending.data_blocked = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        while let Some(&(stream_id, value)) = pending.max_stream_data.front() {
            if !write(encoder, &mut outcome.bytes_written, budget, &MaxStreamData { stream_id, value }) {
                break;
            }
            pending.max_stream_data.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }
        while let Some(&(stream_id, value)) = pending.stream_data_blocked.front() {
            if !write(encoder, &mut outcome.bytes_written, budget, &StreamDataBlocked { stream_id, value }) {
                break;
            }
            pending.stream_data_blocked.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }
        if let Some(value) = pending.max_streams_bidi {
            if write(encoder, &mut outcome.bytes_written, budget, &MaxStreams { direction: StreamDirection::Bidirectional, value }) {
                pending.max_streams_bidi = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        if let Some(value) = pending.max_streams_uni {
            if write(encoder, &mut outcome.bytes_written, budget, &MaxStreams { direction: StreamDirection::Unidirectional, value }) {
                pending.max_streams_uni = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        if let Some(value) = pending.streams_blocked_bidi {
            if write(encoder, &mut outcome.bytes_written, budget, &StreamsBlocked { direction: StreamDirection::Bidirectional, value }) {
                pending.streams_blocked_bidi = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        if let Some(value) = pending.streams_blocked_uni {
            if write(encoder, &mut outcome.bytes_written, budget, &StreamsBlocked { direction: StreamDirection::Unidirectional, value }) {
                pending.streams_blocked_uni = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }

        while let Some(chunk) = pending.stream_data.front() {
            let frame = StreamFrame { stream_id: chunk.stream_id, offset: chunk.offset, data: &chunk.data, is_fin: chunk.is_fin };
            if !write(encoder, &mut outcome.bytes_written, budget, &frame) {
                break;
            }
            pending.stream_data.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }

        while let Some(&(stream_id, application_error_code, final_size)) = pending.reset_stream.front() {
            if !write(encoder, &mut outcome.bytes_written, budget, &ResetStream { stream_id, application_error_code, final_size }) {
                break;
            }
            pending.reset_stream.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }
        while let Some(&(stream_id, application_error_code)) = pending.stop_sending.front() {
            if !write(encoder, &mut outcome.bytes_written, budget, &StopSending { stream_id, application_error_code }) {
                break;
            }
            pending.stop_sending.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }

        while let Some(chunk) = pending.new_connection_id.front() {
            let frame = NewConnectionId {
                sequence_number: chunk.sequence_number,
                retire_prior_to: chunk.retire_prior_to,
                connection_id: &chunk.connection_id,
                stateless_reset_token: &chunk.stateless_reset_token,
            };
            if !write(encoder, &mut outcome.bytes_written, budget, &frame) {
                break;
            }
            pending.new_connection_id.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }
        while let Some(&sequence_number) = pending.retire_connection_id.front() {
            if !write(encoder, &mut outcome.bytes_written, budget, &RetireConnectionId { sequence_number }) {
                break;
            }
            pending.retire_connection_id.pop_front();
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }

        if let Some(data) = pending.path_challenge {
            if write(encoder, &mut outcome.bytes_written, budget, &rquic_core::frame::PathChallenge { data }) {
                pending.path_challenge = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }
        if let Some(data) = pending.path_response {
            if write(encoder, &mut outcome.bytes_written, budget, &rquic_core::frame::PathResponse { data }) {
                pending.path_response = None;
                outcome.ack_eliciting = true;
                outcome.in_flight = true;
            }
        }

        if pending.ping_requested && write(encoder, &mut outcome.bytes_written, budget, &Ping) {
            pending.ping_requested = false;
            outcome.ack_eliciting = true;
            outcome.in_flight = true;
        }

        if let Some(target) = pad_to {
            while outcome.bytes_written < target && encoder.remaining_capacity() > 0 {
                Padding.encode(encoder);
                outcome.bytes_written += 1;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_codec::EncoderBuffer;

    #[test]
    fn ack_is_filled_before_stream_data() {
        let mut pending = Pending::default();
        pending.ack = Some(PendingAck { ack_delay: VarInt::ZERO, ack_ranges: vec![(VarInt::from(1u32), VarInt::from(2u32))] });
        pending.stream_data.push_back(StreamChunk { stream_id: VarInt::from(4u32), offset: VarInt::ZERO, data: vec![1, 2, 3], is_fin: false });

        let mut out = [0u8; 128];
        let mut encoder = EncoderBuffer::new(&mut out);
        let mut amplification = AmplificationLimit::default();
        amplification.on_bytes_received(10_000);

        let outcome = Builder::build(&mut encoder, &mut pending, &mut amplification, None);
        assert!(pending.ack.is_none());
        assert!(pending.stream_data.is_empty());
        assert!(outcome.in_flight);
        assert!(outcome.bytes_written > 0);
    }

    #[test]
    fn anti_amplification_caps_how_much_an_unvalidated_path_may_send() {
        let mut pending = Pending::default();
        pending.stream_data.push_back(StreamChunk { stream_id: VarInt::from(4u32), offset: VarInt::ZERO, data: vec![0u8; 100], is_fin: false });

        let mut out = [0u8; 200];
        let mut encoder = EncoderBuffer::new(&mut out);
        let mut amplification = AmplificationLimit::default();
        // no bytes received yet: remaining() is 0, so nothing should fit.

        let outcome = Builder::build(&mut encoder, &mut pending, &mut amplification, None);
        assert_eq!(outcome.bytes_written, 0);
        assert!(!pending.stream_data.is_empty());
    }

    #[test]
    fn padding_tops_up_to_the_requested_minimum() {
        let mut pending = Pending::default();
        pending.ping_requested = true;

        let mut out = [0u8; 64];
        let mut encoder = EncoderBuffer::new(&mut out);
        let mut amplification = AmplificationLimit::default();
        amplification.on_bytes_received(10_000);

        let outcome = Builder::build(&mut encoder, &mut pending, &mut amplification, Some(32));
        assert_eq!(outcome.bytes_written, 32);
    }
}
