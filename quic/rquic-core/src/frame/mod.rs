// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Frame encode/decode. QUIC packets carry one or more frames back to back;
//! this module defines each frame's wire shape and the `Frame` enum a
//! packet payload decodes into.
//!
//! Frames that are more naturally grouped by shared shape (the stateless
//! flow-control limit frames, the connection-ID frames) live together in
//! one file rather than one-file-per-type, since they differ only in tag
//! and field names.

pub mod ack;
pub mod ack_elicitation;
pub mod ack_frequency;
pub mod connection_close;
pub mod connection_id;
pub mod crypto;
pub mod datagram;
pub mod limits;
pub mod path;
pub mod reliable_reset;
pub mod simple;
pub mod stream;

pub use ack::Ack;
pub use ack_elicitation::{AckElicitable, AckElicitation};
pub use ack_frequency::{AckFrequency, ImmediateAck, Timestamp};
pub use connection_close::ConnectionClose;
pub use connection_id::{NewConnectionId, RetireConnectionId};
pub use crypto::Crypto;
pub use datagram::Datagram;
pub use limits::{DataBlocked, MaxData, MaxStreamData, MaxStreams, StreamDataBlocked, StreamDirection, StreamsBlocked};
pub use path::{PathChallenge, PathResponse};
pub use reliable_reset::ReliableResetStream;
pub use simple::{HandshakeDone, Padding, Ping};
pub use stream::{NewToken, ResetStream, StopSending, Stream};

use rquic_codec::{DecoderBuffer, DecoderBufferMut, DecoderError, DecoderValue, Encoder, EncoderValue};

pub(crate) type Tag = u8;

pub const PADDING_TAG: Tag = 0x00;
pub const PING_TAG: Tag = 0x01;
pub const ACK_TAG: Tag = 0x02;
pub const ACK_ECN_TAG: Tag = 0x03;
pub const RESET_STREAM_TAG: Tag = 0x04;
pub const STOP_SENDING_TAG: Tag = 0x05;
pub const CRYPTO_TAG: Tag = 0x06;
pub const NEW_TOKEN_TAG: Tag = 0x07;
pub const STREAM_TAG_MIN: Tag = 0x08;
pub const STREAM_TAG_MAX: Tag = 0x0f;
pub const MAX_DATA_TAG: Tag = 0x10;
pub const MAX_STREAM_DATA_TAG: Tag = 0x11;
pub const MAX_STREAMS_BIDI_TAG: Tag = 0x12;
pub const MAX_STREAMS_UNI_TAG: Tag = 0x13;
pub const DATA_BLOCKED_TAG: Tag = 0x14;
pub const STREAM_DATA_BLOCKED_TAG: Tag = 0x15;
pub const STREAMS_BLOCKED_BIDI_TAG: Tag = 0x16;
pub const STREAMS_BLOCKED_UNI_TAG: Tag = 0x17;
pub const NEW_CONNECTION_ID_TAG: Tag = 0x18;
pub const RETIRE_CONNECTION_ID_TAG: Tag = 0x19;
pub const PATH_CHALLENGE_TAG: Tag = 0x1a;
pub const PATH_RESPONSE_TAG: Tag = 0x1b;
pub const CONNECTION_CLOSE_TRANSPORT_TAG: Tag = 0x1c;
pub const CONNECTION_CLOSE_APPLICATION_TAG: Tag = 0x1d;
pub const HANDSHAKE_DONE_TAG: Tag = 0x1e;
pub const DATAGRAM_TAG: Tag = 0x30;
pub const DATAGRAM_WITH_LEN_TAG: Tag = 0x31;
pub const ACK_FREQUENCY_TAG: Tag = 0xaf;
pub const IMMEDIATE_ACK_TAG: Tag = 0x1f;
pub const RELIABLE_RESET_STREAM_TAG: Tag = 0x20;
pub const TIMESTAMP_TAG: Tag = 0x2f;

/// A decoded frame borrowed from the packet payload it was parsed out of.
#[derive(Debug, PartialEq)]
pub enum Frame<'a> {
    Padding(Padding),
    Ping(Ping),
    Ack(Ack<'a>),
    ResetStream(ResetStream),
    StopSending(StopSending),
    Crypto(Crypto<'a>),
    NewToken(NewToken<'a>),
    Stream(Stream<'a>),
    MaxData(MaxData),
    MaxStreamData(MaxStreamData),
    MaxStreams(MaxStreams),
    DataBlocked(DataBlocked),
    StreamDataBlocked(StreamDataBlocked),
    StreamsBlocked(StreamsBlocked),
    NewConnectionId(NewConnectionId<'a>),
    RetireConnectionId(RetireConnectionId),
    PathChallenge(PathChallenge),
    PathResponse(PathResponse),
    ConnectionClose(ConnectionClose<'a>),
    HandshakeDone(HandshakeDone),
    Datagram(Datagram<'a>),
    ReliableResetStream(ReliableResetStream),
    AckFrequency(AckFrequency),
    ImmediateAck(ImmediateAck),
    Timestamp(Timestamp),
}

impl<'a> AckElicitable for Frame<'a> {
    fn ack_elicitation(&self) -> AckElicitation {
        match self {
            Frame::Padding(_) | Frame::Ack(_) | Frame::ConnectionClose(_) => {
                AckElicitation::NonEliciting
            }
            _ => AckElicitation::Eliciting,
        }
    }
}

/// Parses the next frame out of `buffer`, returning the frame and the
/// remainder of the buffer after it.
pub fn decode<'a>(buffer: DecoderBuffer<'a>) -> Result<(Frame<'a>, DecoderBuffer<'a>), DecoderError> {
    let (tag, _) = buffer.decode_slice(1)?;
    let tag = tag.as_less_safe_slice()[0];

    match tag {
        PADDING_TAG => {
            let (frame, buffer) = buffer.decode::<Padding>()?;
            Ok((Frame::Padding(frame), buffer))
        }
        PING_TAG => {
            let (frame, buffer) = buffer.decode::<Ping>()?;
            Ok((Frame::Ping(frame), buffer))
        }
        ACK_TAG | ACK_ECN_TAG => {
            let (frame, buffer) = Ack::decode(tag == ACK_ECN_TAG, buffer)?;
            Ok((Frame::Ack(frame), buffer))
        }
        RESET_STREAM_TAG => {
            let (frame, buffer) = buffer.decode::<ResetStream>()?;
            Ok((Frame::ResetStream(frame), buffer))
        }
        STOP_SENDING_TAG => {
            let (frame, buffer) = buffer.decode::<StopSending>()?;
            Ok((Frame::StopSending(frame), buffer))
        }
        CRYPTO_TAG => {
            let (frame, buffer) = buffer.decode::<Crypto>()?;
            Ok((Frame::Crypto(frame), buffer))
        }
        NEW_TOKEN_TAG => {
            let (frame, buffer) = buffer.decode::<NewToken>()?;
            Ok((Frame::NewToken(frame), buffer))
        }
        STREAM_TAG_MIN..=STREAM_TAG_MAX => {
            let (frame, buffer) = Stream::decode(tag, buffer)?;
            Ok((Frame::Stream(frame), buffer))
        }
        MAX_DATA_TAG => {
            let (frame, buffer) = buffer.decode::<MaxData>()?;
            Ok((Frame::MaxData(frame), buffer))
        }
        MAX_STREAM_DATA_TAG => {
            let (frame, buffer) = buffer.decode::<MaxStreamData>()?;
            Ok((Frame::MaxStreamData(frame), buffer))
        }
        MAX_STREAMS_BIDI_TAG | MAX_STREAMS_UNI_TAG => {
            let (frame, buffer) = MaxStreams::decode(tag == MAX_STREAMS_UNI_TAG, buffer)?;
            Ok((Frame::MaxStreams(frame), buffer))
        }
        DATA_BLOCKED_TAG => {
            let (frame, buffer) = buffer.decode::<DataBlocked>()?;
            Ok((Frame::DataBlocked(frame), buffer))
        }
        STREAM_DATA_BLOCKED_TAG => {
            let (frame, buffer) = buffer.decode::<StreamDataBlocked>()?;
            Ok((Frame::StreamDataBlocked(frame), buffer))
        }
        STREAMS_BLOCKED_BIDI_TAG | STREAMS_BLOCKED_UNI_TAG => {
            let (frame, buffer) = StreamsBlocked::decode(tag == STREAMS_BLOCKED_UNI_TAG, buffer)?;
            Ok((Frame::StreamsBlocked(frame), buffer))
        }
        NEW_CONNECTION_ID_TAG => {
            let (frame, buffer) = buffer.decode::<NewConnectionId>()?;
            Ok((Frame::NewConnectionId(frame), buffer))
        }
        RETIRE_CONNECTION_ID_TAG => {
            let (frame, buffer) = buffer.decode::<RetireConnectionId>()?;
            Ok((Frame::RetireConnectionId(frame), buffer))
        }
        PATH_CHALLENGE_TAG => {
            let (frame, buffer) = buffer.decode::<PathChallenge>()?;
            Ok((Frame::PathChallenge(frame), buffer))
        }
        PATH_RESPONSE_TAG => {
            let (frame, buffer) = buffer.decode::<PathResponse>()?;
            Ok((Frame::PathResponse(frame), buffer))
        }
        CONNECTION_CLOSE_TRANSPORT_TAG | CONNECTION_CLOSE_APPLICATION_TAG => {
            let (frame, buffer) = ConnectionClose::decode(tag == CONNECTION_CLOSE_APPLICATION_TAG, buffer)?;
            Ok((Frame::ConnectionClose(frame), buffer))
        }
        HANDSHAKE_DONE_TAG => {
            let (frame, buffer) = buffer.decode::<HandshakeDone>()?;
            Ok((Frame::HandshakeDone(frame), buffer))
        }
        DATAGRAM_TAG | DATAGRAM_WITH_LEN_TAG => {
            let (frame, buffer) = Datagram::decode(tag == DATAGRAM_WITH_LEN_TAG, buffer)?;
            Ok((Frame::Datagram(frame), buffer))
        }
        RELIABLE_RESET_STREAM_TAG => {
            let (frame, buffer) = buffer.decode::<ReliableResetStream>()?;
            Ok((Frame::ReliableResetStream(frame), buffer))
        }
        ACK_FREQUENCY_TAG => {
            let (frame, buffer) = buffer.decode::<AckFrequency>()?;
            Ok((Frame::AckFrequency(frame), buffer))
        }
        IMMEDIATE_ACK_TAG => {
            let (frame, buffer) = buffer.decode::<ImmediateAck>()?;
            Ok((Frame::ImmediateAck(frame), buffer))
        }
        TIMESTAMP_TAG => {
            let (frame, buffer) = buffer.decode::<Timestamp>()?;
            Ok((Frame::Timestamp(frame), buffer))
        }
        _ => Err(DecoderError::InvariantViolation("unknown frame type")),
    }
}

impl<'a> EncoderValue for Frame<'a> {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        match self {
            Frame::Padding(f) => f.encode(encoder),
            Frame::Ping(f) => f.encode(encoder),
            Frame::Ack(f) => f.encode(encoder),
            Frame::ResetStream(f) => f.encode(encoder),
            Frame::StopSending(f) => f.encode(encoder),
            Frame::Crypto(f) => f.encode(encoder),
            Frame::NewToken(f) => f.encode(encoder),
            Frame::Stream(f) => f.encode(encoder),
            Frame::MaxData(f) => f.encode(encoder),
            Frame::MaxStreamData(f) => f.encode(encoder),
            Frame::MaxStreams(f) => f.encode(encoder),
            Frame::DataBlocked(f) => f.encode(encoder),
            Frame::StreamDataBlocked(f) => f.encode(encoder),
            Frame::StreamsBlocked(f) => f.encode(encoder),
            Frame::NewConnectionId(f) => f.encode(encoder),
            Frame::RetireConnectionId(f) => f.encode(encoder),
            Frame::PathChallenge(f) => f.encode(encoder),
            Frame::PathResponse(f) => f.encode(encoder),
            Frame::ConnectionClose(f) => f.encode(encoder),
            Frame::HandshakeDone(f) => f.encode(encoder),
            Frame::Datagram(f) => f.encode(encoder),
            Frame::ReliableResetStream(f) => f.encode(encoder),
            Frame::AckFrequency(f) => f.encode(encoder),
            Frame::ImmediateAck(f) => f.encode(encoder),
            Frame::Timestamp(f) => f.encode(encoder),
        }
    }
}

pub(crate) fn decode_tag(buffer: DecoderBuffer<'_>) -> Result<(Tag, DecoderBuffer<'_>), DecoderError> {
    let (slice, buffer) = buffer.decode_slice(1)?;
    Ok((slice.as_less_safe_slice()[0], buffer))
}

pub(crate) fn decode_tag_mut(
    buffer: DecoderBufferMut<'_>,
) -> Result<(Tag, DecoderBufferMut<'_>), DecoderError> {
    let (slice, buffer) = buffer.decode_slice(1)?;
    Ok((slice.as_less_safe_slice()[0], buffer))
}
