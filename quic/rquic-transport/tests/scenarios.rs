//! End-to-end scenarios driven purely through `Connection`'s public
//! operation queue, using the loopback `tls::testing::Session` double and
//! hand-encoded frame bytes in place of the datapath/packet-protection
//! layers this crate doesn't implement (see `connection::mod`'s module
//! doc comment).

use rquic_core::{
    connection::{self, Limits},
    crypto::tls::testing::Session as TestSession,
    endpoint,
    frame::{Ack, ConnectionClose, Stream as StreamFrame},
    inet::{ExplicitCongestionNotification, SocketAddress},
    path::{MaxMtu, MINIMUM_MTU},
    recovery::cubic::Cubic,
    stream::{ops::Request, StreamId, StreamType},
    varint::VarInt,
};
use rquic_codec::EncoderValue;
use rquic_transport::{
    connection::Connection,
    event::Event,
    operation::{DrainOutcome, Operation},
};

fn addr(port: u16) -> SocketAddress {
    SocketAddress::new(std::net::SocketAddr::from(([127, 0, 0, 1], port)))
}

struct NoopWaker;
impl std::task::Wake for NoopWaker {
    fn wake(self: std::sync::Arc<Self>) {}
}

fn server() -> Connection<TestSession> {
    let waker = std::task::Waker::from(std::sync::Arc::new(NoopWaker));
    Connection::new(endpoint::Type::Server, TestSession, waker, Limits::default(), addr(4433), addr(5000), MaxMtu::default(), Box::new(Cubic::new(MINIMUM_MTU)))
}

fn t(secs: u64) -> rquic_core::time::Timestamp {
    rquic_core::time::Timestamp::from_duration(core::time::Duration::from_secs(secs))
}

fn frame_bytes<F: EncoderValue>(frame: &F) -> Vec<u8> {
    let mut bytes = Vec::new();
    frame.encode(&mut bytes);
    bytes
}

fn pn(space: rquic_core::packet::PacketNumberSpace, value: u64) -> rquic_core::packet::PacketNumber {
    space.new_packet_number(VarInt::new(value).unwrap())
}

/// Scenario 1: handshake completion. The loopback test double resolves on
/// the first poll, so one `drive_handshake` call is enough to surface
/// `HandshakeComplete` and queue the peer's CRYPTO bytes for transmission.
#[test]
fn handshake_completes_and_queues_outbound_crypto() {
    let mut connection = server();
    let done = connection.drive_handshake().unwrap();
    assert!(done);
    assert_eq!(connection.events_mut().pop(), Some(Event::HandshakeComplete));
}

/// Scenario 3: flow control / stream multiplexing. A client-initiated
/// bidirectional STREAM frame arrives before the application ever called
/// `open` on that ID; the connection must open it itself and surface both
/// `StreamOpened` and `StreamReadReady`.
#[test]
fn an_incoming_stream_frame_opens_the_stream_and_signals_readiness() {
    let mut connection = server();
    let stream_id = StreamId::initial(endpoint::Type::Client, StreamType::Bidirectional);

    let frame = StreamFrame { stream_id: stream_id.as_varint(), offset: VarInt::ZERO, data: b"hello", is_fin: false };
    connection.enqueue(Operation::DatagramReceived {
        payload: frame_bytes(&frame),
        ecn: ExplicitCongestionNotification::NotEct,
        space: rquic_core::packet::PacketNumberSpace::ApplicationData,
        packet_number: pn(rquic_core::packet::PacketNumberSpace::ApplicationData, 0),
    });
    connection.drain_operations(t(0));

    assert_eq!(connection.events_mut().pop(), Some(Event::StreamOpened { id: stream_id }));
    assert_eq!(connection.events_mut().pop(), Some(Event::StreamReadReady { id: stream_id }));
}

/// A local stream request opens a server-initiated stream and queues its
/// bytes for the packet builder, exercising `on_stream_request` end to end
/// through the operation queue rather than calling it directly.
#[test]
fn a_local_stream_request_queues_its_bytes_for_transmission() {
    let mut connection = server();
    let mut request = Request::default();
    request.send(vec![vec![1, 2, 3]]).finish();

    connection.enqueue(Operation::StreamRequest { id: rquic_transport::stream::StreamRequestId(0), request });
    connection.drain_operations(t(0));

    let mut out = [0u8; 256];
    let mut encoder = rquic_codec::EncoderBuffer::new(&mut out);
    let outcome = connection.poll_transmit(&mut encoder, rquic_core::packet::PacketNumberSpace::ApplicationData, t(0));
    assert!(outcome.in_flight);
    assert!(outcome.bytes_written > 0);
}

/// Scenario 2: loss and recovery. A sent packet carrying stream data that
/// goes unacknowledged past the loss threshold has its data requeued for
/// retransmission, then the retransmitted chunk is what the next
/// `poll_transmit` call actually sends.
#[test]
fn a_lost_packet_requeues_its_stream_data_for_retransmission() {
    let mut connection = server();

    // Four separate streams, each sent in its own packet, so packet
    // numbers 0..=3 each carry exactly one stream's data.
    for i in 0..4u64 {
        let mut request = Request::default();
        request.send(vec![vec![i as u8]]);
        connection.enqueue(Operation::StreamRequest { id: rquic_transport::stream::StreamRequestId(i), request });
        connection.drain_operations(t(i));

        let mut out = [0u8; 256];
        let mut encoder = rquic_codec::EncoderBuffer::new(&mut out);
        let outcome = connection.poll_transmit(&mut encoder, rquic_core::packet::PacketNumberSpace::ApplicationData, t(i));
        assert!(outcome.in_flight);
    }

    // Acking packet 3 alone puts packet 0 three packets behind the new
    // largest unacked packet, past `PACKET_THRESHOLD` (RFC 9002 6.1.1).
    let ack = Ack::new(VarInt::ZERO, vec![(VarInt::from_u32(3), VarInt::from_u32(3))], None);
    connection.enqueue(Operation::DatagramReceived {
        payload: frame_bytes(&ack),
        ecn: ExplicitCongestionNotification::NotEct,
        space: rquic_core::packet::PacketNumberSpace::ApplicationData,
        packet_number: pn(rquic_core::packet::PacketNumberSpace::ApplicationData, 100),
    });
    connection.drain_operations(t(5));

    let mut out = [0u8; 256];
    let mut encoder = rquic_codec::EncoderBuffer::new(&mut out);
    let retransmit = connection.poll_transmit(&mut encoder, rquic_core::packet::PacketNumberSpace::ApplicationData, t(5));
    assert!(retransmit.in_flight);
    assert!(retransmit.bytes_written > 0);
}

/// An ACK frame covering a packet this connection never actually sent
/// still has to round-trip through `on_frame`'s range expansion without
/// panicking or losing the ack-delay.
#[test]
fn an_ack_frame_is_accepted_without_a_matching_sent_packet() {
    let mut connection = server();
    let ack = Ack::new(VarInt::from_u32(25), vec![(VarInt::from_u32(1), VarInt::from_u32(3))], None);
    connection.enqueue(Operation::DatagramReceived {
        payload: frame_bytes(&ack),
        ecn: ExplicitCongestionNotification::NotEct,
        space: rquic_core::packet::PacketNumberSpace::ApplicationData,
        packet_number: pn(rquic_core::packet::PacketNumberSpace::ApplicationData, 0),
    });
    connection.drain_operations(t(0));
    // No direct observable state change expected since the referenced packet
    // numbers were never sent; the point of this test is that decode-dispatch
    // doesn't panic on an unmatched range.
    assert!(connection.error().is_none());
}

/// A remote CONNECTION_CLOSE moves the connection into `Draining` and
/// records the peer's error, matching RFC 9000 section 10.2's receiver-side
/// behavior (no close-retry timer is armed on the receiving end).
#[test]
fn a_remote_connection_close_frame_moves_the_connection_into_draining() {
    let mut connection = server();
    let close = ConnectionClose { error_code: VarInt::from_u32(42), frame_type: Some(VarInt::ZERO), reason: b"" };
    connection.enqueue(Operation::DatagramReceived {
        payload: frame_bytes(&close),
        ecn: ExplicitCongestionNotification::NotEct,
        space: rquic_core::packet::PacketNumberSpace::ApplicationData,
        packet_number: pn(rquic_core::packet::PacketNumberSpace::ApplicationData, 0),
    });
    connection.drain_operations(t(0));

    assert!(!connection.close_state().is_active());
    assert!(matches!(connection.close_state(), connection::CloseState::Draining { .. }));
    assert!(connection.error().is_some());
}

/// A local shutdown request transitions the connection and leaves a
/// CONNECTION_CLOSE frame queued for the next `poll_transmit`, then a
/// subsequent `Free` operation drops the last handle reference.
#[test]
fn local_shutdown_then_free_drains_the_connection_to_completion() {
    let mut connection = server();
    connection.enqueue(Operation::Shutdown { error: connection::Error::Closed { initiator: connection::Initiator::Local } });
    connection.drain_operations(t(0));
    assert!(!connection.close_state().is_active());

    connection.enqueue(Operation::Free);
    let outcome = connection.drain_operations(t(0));
    assert_eq!(outcome, DrainOutcome::Finished);
    assert_eq!(connection.refs().total(), 0);
}
