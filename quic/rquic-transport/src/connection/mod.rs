//! The connection state machine: the capstone that composes per-space
//! loss detection, the active path, the stream table, the crypto manager,
//! and the packet builder into the thing a worker actually drains on each
//! wake-up.
//!
//! Packet protection (header encode/decode, AEAD open/seal) is out of this
//! crate's scope, so `on_datagram` assumes its `payload` has already passed
//! through that boundary and is ready to decode as a plain sequence of
//! frames (RFC 9000 section 12.4). The packet number space and number the
//! datagram belongs to are resolved by that same out-of-scope header layer
//! and carried alongside the payload rather than rediscovered here, since
//! determining them requires the long-header parsing and key-phase lookup
//! this crate doesn't implement.

pub mod close;
pub mod handle;

use rquic_core::{
    application,
    connection::{self, Limits},
    crypto::tls,
    frame::{self, AckElicitable, Frame},
    inet::{ExplicitCongestionNotification, SocketAddress},
    packet::{PacketNumber, PacketNumberSpace},
    stream::{ops, StreamId},
    time::Timestamp,
    transport::TransportError,
    varint::VarInt,
};

use crate::{
    cid, crypto_manager, datagram, event,
    operation::{DrainOutcome, Operation, Queue as OperationQueue},
    path, recovery, send, stream, timer,
};

/// Loss detection and the outbound frame queue for one packet number
/// space. `Initial`/`Handshake` each get one; the application data space's
/// equivalent lives on the active `path::Path` instead, since congestion
/// control and RTT are properties of the path once the handshake leaves
/// the space where every packet shares one path by construction.
#[derive(Debug)]
struct SpaceState {
    recovery: recovery::Manager,
    pending: send::Pending,
}

impl SpaceState {
    fn new(space: PacketNumberSpace, initial_rtt: core::time::Duration) -> Self {
        Self { recovery: recovery::Manager::new(space, initial_rtt, recovery::default_congestion_controller()), pending: send::Pending::default() }
    }
}

#[derive(Debug)]
pub struct Connection<S: tls::Session> {
    role: rquic_core::endpoint::Type,
    session: S,
    crypto: crypto_manager::Manager<S>,
    initial: SpaceState,
    handshake: SpaceState,
    application_pending: send::Pending,
    paths: path::Manager,
    streams: stream::Manager,
    datagrams: datagram::Manager,
    refs: handle::RefCount,
    timers: timer::Set,
    operations: OperationQueue,
    events: event::Queue,
    close_state: connection::CloseState,
    close_retry: close::CloseRetry,
    error: Option<connection::Error>,
    limits: Limits,
    max_data_peer: u64,
    data_received: u64,
    next_stream_request: u64,
    cid: cid::Table,
}

impl<S: tls::Session> Connection<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role: rquic_core::endpoint::Type,
        session: S,
        waker: std::task::Waker,
        limits: Limits,
        local_address: SocketAddress,
        remote_address: SocketAddress,
        max_mtu: rquic_core::path::MaxMtu,
        congestion_controller: Box<dyn rquic_core::recovery::congestion_controller::CongestionController>,
    ) -> Self {
        let initial_rtt = core::time::Duration::from_millis(333);
        let initial_path = path::Path::new(local_address, remote_address, max_mtu, rquic_core::path::IPV4_MIN_HEADER_LEN, initial_rtt, congestion_controller);

        let refs = handle::RefCount::new();
        refs.acquire(handle::Kind::Handle);

        Self {
            role,
            session,
            crypto: crypto_manager::Manager::new(waker),
            initial: SpaceState::new(PacketNumberSpace::Initial, initial_rtt),
            handshake: SpaceState::new(PacketNumberSpace::Handshake, initial_rtt),
            application_pending: send::Pending::default(),
            paths: path::Manager::new(initial_path),
            streams: stream::Manager::new(),
            datagrams: datagram::Manager::new(),
            refs,
            timers: timer::Set::new(),
            operations: OperationQueue::new(),
            events: event::Queue::new(),
            close_state: connection::CloseState::Active,
            close_retry: close::CloseRetry::new(initial_rtt),
            error: None,
            limits,
            max_data_peer: 0,
            data_received: 0,
            next_stream_request: 0,
            cid: cid::Table::new(),
        }
    }

    pub fn enqueue(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn refs(&self) -> &handle::RefCount {
        &self.refs
    }

    pub fn close_state(&self) -> connection::CloseState {
        self.close_state
    }

    pub fn error(&self) -> Option<connection::Error> {
        self.error
    }

    /// Drains up to `crate::operation::OPERATION_BATCH` queued operations,
    /// returning what the worker should do with this connection next.
    pub fn drain_operations(&mut self, now: Timestamp) -> DrainOutcome {
        let mut drained = 0;
        while drained < crate::operation::OPERATION_BATCH {
            let Some(operation) = self.operations.pop() else {
                return if self.close_state.is_expired(now) { DrainOutcome::Finished } else { DrainOutcome::Park };
            };
            drained += 1;

            match operation {
                Operation::DatagramReceived { payload, ecn, space, packet_number } => self.on_datagram(&payload, ecn, space, packet_number, now),
                Operation::StreamRequest { id, request } => self.on_stream_request(id, request),
                Operation::TimerExpired(kind) => self.on_timer_expired(kind, now),
                Operation::Shutdown { error } => self.on_local_close(error, now),
                Operation::RouteResolved { worker: _ } => {}
                Operation::Free => {
                    self.refs.release(handle::Kind::Handle);
                    return DrainOutcome::Finished;
                }
            }
        }

        if self.operations.is_empty() {
            DrainOutcome::Park
        } else {
            DrainOutcome::ReQueue
        }
    }

    fn on_local_close(&mut self, error: connection::Error, now: Timestamp) {
        if self.close_state.is_active() {
            let pto = self.application_recovery().pto_period();
            let deadline = close::draining_deadline(now, pto);
            self.close_state = connection::CloseState::Closing { deadline };
            self.error = Some(error);
            self.application_pending.connection_close = Some(send::ConnectionCloseChunk { error_code: VarInt::ZERO, frame_type: None, reason: Vec::new() });
            self.events.push(event::Event::Closed { error });
        }
    }

    fn application_recovery(&mut self) -> &mut recovery::Manager {
        self.paths.active_mut().recovery_mut()
    }

    /// Dispatches to the recovery manager for `space` — `Initial`/
    /// `Handshake` each keep their own, while `ApplicationData`'s lives on
    /// the active path since congestion control and RTT become
    /// path-scoped once the handshake settles onto one path.
    fn recovery_mut(&mut self, space: PacketNumberSpace) -> &mut recovery::Manager {
        match space {
            PacketNumberSpace::Initial => &mut self.initial.recovery,
            PacketNumberSpace::Handshake => &mut self.handshake.recovery,
            PacketNumberSpace::ApplicationData => self.paths.active_mut().recovery_mut(),
        }
    }

    fn pending_mut(&mut self, space: PacketNumberSpace) -> &mut send::Pending {
        match space {
            PacketNumberSpace::Initial => &mut self.initial.pending,
            PacketNumberSpace::Handshake => &mut self.handshake.pending,
            PacketNumberSpace::ApplicationData => &mut self.application_pending,
        }
    }

    fn on_timer_expired(&mut self, kind: timer::Kind, now: Timestamp) {
        match kind {
            timer::Kind::LossDetection => {
                let probes = self.application_recovery().on_pto_timer_expired();
                if probes.count() > 0 {
                    self.application_pending.ping_requested = true;
                }
            }
            timer::Kind::PathValidation => self.paths.active_mut().on_timeout(now),
            timer::Kind::MtuProbe => self.paths.active_mut().mtu_mut().on_timeout(now),
            timer::Kind::CloseRetry => {
                if let connection::CloseState::Closing { deadline } = self.close_state {
                    let next = self.close_retry.on_packet_received(now, deadline);
                    self.timers.set(timer::Kind::CloseRetry, next);
                }
            }
            timer::Kind::Idle => self.on_local_close(connection::Error::IdleTimerExpired, now),
            timer::Kind::KeepAlive => {}
        }
    }

    fn on_stream_request(&mut self, _id: stream::StreamRequestId, request: ops::Request) {
        let Some(stream_id) = StreamId::nth(self.role, rquic_core::stream::StreamType::Bidirectional, self.next_stream_request) else { return };
        self.next_stream_request += 1;
        if self.streams.get(stream_id).is_none() {
            self.streams.open(stream_id, true, true, self.limits.initial_max_stream_data_bidi_local.as_u64());
        }
        let _ = self.streams.apply_request(stream_id, request);
        self.streams.drain_into(&mut self.application_pending, 1200);
    }

    /// Processes every frame in a datagram's already-unprotected payload.
    /// `packet_number` is checked for duplicates/staleness before any frame
    /// runs (RFC 9000 section 12.3) — a rejected packet has no effect at
    /// all, matching the "once" semantics frame processing otherwise
    /// assumes.
    fn on_datagram(&mut self, payload: &[u8], _ecn: ExplicitCongestionNotification, space: PacketNumberSpace, packet_number: PacketNumber, now: Timestamp) {
        if !self.close_state.is_active() {
            return;
        }

        let mut frames = Vec::new();
        let mut buffer = rquic_codec::DecoderBuffer::new(payload);
        while !buffer.is_empty() {
            let Ok((decoded, rest)) = frame::decode(buffer) else { break };
            buffer = rest;
            frames.push(decoded);
        }

        let ack_eliciting = frames.iter().any(|frame| frame.ack_elicitation().is_ack_eliciting());
        if self.recovery_mut(space).on_packet_received(packet_number, ack_eliciting, now).is_err() {
            return;
        }

        for frame in frames {
            self.on_frame(space, frame, now);
        }

        self.streams.drain_into(&mut self.application_pending, 1200);
    }

    fn on_frame(&mut self, space: PacketNumberSpace, frame: Frame, now: Timestamp) {
        match frame {
            Frame::Padding(_) | Frame::Ping(_) => {}
            Frame::Ack(ack) => {
                let newly_acked: Vec<_> = ack
                    .ack_ranges
                    .iter()
                    .flat_map(|&(smallest, largest)| (smallest.as_u64()..=largest.as_u64()))
                    .filter_map(|value| VarInt::new(value).ok())
                    .map(|value| space.new_packet_number(value))
                    .collect();
                let outcome = self.recovery_mut(space).on_ack_received(&newly_acked, None, core::time::Duration::from_micros(ack.ack_delay.as_u64()), now);
                for info in &outcome.acked {
                    for chunk in &info.stream_chunks {
                        self.streams.on_send_acked(StreamId::from_varint(chunk.stream_id), chunk.offset.as_u64());
                    }
                }
                for info in &outcome.lost {
                    for chunk in &info.stream_chunks {
                        self.streams.on_send_lost(StreamId::from_varint(chunk.stream_id), chunk.offset.as_u64());
                    }
                }
            }
            Frame::Crypto(crypto) => self.crypto.on_crypto_frame(space, crypto.data),
            Frame::Stream(stream_frame) => {
                let stream_id = StreamId::from_varint(stream_frame.stream_id);
                if self.streams.get(stream_id).is_none() {
                    self.streams.open(stream_id, true, true, self.limits.initial_max_stream_data_bidi_remote.as_u64());
                    self.events.push(event::Event::StreamOpened { id: stream_id });
                }
                if self.streams.on_stream_frame(stream_id, stream_frame.offset, stream_frame.data, stream_frame.is_fin).is_ok() {
                    self.data_received += stream_frame.data.len() as u64;
                    self.events.push(event::Event::StreamReadReady { id: stream_id });
                }
            }
            Frame::ResetStream(reset) => {
                let stream_id = StreamId::from_varint(reset.stream_id);
                self.streams.on_reset_stream(stream_id, application::Error::from(reset.application_error_code), reset.final_size);
                self.events.push(event::Event::StreamReadReady { id: stream_id });
            }
            Frame::StopSending(_) => {}
            Frame::MaxData(max_data) => self.max_data_peer = self.max_data_peer.max(max_data.value.as_u64()),
            Frame::MaxStreamData(_) | Frame::MaxStreams(_) | Frame::DataBlocked(_) | Frame::StreamDataBlocked(_) | Frame::StreamsBlocked(_) => {}
            Frame::NewConnectionId(new_id) => {
                if let Ok(id) = rquic_core::connection::ConnectionId::try_from_bytes(new_id.connection_id) {
                    if let Ok(token) = rquic_core::stateless_reset::Token::try_from(&new_id.stateless_reset_token[..]) {
                        if self
                            .cid
                            .on_new_connection_id(id, new_id.sequence_number.as_u64(), new_id.retire_prior_to.as_u64(), token)
                            .is_ok()
                        {
                            self.events.push(event::Event::ConnectionIdIssued { id, sequence_number: new_id.sequence_number.as_u64(), stateless_reset_token: token });
                        }
                    }
                }
            }
            Frame::RetireConnectionId(retire) => {
                if let Some(id) = self.cid.on_retire_connection_id(retire.sequence_number.as_u64()) {
                    self.events.push(event::Event::ConnectionIdRetired { id });
                }
            }
            Frame::PathChallenge(challenge) => self.application_pending.path_response = Some(challenge.data),
            Frame::PathResponse(response) => {
                self.paths.active_mut().on_path_response(now, &response.data);
            }
            Frame::ConnectionClose(close) => {
                let error = connection::Error::from_transport_error(TransportError::new(close.error_code, "", close.frame_type), connection::Initiator::Remote);
                self.error = Some(error);
                let pto = self.application_recovery().pto_period();
                self.close_state = connection::CloseState::Draining { deadline: close::draining_deadline(now, pto) };
                self.events.push(event::Event::Closed { error });
            }
            Frame::HandshakeDone(_) => {
                if self.crypto.handshake_complete() {
                    self.events.push(event::Event::HandshakeComplete);
                }
            }
            Frame::Datagram(datagram_frame) => self.datagrams.on_datagram_received(datagram_frame.data),
            Frame::NewToken(_) | Frame::ReliableResetStream(_) | Frame::AckFrequency(_) | Frame::ImmediateAck(_) | Frame::Timestamp(_) => {}
        }
    }

    /// Advances the TLS handshake and moves any outbound handshake bytes it
    /// produced into each space's own CRYPTO queue (RFC 9001 section 4.1:
    /// `Initial` and `Handshake` carry the earlier flights, `ApplicationData`
    /// only ever carries post-handshake NewSessionTicket-style data).
    pub fn drive_handshake(&mut self) -> Result<bool, TransportError> {
        let done = crypto_manager::drive(&mut self.session, &mut self.crypto)?;
        if done {
            self.events.push(event::Event::HandshakeComplete);
        }
        for space in [PacketNumberSpace::Initial, PacketNumberSpace::Handshake, PacketNumberSpace::ApplicationData] {
            if let Some(bytes) = self.crypto.take_outbound_crypto(space, Some(1200)) {
                let offset = VarInt::ZERO;
                self.pending_mut(space).crypto.push_back((offset, bytes));
            }
        }
        Ok(done)
    }

    /// Builds the next outgoing packet for `space` from whatever is
    /// pending, clamped by the active path's anti-amplification budget.
    /// Any ACK this space owes the peer is attached before the builder
    /// runs, and a real per-space packet number is assigned and recorded
    /// against recovery only once the packet actually goes out.
    pub fn poll_transmit<E: rquic_codec::Encoder>(&mut self, encoder: &mut E, space: PacketNumberSpace, now: Timestamp) -> send::Outcome {
        if let Some(ack) = self.recovery_mut(space).take_pending_ack(now) {
            self.pending_mut(space).ack = Some(ack);
        }

        let stream_data_before: Vec<send::StreamChunk> = if space == PacketNumberSpace::ApplicationData { self.application_pending.stream_data.iter().cloned().collect() } else { Vec::new() };

        let amplification = self.paths.active_mut().amplification_limit();
        let outcome = match space {
            PacketNumberSpace::Initial => send::Builder::build(encoder, &mut self.initial.pending, amplification, None),
            PacketNumberSpace::Handshake => send::Builder::build(encoder, &mut self.handshake.pending, amplification, None),
            PacketNumberSpace::ApplicationData => send::Builder::build(encoder, &mut self.application_pending, amplification, None),
        };
        self.paths.active_mut().amplification_limit().on_bytes_transmitted(outcome.bytes_written as u32);

        if outcome.in_flight {
            let stream_chunks = if space == PacketNumberSpace::ApplicationData {
                let consumed = stream_data_before.len() - self.application_pending.stream_data.len();
                stream_data_before[..consumed]
                    .iter()
                    .map(|chunk| rquic_core::recovery::SentStreamChunk { stream_id: chunk.stream_id, offset: chunk.offset, len: chunk.data.len(), is_fin: chunk.is_fin })
                    .collect()
            } else {
                Vec::new()
            };

            let packet_number = self.recovery_mut(space).next_packet_number();
            self.recovery_mut(space).on_packet_sent(packet_number, outcome.bytes_written, true, outcome.ack_eliciting, stream_chunks, now);
        }

        outcome
    }

    pub fn next_timer_deadline(&self) -> Option<Timestamp> {
        self.timers.next_expiration().map(|(_, at)| at)
    }

    pub fn events_mut(&mut self) -> &mut event::Queue {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_core::crypto::tls::testing::Session as TestSession;
    use rquic_core::recovery::cubic::Cubic;

    fn addr(port: u16) -> SocketAddress {
        SocketAddress::new(std::net::SocketAddr::from(([127, 0, 0, 1], port)))
    }

    struct NoopWaker;
    impl std::task::Wake for NoopWaker {
        fn wake(self: std::sync::Arc<Self>) {}
    }

    fn connection() -> Connection<TestSession> {
        let waker = std::task::Waker::from(std::sync::Arc::new(NoopWaker));
        Connection::new(
            rquic_core::endpoint::Type::Server,
            TestSession,
            waker,
            Limits::default(),
            addr(4433),
            addr(5000),
            rquic_core::path::MaxMtu::default(),
            Box::new(Cubic::new(rquic_core::path::MINIMUM_MTU)),
        )
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_duration(core::time::Duration::from_secs(secs))
    }

    #[test]
    fn shutdown_moves_the_connection_into_closing() {
        let mut connection = connection();
        connection.enqueue(Operation::Shutdown { error: connection::Error::Closed { initiator: connection::Initiator::Local } });
        connection.drain_operations(t(0));
        assert!(!connection.close_state().is_active());
        assert!(connection.application_pending.connection_close.is_some());
    }

    #[test]
    fn free_operation_releases_the_handle_reference_and_finishes() {
        let mut connection = connection();
        connection.enqueue(Operation::Free);
        assert_eq!(connection.drain_operations(t(0)), DrainOutcome::Finished);
        assert_eq!(connection.refs().total(), 0);
    }

    #[test]
    fn an_empty_operation_queue_parks() {
        let mut connection = connection();
        assert_eq!(connection.drain_operations(t(0)), DrainOutcome::Park);
    }

    #[test]
    fn driving_the_handshake_against_the_test_session_completes_immediately() {
        let mut connection = connection();
        let done = connection.drive_handshake().unwrap();
        assert!(done);
        assert_eq!(connection.events_mut().pop(), Some(event::Event::HandshakeComplete));
    }

    fn pn(space: PacketNumberSpace, value: u64) -> PacketNumber {
        space.new_packet_number(VarInt::new(value).unwrap())
    }

    fn frame_bytes<F: rquic_codec::EncoderValue>(frame: &F) -> Vec<u8> {
        let mut bytes = Vec::new();
        frame.encode(&mut bytes);
        bytes
    }

    #[test]
    fn each_outbound_packet_gets_a_distinct_increasing_packet_number() {
        let mut connection = connection();
        let mut request = rquic_core::stream::ops::Request::default();
        request.send(vec![vec![1, 2, 3]]);
        connection.enqueue(Operation::StreamRequest { id: stream::StreamRequestId(0), request });
        connection.drain_operations(t(0));

        let mut out = [0u8; 256];
        let mut encoder = rquic_codec::EncoderBuffer::new(&mut out);
        let outcome = connection.poll_transmit(&mut encoder, PacketNumberSpace::ApplicationData, t(0));
        assert!(outcome.in_flight);
        assert_eq!(connection.application_recovery().bytes_in_flight() as usize, outcome.bytes_written);

        let first = connection.recovery_mut(PacketNumberSpace::ApplicationData).next_packet_number();
        assert_eq!(first.as_u64(), 1);
    }

    #[test]
    fn a_duplicate_datagram_is_rejected_and_does_not_reprocess_its_frames() {
        let mut connection = connection();
        let stream_id = StreamId::initial(rquic_core::endpoint::Type::Client, rquic_core::stream::StreamType::Bidirectional);
        let frame = rquic_core::frame::Stream { stream_id: stream_id.as_varint(), offset: VarInt::ZERO, data: b"hi", is_fin: false };
        let payload = frame_bytes(&frame);

        connection.enqueue(Operation::DatagramReceived {
            payload: payload.clone(),
            ecn: ExplicitCongestionNotification::NotEct,
            space: PacketNumberSpace::ApplicationData,
            packet_number: pn(PacketNumberSpace::ApplicationData, 1),
        });
        connection.drain_operations(t(0));
        assert_eq!(connection.events_mut().pop(), Some(event::Event::StreamOpened { id: stream_id }));
        assert_eq!(connection.events_mut().pop(), Some(event::Event::StreamReadReady { id: stream_id }));

        connection.enqueue(Operation::DatagramReceived { payload, ecn: ExplicitCongestionNotification::NotEct, space: PacketNumberSpace::ApplicationData, packet_number: pn(PacketNumberSpace::ApplicationData, 1) });
        connection.drain_operations(t(1));
        assert!(connection.events_mut().pop().is_none());
    }

    #[test]
    fn a_new_connection_id_frame_surfaces_as_an_event() {
        let mut connection = connection();
        let frame = rquic_core::frame::NewConnectionId { sequence_number: VarInt::ZERO, retire_prior_to: VarInt::ZERO, connection_id: &[1, 2, 3, 4], stateless_reset_token: &[0u8; 16] };
        connection.enqueue(Operation::DatagramReceived { payload: frame_bytes(&frame), ecn: ExplicitCongestionNotification::NotEct, space: PacketNumberSpace::ApplicationData, packet_number: pn(PacketNumberSpace::ApplicationData, 1) });
        connection.drain_operations(t(0));
        assert!(matches!(connection.events_mut().pop(), Some(event::Event::ConnectionIdIssued { .. })));
    }
}
