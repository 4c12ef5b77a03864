//! Per-connection stream table: drives `rquic_core::stream::state`'s
//! send/recv machines with actual byte buffers, turns application requests
//! (`rquic_core::stream::ops::Request`) into buffer mutations, and feeds
//! the packet builder's [`crate::send::Pending`] from whatever is ready to
//! go out.
//!
//! Received data is assumed in-order within this crate's scope — out-of-
//! order STREAM frames are buffered by offset in a small per-stream map
//! rather than a full interval-tree reassembly structure.

use rquic_core::{
    application,
    stream::{
        ops::{self, Request, Response},
        state::{RecvEvent, RecvState, SendEvent, SendState},
        Error as StreamError, StreamId,
    },
    varint::VarInt,
};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Correlates an `Operation::StreamRequest` enqueued from the application
/// side with the `ops::Response` the connection eventually produces for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StreamRequestId(pub u64);

#[derive(Debug)]
pub struct Stream {
    pub id: StreamId,
    send: Option<SendHalf>,
    recv: Option<RecvHalf>,
}

#[derive(Debug, Default)]
struct SendHalf {
    state: SendState,
    buffer: VecDeque<u8>,
    next_offset: u64,
    /// Bytes already handed to the packet builder but not yet acknowledged,
    /// keyed by offset; moved to `retransmit` on loss, dropped on ack.
    in_flight: BTreeMap<u64, (Vec<u8>, bool)>,
    /// Lost chunks waiting to be resent, checked ahead of `buffer` so lost
    /// data doesn't wait behind data that was never sent at all.
    retransmit: VecDeque<(u64, Vec<u8>, bool)>,
    peer_max_stream_data: u64,
}

#[derive(Debug, Default)]
struct RecvHalf {
    state: RecvState,
    /// Contiguous data available to the application.
    received: Vec<u8>,
    consumed: usize,
    /// Out-of-order chunks keyed by offset, folded into `received` once contiguous.
    reordered: BTreeMap<u64, Vec<u8>>,
    final_size: Option<u64>,
    max_stream_data: u64,
}

impl Stream {
    fn new(id: StreamId, can_send: bool, can_recv: bool, initial_max_stream_data: u64) -> Self {
        Self {
            id,
            send: can_send.then(|| SendHalf { state: SendState::Ready, peer_max_stream_data: initial_max_stream_data, ..Default::default() }),
            recv: can_recv.then(|| RecvHalf { state: RecvState::Recv, max_stream_data: initial_max_stream_data, ..Default::default() }),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.send.as_ref().map_or(true, |s| s.state.is_terminal()) && self.recv.as_ref().map_or(true, |r| r.state.is_terminal())
    }

    fn apply_request(&mut self, request: Request) -> Response {
        let mut response = Response::default();
        if let Some(tx) = request.tx {
            response.tx = Some(self.apply_tx(tx));
        }
        if let Some(rx) = request.rx {
            response.rx = Some(self.apply_rx(rx));
        }
        response
    }

    fn apply_tx(&mut self, request: ops::tx::Request) -> ops::tx::Response {
        let Some(send) = self.send.as_mut() else {
            return ops::tx::Response { status: ops::Status::Reset(StreamError::NonWritable), ..Default::default() };
        };

        if let Some(error) = request.reset {
            let _ = error;
            send.state = send.state.transition(SendEvent::ResetQueued).unwrap_or(send.state);
            return ops::tx::Response { status: ops::Status::Resetting, ..Default::default() };
        }

        if let Some(chunks) = request.chunks {
            for chunk in &chunks {
                if send.buffer.is_empty() && send.state == SendState::Ready {
                    send.state = send.state.transition(SendEvent::FirstByteQueued).unwrap_or(send.state);
                }
                send.buffer.extend(chunk.iter().copied());
            }
        }

        if request.finish {
            send.state = send.state.transition(SendEvent::FinQueued).unwrap_or(send.state);
        }

        let status = match send.state {
            SendState::DataRecvd => ops::Status::Finished,
            SendState::DataSent if request.finish => ops::Status::Finishing,
            SendState::ResetSent | SendState::ResetRecvd => ops::Status::Resetting,
            _ => ops::Status::Open,
        };

        ops::tx::Response {
            bytes: ops::Bytes { consumed: send.buffer.len(), available: send.peer_max_stream_data.saturating_sub(send.next_offset) as usize },
            status,
            ..Default::default()
        }
    }

    fn apply_rx(&mut self, request: ops::rx::Request) -> ops::rx::Response {
        let Some(recv) = self.recv.as_mut() else {
            return ops::rx::Response { status: ops::Status::Reset(StreamError::NonReadable), ..Default::default() };
        };

        if let Some(error) = request.stop_sending {
            let _ = error;
            let _ = recv.state.transition(RecvEvent::StopSendingQueued);
        }

        let max_chunks = request.max_chunks.unwrap_or(usize::MAX);
        let take = max_chunks.min(recv.received.len() - recv.consumed);
        recv.consumed += take;

        let status = match recv.state {
            RecvState::DataRead => ops::Status::Finished,
            RecvState::ResetRecvd | RecvState::ResetRead => ops::Status::Resetting,
            _ => ops::Status::Open,
        };

        let fin = recv.final_size.is_some_and(|size| recv.consumed as u64 == size);
        if fin {
            if let Some(next) = recv.state.transition(RecvEvent::AllDataRead) {
                recv.state = next;
            }
        }

        ops::rx::Response {
            bytes: ops::Bytes { consumed: recv.consumed, available: recv.received.len() - recv.consumed },
            status,
            fin,
            ..Default::default()
        }
    }

    /// Folds a received `STREAM` frame's payload in, advancing `RecvState`
    /// and collapsing any now-contiguous reordered chunks.
    fn on_stream_data(&mut self, offset: u64, data: &[u8], is_fin: bool) -> Result<(), StreamError> {
        let Some(recv) = self.recv.as_mut() else { return Err(StreamError::NonReadable) };

        if is_fin {
            let final_size = offset + data.len() as u64;
            if recv.final_size.is_some_and(|existing| existing != final_size) {
                return Err(StreamError::MaxStreamDataSizeExceeded);
            }
            recv.final_size = Some(final_size);
            recv.state = recv.state.transition(RecvEvent::FinReceived).unwrap_or(recv.state);
        }

        if offset + data.len() as u64 > recv.max_stream_data {
            return Err(StreamError::MaxStreamDataSizeExceeded);
        }

        let contiguous_offset = recv.consumed as u64 + recv.received.len() as u64;
        if offset == contiguous_offset {
            recv.received.extend_from_slice(data);
            while let Some(next) = recv.reordered.remove(&(recv.consumed as u64 + recv.received.len() as u64)) {
                recv.received.extend_from_slice(&next);
            }
        } else if offset > contiguous_offset {
            recv.reordered.insert(offset, data.to_vec());
        }

        if let Some(final_size) = recv.final_size {
            if recv.consumed as u64 + recv.received.len() as u64 == final_size {
                recv.state = recv.state.transition(RecvEvent::AllDataReceived).unwrap_or(recv.state);
            }
        }

        Ok(())
    }

    fn on_reset(&mut self, error: application::Error, final_size: u64) {
        let _ = error;
        if let Some(recv) = self.recv.as_mut() {
            recv.final_size = Some(final_size);
            recv.state = recv.state.transition(RecvEvent::ResetReceived).unwrap_or(recv.state);
        }
    }

    /// Pulls the next chunk to send: a lost retransmission first if one is
    /// queued, otherwise up to `max_len` fresh unsent bytes. Either way the
    /// chunk is recorded as in-flight so a later ack or loss can find it
    /// again by offset. `FIN` rides on the last fresh chunk once the send
    /// side has been told to finish and the buffer drains empty.
    fn take_send_chunk(&mut self, max_len: usize) -> Option<(u64, Vec<u8>, bool)> {
        let send = self.send.as_mut()?;

        if let Some((offset, data, is_fin)) = send.retransmit.pop_front() {
            send.in_flight.insert(offset, (data.clone(), is_fin));
            return Some((offset, data, is_fin));
        }

        let available = send.peer_max_stream_data.saturating_sub(send.next_offset) as usize;
        let len = max_len.min(available).min(send.buffer.len());
        let finishing = matches!(send.state, SendState::DataSent);
        if len == 0 {
            return None;
        }

        let offset = send.next_offset;
        let data: Vec<u8> = send.buffer.drain(..len).collect();
        send.next_offset += len as u64;

        let is_fin = finishing && send.buffer.is_empty();
        send.in_flight.insert(offset, (data.clone(), is_fin));
        Some((offset, data, is_fin))
    }

    fn on_send_acked(&mut self, offset: u64) {
        if let Some(send) = self.send.as_mut() {
            if send.in_flight.remove(&offset).is_some() && send.in_flight.is_empty() && send.buffer.is_empty() && send.retransmit.is_empty() {
                send.state = send.state.transition(SendEvent::AllDataAcknowledged).unwrap_or(send.state);
            }
        }
    }

    /// Moves a lost chunk back onto the retransmit queue so it's resent
    /// ahead of any unsent data (RFC 9000 section 13.3).
    fn on_send_lost(&mut self, offset: u64) {
        if let Some(send) = self.send.as_mut() {
            if let Some((data, is_fin)) = send.in_flight.remove(&offset) {
                send.retransmit.push_back((offset, data, is_fin));
            }
        }
    }
}

/// The connection-wide stream table.
#[derive(Debug, Default)]
pub struct Manager {
    streams: HashMap<StreamId, Stream>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: StreamId, can_send: bool, can_recv: bool, initial_max_stream_data: u64) -> &mut Stream {
        self.streams.entry(id).or_insert_with(|| Stream::new(id, can_send, can_recv, initial_max_stream_data))
    }

    pub fn get(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id)
    }

    pub fn apply_request(&mut self, id: StreamId, request: Request) -> Result<Response, StreamError> {
        self.streams.get_mut(&id).map(|stream| stream.apply_request(request)).ok_or(StreamError::InvalidStream)
    }

    pub fn on_stream_frame(&mut self, id: StreamId, offset: VarInt, data: &[u8], is_fin: bool) -> Result<(), StreamError> {
        let stream = self.streams.get_mut(&id).ok_or(StreamError::InvalidStream)?;
        stream.on_stream_data(offset.as_u64(), data, is_fin)
    }

    pub fn on_reset_stream(&mut self, id: StreamId, error: application::Error, final_size: VarInt) {
        if let Some(stream) = self.streams.get_mut(&id) {
            stream.on_reset(error, final_size.as_u64());
        }
    }

    pub fn on_send_acked(&mut self, id: StreamId, offset: u64) {
        if let Some(stream) = self.streams.get_mut(&id) {
            stream.on_send_acked(offset);
        }
    }

    pub fn on_send_lost(&mut self, id: StreamId, offset: u64) {
        if let Some(stream) = self.streams.get_mut(&id) {
            stream.on_send_lost(offset);
        }
    }

    /// Pulls ready-to-send data from every stream into `pending`, bounded
    /// by `per_stream_cap` bytes per stream this call.
    pub fn drain_into(&mut self, pending: &mut crate::send::Pending, per_stream_cap: usize) {
        for stream in self.streams.values_mut() {
            if let Some((offset, data, is_fin)) = stream.take_send_chunk(per_stream_cap) {
                if data.is_empty() && !is_fin {
                    continue;
                }
                pending.stream_data.push_back(crate::send::StreamChunk {
                    stream_id: stream.id.as_varint(),
                    offset: VarInt::new(offset).unwrap_or(VarInt::ZERO),
                    data,
                    is_fin,
                });
            }
        }
    }

    pub fn retain_unfinished(&mut self) {
        self.streams.retain(|_, stream| !stream.is_finished());
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_core::endpoint;

    fn stream_id() -> StreamId {
        StreamId::initial(endpoint::Type::Client, rquic_core::stream::StreamType::Bidirectional)
    }

    #[test]
    fn sending_data_then_finishing_reaches_data_sent() {
        let mut manager = Manager::new();
        manager.open(stream_id(), true, true, 1_000_000);

        let mut request = Request::default();
        request.send(vec![vec![1, 2, 3]]).finish();
        let response = manager.apply_request(stream_id(), request).unwrap();
        assert_eq!(response.tx.unwrap().status, ops::Status::Finishing);
    }

    #[test]
    fn drained_chunks_are_removed_from_the_send_buffer() {
        let mut manager = Manager::new();
        manager.open(stream_id(), true, true, 1_000_000);
        let mut request = Request::default();
        request.send(vec![vec![1, 2, 3, 4]]);
        manager.apply_request(stream_id(), request).unwrap();

        let mut pending = crate::send::Pending::default();
        manager.drain_into(&mut pending, 2);
        assert_eq!(pending.stream_data.len(), 1);
        assert_eq!(pending.stream_data[0].data, vec![1, 2]);
    }

    #[test]
    fn a_lost_chunk_is_resent_ahead_of_unsent_data() {
        let mut manager = Manager::new();
        manager.open(stream_id(), true, true, 1_000_000);
        let mut request = Request::default();
        request.send(vec![vec![1, 2, 3, 4]]);
        manager.apply_request(stream_id(), request).unwrap();

        let mut pending = crate::send::Pending::default();
        manager.drain_into(&mut pending, 2);
        assert_eq!(pending.stream_data[0].data, vec![1, 2]);

        manager.on_send_lost(stream_id(), 0);

        let mut pending = crate::send::Pending::default();
        manager.drain_into(&mut pending, 2);
        assert_eq!(pending.stream_data[0].data, vec![1, 2]);
        assert_eq!(pending.stream_data[0].offset, VarInt::ZERO);
    }

    #[test]
    fn an_acked_chunk_with_no_outstanding_data_reaches_data_recvd() {
        let mut manager = Manager::new();
        manager.open(stream_id(), true, true, 1_000_000);
        let mut request = Request::default();
        request.send(vec![vec![1, 2, 3]]).finish();
        manager.apply_request(stream_id(), request).unwrap();

        let mut pending = crate::send::Pending::default();
        manager.drain_into(&mut pending, 16);
        assert_eq!(pending.stream_data.len(), 1);

        manager.on_send_acked(stream_id(), 0);
        let stream = manager.get(stream_id()).unwrap();
        assert!(stream.send.as_ref().unwrap().state.is_terminal());
    }

    #[test]
    fn out_of_order_stream_frames_reassemble_once_contiguous() {
        let mut manager = Manager::new();
        manager.open(stream_id(), true, true, 1_000_000);
        manager.on_stream_frame(stream_id(), VarInt::new(3).unwrap(), b"def", false).unwrap();
        manager.on_stream_frame(stream_id(), VarInt::ZERO, b"abc", false).unwrap();

        let stream = manager.get(stream_id()).unwrap();
        assert_eq!(stream.recv.as_ref().unwrap().received, b"abcdef");
    }
}
