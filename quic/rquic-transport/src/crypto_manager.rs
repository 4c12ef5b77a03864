//! Owns one handshake byte stream per packet number space and the
//! negotiated keys, and implements `rquic_core::crypto::tls::Context` so a
//! TLS provider can drive the handshake without knowing anything about
//! connections, streams, or the wire (RFC 9001 section 4).

use std::collections::VecDeque;
use std::task::{Poll, Waker};

use rquic_core::{
    application::ServerName,
    crypto::{
        key::CryptoSuite,
        tls::{ApplicationParameters, CipherSuite, Context, TlsExportError, TlsSession},
    },
    transport::TransportError,
};

/// The handshake-bytes mailbox for one packet number space: bytes the
/// local TLS session produced that still need to go out in CRYPTO frames,
/// and bytes received in CRYPTO frames not yet handed to the session.
#[derive(Debug, Default)]
struct CryptoStream {
    outbound: VecDeque<u8>,
    inbound: VecDeque<u8>,
}

impl CryptoStream {
    fn send(&mut self, bytes: Vec<u8>) {
        self.outbound.extend(bytes);
    }

    fn can_send(&self) -> bool {
        !self.outbound.is_empty()
    }

    fn take_outbound(&mut self, max_len: Option<usize>) -> Option<Vec<u8>> {
        if self.outbound.is_empty() {
            return None;
        }
        let len = max_len.unwrap_or(self.outbound.len()).min(self.outbound.len());
        Some(self.outbound.drain(..len).collect())
    }

    /// CRYPTO frames may arrive out of order relative to their stream
    /// offset, but this crate only ever reads the front, so out-of-order
    /// bytes are the caller's responsibility to reorder before calling.
    fn on_received(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
    }

    fn take_inbound(&mut self, max_len: Option<usize>) -> Option<Vec<u8>> {
        if self.inbound.is_empty() {
            return None;
        }
        let len = max_len.unwrap_or(self.inbound.len()).min(self.inbound.len());
        Some(self.inbound.drain(..len).collect())
    }
}

/// Keys negotiated for one encryption level, held generically over the
/// provider's concrete `CryptoSuite` so this struct is provider-agnostic.
struct Keys<K, H> {
    key: Option<K>,
    header_key: Option<H>,
}

impl<K, H> Default for Keys<K, H> {
    fn default() -> Self {
        Self { key: None, header_key: None }
    }
}

impl<K, H> std::fmt::Debug for Keys<K, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys").field("key", &self.key.is_some()).field("header_key", &self.header_key.is_some()).finish()
    }
}

pub struct Manager<Crypto: CryptoSuite> {
    initial: CryptoStream,
    handshake: CryptoStream,
    application: CryptoStream,
    handshake_keys: Keys<Crypto::HandshakeKey, Crypto::HandshakeHeaderKey>,
    zero_rtt_keys: Keys<Crypto::ZeroRttKey, Crypto::ZeroRttHeaderKey>,
    one_rtt_keys: Keys<Crypto::OneRttKey, Crypto::OneRttHeaderKey>,
    handshake_complete: bool,
    server_name: Option<ServerName>,
    application_protocol: Option<Vec<u8>>,
    waker: Waker,
}

impl<Crypto: CryptoSuite> std::fmt::Debug for Manager<Crypto> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("initial", &self.initial)
            .field("handshake", &self.handshake)
            .field("application", &self.application)
            .field("handshake_keys", &self.handshake_keys)
            .field("zero_rtt_keys", &self.zero_rtt_keys)
            .field("one_rtt_keys", &self.one_rtt_keys)
            .field("handshake_complete", &self.handshake_complete)
            .field("server_name", &self.server_name)
            .field("application_protocol", &self.application_protocol)
            .field("waker", &self.waker)
            .finish()
    }
}

impl<Crypto: CryptoSuite> Manager<Crypto> {
    pub fn new(waker: Waker) -> Self {
        Self {
            initial: CryptoStream::default(),
            handshake: CryptoStream::default(),
            application: CryptoStream::default(),
            handshake_keys: Keys::default(),
            zero_rtt_keys: Keys::default(),
            one_rtt_keys: Keys::default(),
            handshake_complete: false,
            server_name: None,
            application_protocol: None,
            waker,
        }
    }

    pub fn on_crypto_frame(&mut self, space: rquic_core::packet::PacketNumberSpace, data: &[u8]) {
        let stream = self.stream_mut(space);
        stream.on_received(data);
    }

    /// Drains this space's outbound handshake bytes (if any) as a single
    /// CRYPTO frame payload starting at `offset` tracking, for the
    /// connection to enqueue on the packet builder.
    pub fn take_outbound_crypto(&mut self, space: rquic_core::packet::PacketNumberSpace, max_len: Option<usize>) -> Option<Vec<u8>> {
        self.stream_mut(space).take_outbound(max_len)
    }

    fn stream_mut(&mut self, space: rquic_core::packet::PacketNumberSpace) -> &mut CryptoStream {
        match space {
            rquic_core::packet::PacketNumberSpace::Initial => &mut self.initial,
            rquic_core::packet::PacketNumberSpace::Handshake => &mut self.handshake,
            rquic_core::packet::PacketNumberSpace::ApplicationData => &mut self.application,
        }
    }

    pub fn handshake_complete(&self) -> bool {
        self.handshake_complete
    }

    pub fn one_rtt_key(&self) -> Option<&Crypto::OneRttKey> {
        self.one_rtt_keys.key.as_ref()
    }

    pub fn one_rtt_header_key(&self) -> Option<&Crypto::OneRttHeaderKey> {
        self.one_rtt_keys.header_key.as_ref()
    }

    pub fn handshake_key(&self) -> Option<&Crypto::HandshakeKey> {
        self.handshake_keys.key.as_ref()
    }

    /// RFC 9001 section 6: ratchets one-RTT keys forward for a key update.
    /// Returns the new key if one-RTT keys were already established.
    pub fn initiate_key_update(&mut self) -> Option<Crypto::OneRttKey>
    where
        Crypto::OneRttKey: rquic_core::crypto::key::OneRttKey,
    {
        let next = self.one_rtt_keys.key.as_ref().map(rquic_core::crypto::key::OneRttKey::derive_next_key)?;
        let next_for_return = self.one_rtt_keys.key.as_ref().map(rquic_core::crypto::key::OneRttKey::derive_next_key)?;
        self.one_rtt_keys.key = Some(next);
        Some(next_for_return)
    }
}

impl<Crypto: CryptoSuite> Context<Crypto> for Manager<Crypto> {
    fn on_handshake_keys(&mut self, key: Crypto::HandshakeKey, header_key: Crypto::HandshakeHeaderKey) -> Result<(), TransportError> {
        self.handshake_keys = Keys { key: Some(key), header_key: Some(header_key) };
        Ok(())
    }

    fn on_zero_rtt_keys(&mut self, key: Crypto::ZeroRttKey, header_key: Crypto::ZeroRttHeaderKey, _application_parameters: ApplicationParameters) -> Result<(), TransportError> {
        self.zero_rtt_keys = Keys { key: Some(key), header_key: Some(header_key) };
        Ok(())
    }

    fn on_one_rtt_keys(&mut self, key: Crypto::OneRttKey, header_key: Crypto::OneRttHeaderKey, _application_parameters: ApplicationParameters) -> Result<(), TransportError> {
        self.one_rtt_keys = Keys { key: Some(key), header_key: Some(header_key) };
        Ok(())
    }

    fn on_server_name(&mut self, server_name: ServerName) -> Result<(), TransportError> {
        self.server_name = Some(server_name);
        Ok(())
    }

    fn on_application_protocol(&mut self, application_protocol: Vec<u8>) -> Result<(), TransportError> {
        self.application_protocol = Some(application_protocol);
        Ok(())
    }

    fn on_handshake_complete(&mut self) -> Result<(), TransportError> {
        self.handshake_complete = true;
        Ok(())
    }

    fn on_tls_exporter_ready(&mut self, _session: &impl TlsSession) -> Result<(), TransportError> {
        Ok(())
    }

    fn receive_initial(&mut self, max_len: Option<usize>) -> Option<Vec<u8>> {
        self.initial.take_inbound(max_len)
    }

    fn receive_handshake(&mut self, max_len: Option<usize>) -> Option<Vec<u8>> {
        self.handshake.take_inbound(max_len)
    }

    fn receive_application(&mut self, max_len: Option<usize>) -> Option<Vec<u8>> {
        self.application.take_inbound(max_len)
    }

    fn can_send_initial(&self) -> bool {
        self.initial.can_send()
    }

    fn send_initial(&mut self, transmission: Vec<u8>) {
        self.initial.send(transmission);
    }

    fn can_send_handshake(&self) -> bool {
        self.handshake.can_send()
    }

    fn send_handshake(&mut self, transmission: Vec<u8>) {
        self.handshake.send(transmission);
    }

    fn can_send_application(&self) -> bool {
        self.application.can_send()
    }

    fn send_application(&mut self, transmission: Vec<u8>) {
        self.application.send(transmission);
    }

    fn waker(&self) -> &Waker {
        &self.waker
    }
}

/// Drives `session.poll` until it either completes or stops making
/// progress. Any outbound handshake bytes the session produced land in
/// `manager`'s per-space streams; the connection moves them into the
/// packet builder's CRYPTO queue separately via `take_outbound`-backed
/// accessors, keeping this function free of any packet-building concern.
pub fn drive<S: rquic_core::crypto::tls::Session>(session: &mut S, manager: &mut Manager<S>) -> Result<bool, TransportError> {
    match session.poll(manager) {
        Poll::Ready(Ok(())) => Ok(true),
        Poll::Ready(Err(error)) => Err(error),
        Poll::Pending => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquic_core::crypto::tls::testing::Session as TestSession;
    use std::task::Wake;

    struct NoopWaker;
    impl Wake for NoopWaker {
        fn wake(self: std::sync::Arc<Self>) {}
    }

    fn waker() -> Waker {
        Waker::from(std::sync::Arc::new(NoopWaker))
    }

    #[test]
    fn handshake_completes_against_the_test_session() {
        let mut manager: Manager<TestSession> = Manager::new(waker());
        let mut session = TestSession;
        let done = drive(&mut session, &mut manager).unwrap();
        assert!(done);
    }

    #[test]
    fn received_crypto_bytes_are_queued_for_the_session_to_consume() {
        let mut manager: Manager<TestSession> = Manager::new(waker());
        manager.on_crypto_frame(rquic_core::packet::PacketNumberSpace::Initial, &[1, 2, 3]);
        assert_eq!(manager.receive_initial(Some(2)), Some(vec![1, 2]));
        assert_eq!(manager.receive_initial(None), Some(vec![3]));
        assert_eq!(manager.receive_initial(None), None);
    }
}
