// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The seam between `rquic-transport` and a TLS 1.3 provider (RFC 9001).
//! Everything a specific TLS library does internally — record layer
//! framing, certificate validation, ClientHello parsing — lives behind
//! [`Endpoint`]/[`Session`] and is out of scope here.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[derive(Clone, Debug)]
pub struct ApplicationParameters<'a> {
    pub transport_parameters: &'a [u8],
}

#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum TlsExportError {
    Failure,
}

/// RFC 5705/RFC 8446 section 7.5: a TLS key exporter, used to derive
/// connection-bound values for the application layer.
pub trait TlsSession {
    fn tls_exporter(&self, label: &[u8], context: &[u8], output: &mut [u8]) -> Result<(), TlsExportError>;

    fn cipher_suite(&self) -> CipherSuite;
}

/// Callbacks the TLS provider invokes as the handshake produces keys and
/// reaches milestones. `rquic-transport`'s crypto manager implements this.
#[cfg(feature = "alloc")]
pub trait Context<Crypto: super::key::CryptoSuite> {
    fn on_handshake_keys(&mut self, key: Crypto::HandshakeKey, header_key: Crypto::HandshakeHeaderKey) -> Result<(), crate::transport::TransportError>;

    fn on_zero_rtt_keys(&mut self, key: Crypto::ZeroRttKey, header_key: Crypto::ZeroRttHeaderKey, application_parameters: ApplicationParameters) -> Result<(), crate::transport::TransportError>;

    fn on_one_rtt_keys(&mut self, key: Crypto::OneRttKey, header_key: Crypto::OneRttHeaderKey, application_parameters: ApplicationParameters) -> Result<(), crate::transport::TransportError>;

    fn on_server_name(&mut self, server_name: crate::application::ServerName) -> Result<(), crate::transport::TransportError>;

    fn on_application_protocol(&mut self, application_protocol: Vec<u8>) -> Result<(), crate::transport::TransportError>;

    fn on_handshake_complete(&mut self) -> Result<(), crate::transport::TransportError>;

    fn on_tls_exporter_ready(&mut self, session: &impl TlsSession) -> Result<(), crate::transport::TransportError>;

    /// Hands the provider cryptographic handshake bytes received in the
    /// named packet space; returns `None` once nothing further is pending.
    fn receive_initial(&mut self, max_len: Option<usize>) -> Option<Vec<u8>>;
    fn receive_handshake(&mut self, max_len: Option<usize>) -> Option<Vec<u8>>;
    fn receive_application(&mut self, max_len: Option<usize>) -> Option<Vec<u8>>;

    fn can_send_initial(&self) -> bool;
    fn send_initial(&mut self, transmission: Vec<u8>);

    fn can_send_handshake(&self) -> bool;
    fn send_handshake(&mut self, transmission: Vec<u8>);

    fn can_send_application(&self) -> bool;
    fn send_application(&mut self, transmission: Vec<u8>);

    fn waker(&self) -> &core::task::Waker;
}

#[cfg(feature = "alloc")]
pub trait Endpoint: Sized {
    type Session: Session;

    fn new_server_session(&mut self, transport_parameters: &[u8]) -> Self::Session;

    fn new_client_session(&mut self, transport_parameters: &[u8], server_name: crate::application::ServerName) -> Self::Session;

    /// The longest AEAD tag any cipher suite this provider might negotiate
    /// can append, used to size datagram padding ahead of negotiation.
    fn max_tag_length(&self) -> usize;
}

#[cfg(feature = "alloc")]
pub trait Session: super::key::CryptoSuite + Sized {
    fn poll<C: Context<Self>>(&mut self, context: &mut C) -> core::task::Poll<Result<(), crate::transport::TransportError>>;

    fn process_post_handshake_message<C: Context<Self>>(&mut self, context: &mut C) -> Result<(), crate::transport::TransportError>;

    /// Whether session ticket state from this session should be discarded
    /// rather than offered for resumption.
    fn discard_session(&self, received_ticket: bool) -> bool;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum CipherSuite {
    TLS_AES_128_GCM_SHA256,
    TLS_AES_256_GCM_SHA384,
    TLS_CHACHA20_POLY1305_SHA256,
    #[default]
    Unknown,
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use crate::crypto::key::testing as key_testing;

    #[derive(Debug, Default)]
    pub struct Endpoint;

    impl super::Endpoint for Endpoint {
        type Session = Session;

        fn new_server_session(&mut self, _transport_parameters: &[u8]) -> Self::Session {
            Session::default()
        }

        fn new_client_session(&mut self, _transport_parameters: &[u8], _server_name: crate::application::ServerName) -> Self::Session {
            Session::default()
        }

        fn max_tag_length(&self) -> usize {
            16
        }
    }

    #[derive(Debug, Default)]
    pub struct Session;

    impl super::super::key::CryptoSuite for Session {
        type HandshakeKey = key_testing::Key;
        type HandshakeHeaderKey = key_testing::HeaderKey;
        type InitialKey = key_testing::Key;
        type InitialHeaderKey = key_testing::HeaderKey;
        type OneRttKey = key_testing::Key;
        type OneRttHeaderKey = key_testing::HeaderKey;
        type ZeroRttKey = key_testing::Key;
        type ZeroRttHeaderKey = key_testing::HeaderKey;
        type RetryKey = key_testing::Key;
    }

    impl super::Session for Session {
        fn poll<C: Context<Self>>(&mut self, _context: &mut C) -> core::task::Poll<Result<(), crate::transport::TransportError>> {
            core::task::Poll::Ready(Ok(()))
        }

        fn process_post_handshake_message<C: Context<Self>>(&mut self, _context: &mut C) -> Result<(), crate::transport::TransportError> {
            Ok(())
        }

        fn discard_session(&self, _received_ticket: bool) -> bool {
            true
        }
    }
}
