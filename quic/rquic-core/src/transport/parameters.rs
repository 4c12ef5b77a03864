// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Transport parameters, exchanged in the TLS handshake (RFC 9000 section
//! 7.4 / RFC 9001 section 8.2) before either peer may rely on anything
//! beyond the defaults this module encodes.

use crate::varint::VarInt;
use core::time::Duration;

/// The parameters one endpoint advertises to its peer. Both client and
/// server fill in the fields relevant to their role and leave the rest at
/// the RFC 9000 section 18.2 default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportParameters {
    /// Server-only; echoed by the client's Initial DCID in the absence of
    /// a Retry.
    pub original_destination_connection_id: Option<[u8; 20]>,
    pub original_destination_connection_id_len: u8,
    pub max_idle_timeout: Duration,
    pub stateless_reset_token: Option<[u8; 16]>,
    pub max_udp_payload_size: VarInt,
    pub initial_max_data: VarInt,
    pub initial_max_stream_data_bidi_local: VarInt,
    pub initial_max_stream_data_bidi_remote: VarInt,
    pub initial_max_stream_data_uni: VarInt,
    pub initial_max_streams_bidi: VarInt,
    pub initial_max_streams_uni: VarInt,
    pub ack_delay_exponent: VarInt,
    pub max_ack_delay: Duration,
    pub disable_active_migration: bool,
    pub active_connection_id_limit: VarInt,
    pub initial_source_connection_id: Option<[u8; 20]>,
    pub initial_source_connection_id_len: u8,
    /// Server-only, sent only after a Retry.
    pub retry_source_connection_id: Option<[u8; 20]>,
    pub retry_source_connection_id_len: u8,

    // RFC 9221 and related extensions.
    pub max_datagram_frame_size: Option<VarInt>,
    /// draft-ietf-quic-ack-frequency
    pub min_ack_delay: Option<Duration>,
    /// draft-ietf-quic-bit-grease
    pub grease_quic_bit: bool,
    /// draft-ietf-quic-reliable-stream-reset
    pub reliable_stream_reset: bool,
}

/// RFC 9000 section 18.2 defaults for every parameter an endpoint may omit.
impl Default for TransportParameters {
    fn default() -> Self {
        Self {
            original_destination_connection_id: None,
            original_destination_connection_id_len: 0,
            max_idle_timeout: Duration::ZERO,
            stateless_reset_token: None,
            max_udp_payload_size: VarInt::from_u16(65527),
            initial_max_data: VarInt::ZERO,
            initial_max_stream_data_bidi_local: VarInt::ZERO,
            initial_max_stream_data_bidi_remote: VarInt::ZERO,
            initial_max_stream_data_uni: VarInt::ZERO,
            initial_max_streams_bidi: VarInt::ZERO,
            initial_max_streams_uni: VarInt::ZERO,
            ack_delay_exponent: VarInt::from_u8(3),
            max_ack_delay: Duration::from_millis(25),
            disable_active_migration: false,
            active_connection_id_limit: VarInt::from_u8(2),
            initial_source_connection_id: None,
            initial_source_connection_id_len: 0,
            retry_source_connection_id: None,
            retry_source_connection_id_len: 0,
            max_datagram_frame_size: None,
            min_ack_delay: None,
            grease_quic_bit: false,
            reliable_stream_reset: false,
        }
    }
}

impl TransportParameters {
    #[inline]
    pub fn original_destination_connection_id(&self) -> Option<&[u8]> {
        self.original_destination_connection_id
            .as_ref()
            .map(|bytes| &bytes[..self.original_destination_connection_id_len as usize])
    }

    #[inline]
    pub fn initial_source_connection_id(&self) -> Option<&[u8]> {
        self.initial_source_connection_id
            .as_ref()
            .map(|bytes| &bytes[..self.initial_source_connection_id_len as usize])
    }

    /// Section 7.4.2: the negotiated idle timeout is the minimum of the
    /// non-zero timeouts the two endpoints advertised, or zero (disabled)
    /// if either side advertised zero... actually RFC 9000 says the
    /// minimum of the two values, and zero means "no timeout" so it must
    /// be excluded unless both sides specify it.
    #[inline]
    pub fn negotiate_idle_timeout(local: Duration, peer: Duration) -> Duration {
        match (local.is_zero(), peer.is_zero()) {
            (true, true) => Duration::ZERO,
            (true, false) => peer,
            (false, true) => local,
            (false, false) => local.min(peer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timeout_negotiation_prefers_the_smaller_nonzero_value() {
        assert_eq!(
            TransportParameters::negotiate_idle_timeout(Duration::from_secs(30), Duration::from_secs(10)),
            Duration::from_secs(10)
        );
        assert_eq!(
            TransportParameters::negotiate_idle_timeout(Duration::ZERO, Duration::from_secs(10)),
            Duration::from_secs(10)
        );
        assert_eq!(TransportParameters::negotiate_idle_timeout(Duration::ZERO, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn defaults_match_rfc9000_section_18_2() {
        let params = TransportParameters::default();
        assert_eq!(params.max_udp_payload_size, VarInt::from_u16(65527));
        assert_eq!(params.ack_delay_exponent, VarInt::from_u8(3));
        assert_eq!(params.max_ack_delay, Duration::from_millis(25));
        assert_eq!(params.active_connection_id_limit, VarInt::from_u8(2));
    }
}
