// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Traits a TLS provider implements to hand `rquic-transport` AEAD sealing
//! keys per encryption level (RFC 9001 section 5), without this crate
//! needing to know which cipher suite or crypto library produced them.

use crate::crypto::error::Error;

pub trait Key {
    fn decrypt(&self, packet_number: u64, header: &[u8], payload: &mut [u8]) -> Result<(), Error>;

    fn encrypt(&mut self, packet_number: u64, header: &[u8], payload: &mut [u8]) -> Result<(), Error>;

    /// Length of the AEAD tag this key appends.
    fn tag_len(&self) -> usize;

    /// RFC 9001 section 6.6: the number of packets that can be protected
    /// with this key before it must be retired.
    fn aead_confidentiality_limit(&self) -> u64;

    /// RFC 9001 section 6.6: the number of decryption failures tolerated
    /// before the connection must be closed.
    fn aead_integrity_limit(&self) -> u64;

    fn cipher_suite(&self) -> super::tls::CipherSuite;
}

pub const HEADER_PROTECTION_MASK_LEN: usize = 5;
pub type HeaderProtectionMask = [u8; HEADER_PROTECTION_MASK_LEN];

/// RFC 9001 section 5.4: derives the mask XORed over the first header byte
/// and the packet number field.
pub trait HeaderKey {
    fn opening_header_protection_mask(&self, ciphertext_sample: &[u8]) -> HeaderProtectionMask;
    fn opening_sample_len(&self) -> usize;
    fn sealing_header_protection_mask(&self, ciphertext_sample: &[u8]) -> HeaderProtectionMask;
    fn sealing_sample_len(&self) -> usize;
}

/// Marker traits tying a concrete key type to the packet space it protects.
/// `rquic-transport`'s per-space crypto context holds one of each.
pub trait InitialKey: Key + Sized {
    type HeaderKey: HeaderKey;

    fn new_server(connection_id: &[u8]) -> (Self, Self::HeaderKey);
    fn new_client(connection_id: &[u8]) -> (Self, Self::HeaderKey);
}

pub trait InitialHeaderKey: HeaderKey {}
pub trait HandshakeKey: Key {}
pub trait HandshakeHeaderKey: HeaderKey {}
pub trait ZeroRttKey: Key {}
pub trait ZeroRttHeaderKey: HeaderKey {}
pub trait OneRttHeaderKey: HeaderKey {}

pub trait OneRttKey: Key {
    /// RFC 9001 section 6: derives the next generation of keys for a key
    /// update, ratcheting the KDF forward without renegotiating.
    fn derive_next_key(&self) -> Self;

    fn update_sealer_pmtu(&mut self, pmtu: u16);
    fn update_opener_pmtu(&mut self, pmtu: u16);
}

/// RFC 9001 section 5.8: a Retry packet is authenticated with a fixed key
/// known to every QUIC endpoint, not one derived from the handshake.
pub const RETRY_INTEGRITY_TAG_LEN: usize = 16;
pub type RetryIntegrityTag = [u8; RETRY_INTEGRITY_TAG_LEN];

pub trait RetryKey {
    fn generate_tag(payload: &[u8]) -> RetryIntegrityTag;
    fn validate(payload: &[u8], tag: RetryIntegrityTag) -> Result<(), Error>;
}

/// Aggregates every key type a full handshake needs, so `rquic-transport`
/// can be generic over one TLS provider's concrete key types at once.
pub trait CryptoSuite {
    type HandshakeKey: HandshakeKey;
    type HandshakeHeaderKey: HandshakeHeaderKey;
    type InitialKey: InitialKey<HeaderKey = Self::InitialHeaderKey>;
    type InitialHeaderKey: InitialHeaderKey;
    type OneRttKey: OneRttKey;
    type OneRttHeaderKey: OneRttHeaderKey;
    type ZeroRttKey: ZeroRttKey;
    type ZeroRttHeaderKey: ZeroRttHeaderKey;
    type RetryKey: RetryKey;
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;

    #[derive(Debug, Default)]
    pub struct Key {
        pub derivations: u64,
        pub fail_on_decrypt: bool,
    }

    impl super::Key for Key {
        fn decrypt(&self, _packet_number: u64, _header: &[u8], _payload: &mut [u8]) -> Result<(), Error> {
            if self.fail_on_decrypt {
                return Err(Error::Decrypt);
            }
            Ok(())
        }

        fn encrypt(&mut self, _packet_number: u64, _header: &[u8], _payload: &mut [u8]) -> Result<(), Error> {
            Ok(())
        }

        fn tag_len(&self) -> usize {
            0
        }

        fn aead_confidentiality_limit(&self) -> u64 {
            u64::MAX
        }

        fn aead_integrity_limit(&self) -> u64 {
            u64::MAX
        }

        fn cipher_suite(&self) -> super::super::tls::CipherSuite {
            super::super::tls::CipherSuite::Unknown
        }
    }

    impl InitialKey for Key {
        type HeaderKey = HeaderKey;

        fn new_server(_connection_id: &[u8]) -> (Self, Self::HeaderKey) {
            (Key::default(), HeaderKey::default())
        }

        fn new_client(_connection_id: &[u8]) -> (Self, Self::HeaderKey) {
            (Key::default(), HeaderKey::default())
        }
    }

    impl HandshakeKey for Key {}
    impl ZeroRttKey for Key {}

    impl OneRttKey for Key {
        fn derive_next_key(&self) -> Self {
            Self { derivations: self.derivations + 1, fail_on_decrypt: self.fail_on_decrypt }
        }

        fn update_sealer_pmtu(&mut self, _pmtu: u16) {}
        fn update_opener_pmtu(&mut self, _pmtu: u16) {}
    }

    impl RetryKey for Key {
        fn generate_tag(_payload: &[u8]) -> RetryIntegrityTag {
            [0; RETRY_INTEGRITY_TAG_LEN]
        }

        fn validate(_payload: &[u8], _tag: RetryIntegrityTag) -> Result<(), Error> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct HeaderKey;

    impl super::HeaderKey for HeaderKey {
        fn opening_header_protection_mask(&self, _sample: &[u8]) -> HeaderProtectionMask {
            [0; HEADER_PROTECTION_MASK_LEN]
        }

        fn opening_sample_len(&self) -> usize {
            0
        }

        fn sealing_header_protection_mask(&self, _sample: &[u8]) -> HeaderProtectionMask {
            [0; HEADER_PROTECTION_MASK_LEN]
        }

        fn sealing_sample_len(&self) -> usize {
            0
        }
    }

    impl InitialHeaderKey for HeaderKey {}
    impl HandshakeHeaderKey for HeaderKey {}
    impl OneRttHeaderKey for HeaderKey {}
    impl ZeroRttHeaderKey for HeaderKey {}
}
