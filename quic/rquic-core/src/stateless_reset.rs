// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Stateless reset (RFC 9000 section 10.3): a last-resort signal an
//! endpoint that has lost connection state can send in place of a real
//! short-header packet, carrying a 16-byte token the peer associated with
//! one of its local connection IDs.
//!
//! ```text
//! Stateless Reset {
//!   Fixed Bits (2) = 1,
//!   Unpredictable Bits (38..),
//!   Stateless Reset Token (128),
//! }
//! ```

use crate::{connection, random};

pub const TOKEN_LEN: usize = 128 / 8;

#[derive(Copy, Clone, Debug, Eq, Hash)]
pub struct Token([u8; TOKEN_LEN]);

impl Token {
    pub const ZEROED: Self = Self([0; TOKEN_LEN]);

    pub fn into_inner(self) -> [u8; TOKEN_LEN] {
        self.0
    }
}

impl From<[u8; TOKEN_LEN]> for Token {
    fn from(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Token {
    type Error = core::array::TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(bytes.try_into()?))
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl PartialEq for Token {
    /// RFC 9000 section 10.3.1: comparisons against reset tokens must not
    /// leak information about the value through timing, so every byte is
    /// compared regardless of where the first mismatch falls.
    fn eq(&self, other: &Self) -> bool {
        let mut diff = 0u8;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

/// Generates a stateless reset token, stable for a given local connection
/// ID across process restarts so a reset sent after a crash is still
/// recognized by the peer.
pub trait Generator {
    const ENABLED: bool = true;

    fn generate(&mut self, local_connection_id: &[u8]) -> Token;
}

/// The short-header tag stateless resets are disguised as (RFC 9000
/// section 10.3: Fixed Bits = 1, the high bit of a short header is 0).
const TAG: u8 = 0b0100_0000;
const TAG_OFFSET: u8 = 2;

/// 1 header byte, the longest connection ID this endpoint might have
/// handed out, and 1 byte of packet number, before the reset token itself.
const MIN_INDISTINGUISHABLE_LEN_WITHOUT_AEAD_TAG: usize = 1 + connection::id::MAX_LEN + 1 + TOKEN_LEN;

/// The minimum length a stateless reset needs to reach to be
/// indistinguishable from a valid short-header packet using the longest
/// connection ID this endpoint might use.
pub fn min_indistinguishable_packet_len(max_aead_tag_len: usize) -> usize {
    MIN_INDISTINGUISHABLE_LEN_WITHOUT_AEAD_TAG + max_aead_tag_len
}

/// Writes a stateless reset into `packet_buf`, returning the length
/// written, or `None` if `triggering_packet_len` was too small to produce
/// one that's smaller than the packet that triggered it (RFC 9000 section
/// 10.3.3) while still being indistinguishable from a real packet.
pub fn encode_packet(
    token: Token,
    max_aead_tag_len: usize,
    triggering_packet_len: usize,
    random_generator: &mut dyn random::Generator,
    packet_buf: &mut [u8],
) -> Option<usize> {
    let min_len = min_indistinguishable_packet_len(max_aead_tag_len);
    // RFC 9000 section 10.3: never send a reset 3x or more larger than the
    // triggering packet, and strictly smaller than it (section 10.3.3).
    let max_len = triggering_packet_len.saturating_sub(1).min(packet_buf.len()).min(triggering_packet_len.saturating_mul(3));

    if max_len < min_len || min_len < TOKEN_LEN {
        return None;
    }

    let unpredictable_min = min_len - TOKEN_LEN;
    let unpredictable_max = max_len - TOKEN_LEN;
    let unpredictable_len = random::gen_range_biased(random_generator, unpredictable_min..=unpredictable_max);
    random_generator.public_random_fill(&mut packet_buf[..unpredictable_len]);

    packet_buf[0] = packet_buf[0] >> TAG_OFFSET | TAG;

    let packet_len = unpredictable_len + TOKEN_LEN;
    packet_buf[unpredictable_len..packet_len].copy_from_slice(token.as_ref());
    Some(packet_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_exact_but_does_not_short_circuit() {
        let token = Token([7; TOKEN_LEN]);
        assert_eq!(token, Token([7; TOKEN_LEN]));
        for i in 0..TOKEN_LEN {
            let mut other = token.0;
            other[i] ^= 0xff;
            assert_ne!(token, Token(other));
        }
    }

    #[test]
    fn encode_packet_is_smaller_than_the_triggering_packet() {
        let mut generator = random::testing::Fixed::default();
        let mut buffer = [0u8; 1500];
        let len = encode_packet(Token([9; TOKEN_LEN]), 16, 600, &mut generator, &mut buffer).unwrap();
        assert!(len < 600);
        assert_eq!(&buffer[len - TOKEN_LEN..len], &[9; TOKEN_LEN]);
        assert_eq!(buffer[0] >> 6, 0b01);
    }

    #[test]
    fn too_small_a_triggering_packet_yields_none() {
        let mut generator = random::testing::Fixed::default();
        let mut buffer = [0u8; 1500];
        let min_len = min_indistinguishable_packet_len(16);
        let len = encode_packet(Token([9; TOKEN_LEN]), 16, min_len, &mut generator, &mut buffer);
        assert!(len.is_none());
    }
}
