// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Address validation tokens (RFC 9000 section 8.1): opaque values an
//! endpoint hands a client via a Retry packet or a NEW_TOKEN frame, and
//! later requires back in an Initial packet as evidence the client owns
//! the address it claims.
//!
//! Token construction and validation (typically an AEAD-sealed record
//! binding the client address, the original destination connection ID,
//! and an issue timestamp) is an application concern left to whatever
//! implements [`Format`]; this module only defines the seam.

use crate::{connection, inet, random};

#[non_exhaustive]
pub struct Context<'a> {
    pub remote_address: &'a inet::SocketAddress,
    pub peer_connection_id: &'a connection::ConnectionId,
    pub random: &'a mut dyn random::Generator,
}

/// Distinguishes the two ways a token reached the peer, since a Retry
/// token binds a newer original destination connection ID than a token
/// handed out later in a NEW_TOKEN frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    RetryPacket,
    NewTokenFrame,
}

pub trait Format {
    const TOKEN_LEN: usize;

    /// Generates a token to deliver in a NEW_TOKEN frame, for use on a
    /// future connection attempt. Returns `None` if no token should be
    /// sent this time.
    fn generate_new_token(&mut self, context: &mut Context<'_>, source_connection_id: &connection::ConnectionId, output_buffer: &mut [u8]) -> Option<()>;

    /// Generates a token to deliver in a Retry packet.
    fn generate_retry_token(&mut self, context: &mut Context<'_>, original_destination_connection_id: &connection::ConnectionId, output_buffer: &mut [u8]) -> Option<()>;

    /// Validates a token presented in a client Initial packet, returning
    /// the original destination connection ID it was issued for. Callers
    /// are responsible for rejecting a token seen more than once.
    fn validate_token(&mut self, context: &mut Context<'_>, token: &[u8]) -> Option<connection::ConnectionId>;
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;

    pub const TOKEN: [u8; 4] = *b"test";
    pub const TOKEN_LEN: usize = TOKEN.len();

    #[derive(Debug, Default)]
    pub struct Format;

    impl super::Format for Format {
        const TOKEN_LEN: usize = TOKEN_LEN;

        fn generate_new_token(&mut self, _context: &mut Context<'_>, _source_connection_id: &connection::ConnectionId, _output_buffer: &mut [u8]) -> Option<()> {
            None
        }

        fn generate_retry_token(&mut self, _context: &mut Context<'_>, _original_destination_connection_id: &connection::ConnectionId, output_buffer: &mut [u8]) -> Option<()> {
            output_buffer.get_mut(..TOKEN_LEN)?.copy_from_slice(&TOKEN);
            Some(())
        }

        fn validate_token(&mut self, _context: &mut Context<'_>, token: &[u8]) -> Option<connection::ConnectionId> {
            if token == TOKEN {
                Some(connection::ConnectionId::try_from_bytes(&[0xff; 8]).unwrap())
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_format_round_trips_its_fixed_token() {
        let mut format = testing::Format;
        let mut random = random::testing::Fixed::default();
        let remote_address = inet::SocketAddress::new(std::net::SocketAddr::from(([127, 0, 0, 1], 4433)));
        let peer_connection_id = connection::ConnectionId::try_from_bytes(&[1, 2, 3]).unwrap();
        let mut context = Context { remote_address: &remote_address, peer_connection_id: &peer_connection_id, random: &mut random };

        let mut buffer = [0u8; testing::TOKEN_LEN];
        format.generate_retry_token(&mut context, &peer_connection_id, &mut buffer).unwrap();
        assert!(format.validate_token(&mut context, &buffer).is_some());
        assert!(format.validate_token(&mut context, &[0u8; testing::TOKEN_LEN]).is_none());
    }
}
