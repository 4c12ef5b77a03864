// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! QUIC cryptography seams (RFC 9001): the key and header-key traits a TLS
//! provider's keys must implement, header protection apply/remove, and the
//! `Endpoint`/`Session` traits the handshake is driven through.
//!
//! AEAD sealing/opening itself, certificate validation, and the TLS record
//! layer all live on the other side of these traits, in whatever crate
//! implements them for a specific TLS library.

pub mod error;
pub mod header_protection;
pub mod key;
pub mod tls;

pub use error::Error;
pub use header_protection::{protect, unprotect};
pub use key::{CryptoSuite, HandshakeHeaderKey, HandshakeKey, HeaderKey, HeaderProtectionMask, InitialHeaderKey, InitialKey, Key, OneRttHeaderKey, OneRttKey, RetryKey, ZeroRttHeaderKey, ZeroRttKey};
