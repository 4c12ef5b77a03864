// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Application-defined error codes (RFC 9000 section 20.2): the management
//! of these codes is left entirely to whatever protocol runs over QUIC.

use crate::varint::{VarInt, VarIntError};

#[cfg(feature = "alloc")]
use alloc::string::String;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Error(VarInt);

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "application::Error({})", self.0.as_u64())
    }
}

impl Error {
    /// Used when the application cannot provide a more meaningful code.
    pub const UNKNOWN: Self = Self(VarInt::MAX);

    #[inline]
    pub fn new(value: u64) -> Result<Self, VarIntError> {
        Ok(Self(VarInt::new(value)?))
    }

    #[inline]
    pub fn as_varint(self) -> VarInt {
        self.0
    }
}

impl From<VarInt> for Error {
    fn from(value: VarInt) -> Self {
        Self(value)
    }
}

impl From<Error> for VarInt {
    fn from(error: Error) -> Self {
        error.0
    }
}

/// Implemented by errors that may carry an application-supplied code, so a
/// `connection::Error` can be unwrapped back to it where one exists.
pub trait ErrorExt {
    fn application_error_code(&self) -> Option<Error>;
}

impl ErrorExt for Error {
    fn application_error_code(&self) -> Option<Error> {
        Some(*self)
    }
}

/// A negotiated Server Name Indication value (RFC 9001 relies on the TLS
/// handshake to carry this; QUIC itself is agnostic to its contents).
#[cfg(feature = "alloc")]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServerName(String);

#[cfg(feature = "alloc")]
impl ServerName {
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(feature = "alloc")]
impl From<&str> for ServerName {
    #[inline]
    fn from(data: &str) -> Self {
        Self(data.into())
    }
}

#[cfg(feature = "alloc")]
impl From<String> for ServerName {
    #[inline]
    fn from(data: String) -> Self {
        Self(data)
    }
}

#[cfg(feature = "alloc")]
impl core::fmt::Debug for ServerName {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(feature = "alloc")]
impl core::ops::Deref for ServerName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}
