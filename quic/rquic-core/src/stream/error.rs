// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

use crate::{application, connection, frame::ConnectionClose, transport::TransportError};

/// Errors a stream operation can return.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The stream ID is not (or no longer) tracked by the connection.
    InvalidStream,
    /// The peer reset the stream via `RESET_STREAM`, carrying its error code.
    StreamReset(application::Error),
    /// A send was attempted after the send side was already finished.
    SendAfterFinish,
    /// Writing would exceed the maximum possible stream offset (2^62 - 1).
    MaxStreamDataSizeExceeded,
    /// The stream was torn down as a side effect of a connection error.
    ConnectionError(connection::Error),
    /// The stream is not readable (e.g. it is send-only).
    NonReadable,
    /// The stream is not writable (e.g. it is receive-only).
    NonWritable,
    /// A send was attempted before the stream's last send completed.
    SendingBlocked,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidStream => write!(f, "the stream ID is invalid"),
            Self::StreamReset(code) => write!(f, "the stream was reset by the peer: {code:?}"),
            Self::SendAfterFinish => write!(f, "send attempted after the stream was finished"),
            Self::MaxStreamDataSizeExceeded => write!(f, "maximum stream offset exceeded"),
            Self::ConnectionError(error) => write!(f, "the connection closed: {error}"),
            Self::NonReadable => write!(f, "the stream is not readable"),
            Self::NonWritable => write!(f, "the stream is not writable"),
            Self::SendingBlocked => write!(f, "a previous send has not yet completed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl application::ErrorExt for Error {
    fn application_error_code(&self) -> Option<application::Error> {
        match self {
            Self::ConnectionError(error) => error.application_error_code(),
            _ => None,
        }
    }
}

impl From<connection::Error> for Error {
    fn from(error: connection::Error) -> Self {
        Self::ConnectionError(error)
    }
}

impl From<application::Error> for Error {
    fn from(error: application::Error) -> Self {
        Self::ConnectionError(error.into())
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Self::ConnectionError(error.into())
    }
}

impl<'a> From<ConnectionClose<'a>> for Error {
    fn from(error: ConnectionClose<'a>) -> Self {
        let _ = error;
        Self::ConnectionError(connection::Error::Closed { initiator: connection::Initiator::Remote })
    }
}
