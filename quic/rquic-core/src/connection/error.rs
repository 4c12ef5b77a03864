// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Errors a connection can terminate with.

use crate::{application, transport::TransportError, varint::VarInt};
use core::fmt;

/// Which side of the connection caused a close.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Initiator {
    Local,
    Remote,
}

/// Terminal state a connection reaches; once in one of these, the
/// connection no longer processes packets except to answer with a
/// CONNECTION_CLOSE or a stateless reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Closed locally or by the peer without an error, via an application
    /// CONNECTION_CLOSE carrying `NO_ERROR`.
    Closed { initiator: Initiator },
    /// Closed at the transport level; `error` is what the CONNECTION_CLOSE
    /// frame (sent or received) carried.
    Transport { error: TransportError, initiator: Initiator },
    /// Closed by the application via an application-level CONNECTION_CLOSE.
    Application { error: VarInt, initiator: Initiator },
    /// The peer's endpoint sent a stateless reset token matching one we
    /// had associated with a connection ID in use on this connection.
    StatelessReset,
    /// The local idle timer expired with no packet sent or received.
    IdleTimerExpired,
    /// The local or peer stream ID space was exhausted.
    StreamIdExhausted,
    /// No endpoint-selectable role applies (e.g. the connection was
    /// dropped before it ever left the handshake).
    Unspecified,
}

impl Error {
    #[inline]
    pub fn initiator(&self) -> Option<Initiator> {
        match self {
            Error::Closed { initiator } | Error::Transport { initiator, .. } | Error::Application { initiator, .. } => {
                Some(*initiator)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self.initiator(), Some(Initiator::Local))
    }

    #[inline]
    pub fn from_transport_error(error: TransportError, initiator: Initiator) -> Self {
        if error.code == TransportError::NO_ERROR.code && error.frame_type.is_none() {
            Error::Closed { initiator }
        } else {
            Error::Transport { error, initiator }
        }
    }
}

impl application::ErrorExt for Error {
    fn application_error_code(&self) -> Option<application::Error> {
        match self {
            Error::Application { error, .. } => Some((*error).into()),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Self::from_transport_error(error, Initiator::Local)
    }
}

impl From<application::Error> for Error {
    fn from(error: application::Error) -> Self {
        Error::Application { error: error.as_varint(), initiator: Initiator::Local }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Closed { .. } => write!(f, "the connection was closed without an error"),
            Error::Transport { error, .. } => write!(f, "the connection was closed at the transport level: {error}"),
            Error::Application { error, .. } => write!(f, "the connection was closed by the application with code {error}"),
            Error::StatelessReset => write!(f, "the connection was reset by a stateless reset from the peer"),
            Error::IdleTimerExpired => write!(f, "the connection's idle timer expired"),
            Error::StreamIdExhausted => write!(f, "the stream ID space was exhausted"),
            Error::Unspecified => write!(f, "the connection was closed for an unspecified reason"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
