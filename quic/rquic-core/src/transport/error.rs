// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Transport error codes carried in CONNECTION_CLOSE frames (RFC 9000
//! section 20).

use crate::varint::VarInt;
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransportError {
    pub code: VarInt,
    pub frame_type: Option<VarInt>,
    pub reason: &'static str,
}

impl TransportError {
    #[inline]
    pub const fn new(code: VarInt, reason: &'static str, frame_type: Option<VarInt>) -> Self {
        Self { code, reason, frame_type }
    }

    #[inline]
    pub const fn with_frame_type(mut self, frame_type: VarInt) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    #[inline]
    pub const fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = reason;
        self
    }

    /// Whether `self` carries an application-defined code rather than one
    /// of the codes this module defines.
    #[inline]
    pub fn is_application(&self) -> bool {
        self.frame_type.is_none()
    }

    #[inline]
    pub fn crypto_error(alert: u8, reason: &'static str) -> Self {
        Self { code: VarInt::from_u32(0x100 | u32::from(alert)), reason, frame_type: None }
    }

    #[inline]
    pub const fn application_error(code: VarInt, reason: &'static str) -> Self {
        Self { code, reason, frame_type: None }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "TransportError({})", self.code.as_u64())
        } else {
            f.write_str(self.reason)
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

macro_rules! def_error {
    ($doc:expr, $name:ident, $code:expr) => {
        impl TransportError {
            #[doc = $doc]
            pub const $name: TransportError = TransportError::new(VarInt::from_u32($code), "", None);
        }
    };
}

def_error!("The connection is being closed abruptly with no error.", NO_ERROR, 0x0);
def_error!("The endpoint encountered an internal error.", INTERNAL_ERROR, 0x1);
def_error!("The server is busy and refuses new connections.", SERVER_BUSY, 0x2);
def_error!("An endpoint received more data than its advertised flow control limit.", FLOW_CONTROL_ERROR, 0x3);
def_error!("An endpoint received a frame for a stream exceeding its advertised stream limit.", STREAM_LIMIT_ERROR, 0x4);
def_error!("An endpoint received a frame for a stream not in a state that permits it.", STREAM_STATE_ERROR, 0x5);
def_error!("A STREAM frame or CRYPTO frame contradicts an established final size.", FINAL_SIZE_ERROR, 0x6);
def_error!("An endpoint received a badly formatted frame.", FRAME_ENCODING_ERROR, 0x7);
def_error!("An endpoint received transport parameters that were badly formatted.", TRANSPORT_PARAMETER_ERROR, 0x8);
def_error!("An endpoint received more connection IDs than its advertised limit.", CONNECTION_ID_LIMIT_ERROR, 0x9);
def_error!("An endpoint detected a protocol compliance error not covered elsewhere.", PROTOCOL_VIOLATION, 0xa);
def_error!("An endpoint received an invalid NEW_TOKEN or Retry token.", INVALID_TOKEN, 0xb);
def_error!("The application has signaled an error via the connection.", APPLICATION_ERROR, 0xc);
def_error!("An endpoint has received more CRYPTO data than it can buffer.", CRYPTO_BUFFER_EXCEEDED, 0xd);
def_error!("A TLS key update error occurred.", KEY_UPDATE_ERROR, 0xe);
def_error!("The endpoint's AEAD confidentiality or integrity limit was reached.", AEAD_LIMIT_REACHED, 0xf);
def_error!("No viable network path exists.", NO_VIABLE_PATH, 0x10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_error_is_offset_into_0x1xx_range() {
        let err = TransportError::crypto_error(0x28, "bad certificate");
        assert_eq!(err.code, VarInt::from_u32(0x128));
        assert!(!err.is_application());
    }

    #[test]
    fn application_error_carries_no_frame_type() {
        let err = TransportError::application_error(VarInt::from_u32(7), "");
        assert!(err.is_application());
    }
}
