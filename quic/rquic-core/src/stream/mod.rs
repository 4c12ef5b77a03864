// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Stream identifiers, per-direction state machines, and the
//! application-facing request/response vocabulary. The byte-buffering and
//! reassembly logic that actually drives these state machines lives in
//! `rquic-transport::stream`, which owns the send/receive buffers per
//! connection.

mod error;
mod id;
pub mod limits;
#[cfg(feature = "alloc")]
pub mod ops;
pub mod state;
mod type_;

pub use error::Error;
pub use id::StreamId;
pub use limits::Limits;
pub use type_::StreamType;
