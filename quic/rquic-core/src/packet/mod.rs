// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Packet number spaces and the truncation/expansion algorithm used to put
//! packet numbers on the wire (RFC 9000 section 17.1 and Appendix A).

pub mod header;
pub mod number;

pub use header::{peek, LongPacketType, Peek};
pub use number::{PacketNumber, PacketNumberLen, PacketNumberRange, PacketNumberSpace};
