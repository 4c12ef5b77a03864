// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Loss detection and congestion control primitives (RFC 9002). The
//! connection-scoped driver that ties these together per packet number
//! space — `recovery::Manager` — lives in `rquic-transport`, since it needs
//! to call back into stream and connection state on loss/ack.

pub mod bbr;
pub mod congestion_controller;
pub mod cubic;
pub mod pto;
pub mod received;
pub mod rtt_estimator;
pub mod sent_packets;

pub use bbr::BbrLite;
pub use congestion_controller::CongestionController;
pub use cubic::Cubic;
pub use pto::{Pto, ProbePackets};
pub use received::{ReceivedPackets, Rejected as ReceivedRejected};
pub use rtt_estimator::RttEstimator;
pub use sent_packets::{SentPacketInfo, SentPackets, SentStreamChunk};
