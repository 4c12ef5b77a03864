// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Connection-scoped primitives: identifiers, limits, errors, and the
//! closing/draining state machine. The connection state machine itself
//! (the operation loop that drives these) lives in `rquic-transport`.

pub mod close;
pub mod error;
pub mod id;
pub mod limits;

pub use close::State as CloseState;
pub use error::{Error, Initiator};
pub use id::ConnectionId;
pub use limits::Limits;
