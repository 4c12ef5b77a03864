#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Protocol primitives shared by the `rquic-transport` connection state
//! machine: varints, frame encode/decode, connection IDs, packet-number
//! spaces, transport parameters and error codes, stream IDs and state
//! machines, RTT estimation, congestion control, path MTU discovery, and
//! stateless-reset/retry-token primitives.
//!
//! Nothing in this crate drives a connection loop; it only defines the
//! vocabulary `rquic-transport` assembles into one.

#[cfg(any(feature = "alloc", feature = "std", test))]
extern crate alloc;

pub mod application;
pub mod connection;
pub mod crypto;
pub mod endpoint;
pub mod frame;
pub mod inet;
pub mod packet;
pub mod path;
pub mod random;
pub mod recovery;
pub mod stateless_reset;
pub mod stream;
pub mod time;
pub mod token;
pub mod transport;
pub mod varint;
