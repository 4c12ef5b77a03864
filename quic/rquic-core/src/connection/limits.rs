// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Connection-level limits an endpoint enforces locally and advertises to
//! its peer via transport parameters. `rquic-transport` owns the live flow
//! control windows; this struct only carries the configured starting point.

use crate::varint::VarInt;
use core::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_idle_timeout: Duration,
    pub max_handshake_duration: Duration,
    pub initial_max_data: VarInt,
    pub initial_max_stream_data_bidi_local: VarInt,
    pub initial_max_stream_data_bidi_remote: VarInt,
    pub initial_max_stream_data_uni: VarInt,
    pub max_open_bidirectional_streams: VarInt,
    pub max_open_unidirectional_streams: VarInt,
    pub active_connection_id_limit: VarInt,
    pub max_ack_delay: Duration,
    pub ack_elicitation_interval: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_idle_timeout: Duration::from_secs(30),
            max_handshake_duration: Duration::from_secs(10),
            initial_max_data: VarInt::from_u32(1 << 20),
            initial_max_stream_data_bidi_local: VarInt::from_u32(1 << 18),
            initial_max_stream_data_bidi_remote: VarInt::from_u32(1 << 18),
            initial_max_stream_data_uni: VarInt::from_u32(1 << 18),
            max_open_bidirectional_streams: VarInt::from_u32(100),
            max_open_unidirectional_streams: VarInt::from_u32(100),
            active_connection_id_limit: VarInt::from_u8(4),
            max_ack_delay: Duration::from_millis(25),
            ack_elicitation_interval: 2,
        }
    }
}

/// Builder for [`Limits`], mirroring the pattern `rquic-transport`'s
/// `endpoint::Limits` builder uses for endpoint-wide configuration.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    limits: Limits,
}

impl Builder {
    pub fn new() -> Self {
        Self { limits: Limits::default() }
    }

    pub fn with_max_idle_timeout(mut self, timeout: Duration) -> Self {
        self.limits.max_idle_timeout = timeout;
        self
    }

    pub fn with_initial_max_data(mut self, value: VarInt) -> Self {
        self.limits.initial_max_data = value;
        self
    }

    pub fn with_max_open_bidirectional_streams(mut self, value: VarInt) -> Self {
        self.limits.max_open_bidirectional_streams = value;
        self
    }

    pub fn build(self) -> Limits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_touched_fields() {
        let limits = Builder::new().with_initial_max_data(VarInt::from_u32(42)).build();
        assert_eq!(limits.initial_max_data, VarInt::from_u32(42));
        assert_eq!(limits.max_idle_timeout, Limits::default().max_idle_timeout);
    }
}
