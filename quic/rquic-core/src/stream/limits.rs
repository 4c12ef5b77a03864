// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

/// The default amount of unacknowledged send data a stream will buffer.
const DEFAULT_MAX_SEND_BUFFER_SIZE: u32 = 64 * 1024;

/// Receive-window auto-tuning fires a `MAX_STREAM_DATA` update once the
/// consumed fraction of the current window crosses this threshold.
const DEFAULT_AUTO_TUNE_FRACTION: f32 = 0.5;

/// Per-stream limits, independent of the connection-wide transport
/// parameters that seed a stream's initial flow control window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Limits {
    /// The maximum amount of unacknowledged data a stream will buffer for
    /// sending before blocking the application.
    pub max_send_buffer_size: u32,

    /// The fraction of the current receive window that must be consumed
    /// before a larger window is advertised to the peer.
    pub auto_tune_fraction: f32,

    /// Upper bound on the auto-tuned receive window; auto-tuning never
    /// advertises more than this regardless of consumption rate.
    pub max_receive_window: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self::RECOMMENDED
    }
}

impl Limits {
    pub const RECOMMENDED: Self = Self {
        max_send_buffer_size: DEFAULT_MAX_SEND_BUFFER_SIZE,
        auto_tune_fraction: DEFAULT_AUTO_TUNE_FRACTION,
        max_receive_window: 6 * 1024 * 1024,
    };
}
