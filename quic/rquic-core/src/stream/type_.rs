// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

/// Whether a stream carries data in both directions or only one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    Bidirectional,
    Unidirectional,
}

impl StreamType {
    #[inline]
    pub fn is_bidirectional(self) -> bool {
        self == Self::Bidirectional
    }

    #[inline]
    pub fn is_unidirectional(self) -> bool {
        self == Self::Unidirectional
    }
}
