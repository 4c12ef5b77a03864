// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! Whether a frame obligates the peer to send an acknowledgment in return.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AckElicitation {
    NonEliciting,
    #[default]
    Eliciting,
}

impl AckElicitation {
    #[inline]
    pub fn is_ack_eliciting(self) -> bool {
        matches!(self, Self::Eliciting)
    }
}

pub trait AckElicitable {
    fn ack_elicitation(&self) -> AckElicitation;
}
