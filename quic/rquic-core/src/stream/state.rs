// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The send and receive stream state machines (RFC 9000 section 3). Each
//! half of a stream advances independently; a bidirectional stream is
//! simply a pair of these, one per direction.

use crate::varint::VarInt;

/// RFC 9000 section 3.1's sending half.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SendState {
    #[default]
    Ready,
    Send,
    DataSent,
    DataRecvd,
    ResetSent,
    ResetRecvd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendEvent {
    FirstByteQueued,
    FinQueued,
    AllDataAcknowledged,
    ResetQueued,
    ResetAcknowledged,
}

impl SendState {
    /// Advances the state machine on `event`, returning the new state, or
    /// `None` if `event` is not valid from the current state.
    #[inline]
    pub fn transition(self, event: SendEvent) -> Option<Self> {
        use SendEvent::*;
        use SendState::*;

        Some(match (self, event) {
            (Ready, FirstByteQueued) => Send,
            (Ready, FinQueued) => DataSent,
            (Ready, ResetQueued) => ResetSent,
            (Send, FinQueued) => DataSent,
            (Send, AllDataAcknowledged) => return None, // can't be fully acked before FIN is sent
            (Send, ResetQueued) => ResetSent,
            (DataSent, AllDataAcknowledged) => DataRecvd,
            (DataSent, ResetQueued) => ResetSent,
            (ResetSent, ResetAcknowledged) => ResetRecvd,
            // DataRecvd and ResetRecvd are terminal.
            _ => return None,
        })
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::DataRecvd | Self::ResetRecvd)
    }

    #[inline]
    pub fn is_reset(self) -> bool {
        matches!(self, Self::ResetSent | Self::ResetRecvd)
    }
}

/// RFC 9000 section 3.2's receiving half.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecvState {
    #[default]
    Recv,
    SizeKnown,
    DataRecvd,
    DataRead,
    ResetRecvd,
    ResetRead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvEvent {
    FinReceived,
    AllDataReceived,
    AllDataRead,
    ResetReceived,
    ResetRead,
    StopSendingQueued,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalSize(pub VarInt);

impl RecvState {
    #[inline]
    pub fn transition(self, event: RecvEvent) -> Option<Self> {
        use RecvEvent::*;
        use RecvState::*;

        Some(match (self, event) {
            (Recv, FinReceived) => SizeKnown,
            (Recv, ResetReceived) => ResetRecvd,
            (Recv, StopSendingQueued) => Recv, // STOP_SENDING doesn't change recv state by itself
            (SizeKnown, AllDataReceived) => DataRecvd,
            (SizeKnown, ResetReceived) => ResetRecvd,
            (DataRecvd, AllDataRead) => DataRead,
            (ResetRecvd, RecvEvent::ResetRead) => RecvState::ResetRead,
            // DataRead and ResetRead are terminal.
            _ => return None,
        })
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::DataRead | Self::ResetRead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_cannot_be_acked_before_fin_is_queued() {
        assert_eq!(SendState::Send.transition(SendEvent::AllDataAcknowledged), None);
    }

    #[test]
    fn send_happy_path_reaches_data_recvd() {
        let state = SendState::Ready
            .transition(SendEvent::FirstByteQueued)
            .and_then(|s| s.transition(SendEvent::FinQueued))
            .and_then(|s| s.transition(SendEvent::AllDataAcknowledged))
            .unwrap();
        assert_eq!(state, SendState::DataRecvd);
        assert!(state.is_terminal());
    }

    #[test]
    fn reset_from_any_pre_terminal_send_state_reaches_reset_recvd() {
        let state = SendState::Send
            .transition(SendEvent::ResetQueued)
            .and_then(|s| s.transition(SendEvent::ResetAcknowledged))
            .unwrap();
        assert_eq!(state, SendState::ResetRecvd);
        assert!(state.is_reset());
    }

    #[test]
    fn recv_happy_path_reaches_data_read() {
        let state = RecvState::Recv
            .transition(RecvEvent::FinReceived)
            .and_then(|s| s.transition(RecvEvent::AllDataReceived))
            .and_then(|s| s.transition(RecvEvent::AllDataRead))
            .unwrap();
        assert_eq!(state, RecvState::DataRead);
        assert!(state.is_terminal());
    }

    #[test]
    fn recv_reset_overrides_size_known() {
        let state = RecvState::SizeKnown.transition(RecvEvent::ResetReceived).unwrap();
        assert_eq!(state, RecvState::ResetRecvd);
    }

    #[test]
    fn terminal_states_accept_no_further_events() {
        assert_eq!(RecvState::DataRead.transition(RecvEvent::ResetReceived), None);
        assert_eq!(SendState::DataRecvd.transition(SendEvent::ResetQueued), None);
    }
}
