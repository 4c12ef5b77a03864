// Copyright (c) the rquic authors.
// SPDX-License-Identifier: Apache-2.0

//! The application-facing stream request/response vocabulary (section 6's
//! `stream-send`/`stream-receive` contract). Requests are expressed as
//! structs rather than individual calls so a caller can batch e.g. a send
//! and a finish into a single round trip through the connection's
//! operation queue.

use crate::{application, stream};
use alloc::vec::Vec;
use core::task::Poll;

#[derive(Default, Debug)]
pub struct Request {
    pub tx: Option<tx::Request>,
    pub rx: Option<rx::Request>,
}

impl Request {
    pub fn send(&mut self, chunks: Vec<Vec<u8>>) -> &mut Self {
        self.tx_mut().chunks = Some(chunks);
        self
    }

    pub fn reset(&mut self, error: application::Error) -> &mut Self {
        self.tx_mut().reset = Some(error);
        self
    }

    pub fn flush(&mut self) -> &mut Self {
        self.tx_mut().flush = true;
        self
    }

    pub fn finish(&mut self) -> &mut Self {
        self.tx_mut().finish = true;
        self
    }

    pub fn receive(&mut self, max_chunks: usize) -> &mut Self {
        self.rx_mut().max_chunks = Some(max_chunks);
        self
    }

    pub fn stop_sending(&mut self, error: application::Error) -> &mut Self {
        self.rx_mut().stop_sending = Some(error);
        self
    }

    pub fn with_watermark(&mut self, low: usize, high: usize) -> &mut Self {
        let rx = self.rx_mut();
        rx.low_watermark = low.min(high);
        rx.high_watermark = high.max(low);
        self
    }

    fn tx_mut(&mut self) -> &mut tx::Request {
        self.tx.get_or_insert_with(Default::default)
    }

    fn rx_mut(&mut self) -> &mut rx::Request {
        self.rx.get_or_insert_with(Default::default)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub tx: Option<tx::Response>,
    pub rx: Option<rx::Response>,
}

impl Response {
    pub fn is_pending(&self) -> bool {
        self.tx.iter().any(|tx| tx.is_pending()) || self.rx.iter().any(|rx| rx.is_pending())
    }
}

pub mod tx {
    use super::*;

    #[derive(Default, Debug)]
    pub struct Request {
        /// Chunks to append to the send buffer; consumed in order.
        pub chunks: Option<Vec<Vec<u8>>>,
        pub reset: Option<application::Error>,
        /// Block the response until a flushed chunk is acknowledged.
        pub flush: bool,
        pub finish: bool,
    }

    #[derive(Debug, PartialEq, Eq)]
    pub struct Response {
        pub bytes: Bytes,
        pub chunks: Chunks,
        pub will_wake: bool,
        pub status: Status,
    }

    impl Default for Response {
        fn default() -> Self {
            Self { bytes: Bytes::default(), chunks: Chunks::default(), will_wake: false, status: Status::Open }
        }
    }

    impl Response {
        pub fn is_pending(&self) -> bool {
            self.will_wake
        }
    }
}

pub mod rx {
    use super::*;

    #[derive(Debug)]
    pub struct Request {
        pub max_chunks: Option<usize>,
        pub low_watermark: usize,
        pub high_watermark: usize,
        pub stop_sending: Option<application::Error>,
    }

    impl Default for Request {
        fn default() -> Self {
            Self { max_chunks: None, low_watermark: 0, high_watermark: usize::MAX, stop_sending: None }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    pub struct Response {
        pub bytes: Bytes,
        pub chunks: Chunks,
        pub will_wake: bool,
        pub status: Status,
        pub fin: bool,
    }

    impl Default for Response {
        fn default() -> Self {
            Self { bytes: Bytes::default(), chunks: Chunks::default(), will_wake: false, status: Status::Open, fin: false }
        }
    }

    impl Response {
        pub fn is_pending(&self) -> bool {
            self.will_wake
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Bytes {
    pub consumed: usize,
    pub available: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Chunks {
    pub consumed: usize,
    pub available: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Open,
    Finishing,
    Finished,
    Resetting,
    Reset(stream::Error),
}

impl Status {
    pub fn is_closing(&self) -> bool {
        matches!(self, Self::Finishing | Self::Resetting)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Finished | Self::Reset(_))
    }
}

impl Response {
    pub fn into_poll(self) -> Poll<Response> {
        if self.is_pending() {
            Poll::Pending
        } else {
            Poll::Ready(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_chains_tx_and_rx() {
        let mut request = Request::default();
        request.send(alloc::vec![alloc::vec![1, 2, 3]]).finish().flush().receive(4).with_watermark(5, 10);

        let tx = request.tx.as_ref().unwrap();
        assert!(tx.finish);
        assert!(tx.flush);
        assert_eq!(tx.chunks.as_ref().unwrap().len(), 1);

        let rx = request.rx.as_ref().unwrap();
        assert_eq!(rx.max_chunks, Some(4));
        assert_eq!((rx.low_watermark, rx.high_watermark), (5, 10));
    }

    #[test]
    fn response_pending_reflects_either_half() {
        let response = Response {
            tx: Some(tx::Response { will_wake: true, ..Default::default() }),
            rx: None,
        };
        assert!(response.is_pending());
    }
}
