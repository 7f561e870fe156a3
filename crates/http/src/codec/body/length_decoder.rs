//! Decoder for bodies whose size is declared by `Content-Length`.

use std::cmp;

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Counts down the remaining body bytes of one frame.
///
/// Bytes past the declared length are left in the buffer: on a kept-alive
/// connection they belong to the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// Body bytes still to be read
    remaining: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Yields a chunk of at most the remaining length, EOF once the declared
    /// length has been consumed, or `None` when more data is needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.remaining, src.len() as u64);
        let bytes = src.split_to(len as usize).freeze();

        self.remaining -= bytes.len() as u64;
        Ok(Some(PayloadItem::Chunk(bytes)))
    }
}
