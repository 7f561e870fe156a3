//! Serving-side frame decoder.
//!
//! Composes head and body parsing behind one `Decoder`: first a
//! [`Message::Header`] carrying the parsed request head and its declared
//! payload size, then payload items until EOF. The state machine lives in
//! the `payload_decoder` field — `None` while parsing a head, `Some` while
//! a body is in flight.

use crate::codec::body::PayloadDecoder;
use crate::codec::header::RequestHeadDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

pub struct RequestDecoder {
    head_decoder: RequestHeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { head_decoder: RequestHeadDecoder, payload_decoder: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // a body is in flight, keep draining it
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.head_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if self.payload_decoder.is_some() => Err(ParseError::unexpected_eof("request body incomplete")),
            None if !src.is_empty() => Err(ParseError::unexpected_eof("request head incomplete")),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_frame(decoder: &mut RequestDecoder, buf: &mut BytesMut) -> (RequestHead, Vec<u8>) {
        let Some(Message::Header((head, _))) = decoder.decode(buf).unwrap() else {
            panic!("expected a header first");
        };
        let mut body = Vec::new();
        loop {
            match decoder.decode(buf).unwrap() {
                Some(Message::Payload(PayloadItem::Chunk(bytes))) => body.extend_from_slice(&bytes),
                Some(Message::Payload(PayloadItem::Eof)) => return (head, body),
                Some(Message::Header(_)) => panic!("header inside a body"),
                None => panic!("frame should be complete in the buffer"),
            }
        }
    }

    #[test]
    fn two_frames_back_to_back() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from(
            &b"POST /a.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET /b.txt HTTP/1.1\r\n\r\n"[..],
        );

        let (first, body) = collect_frame(&mut decoder, &mut buf);
        assert_eq!(first.uri().path(), "/a.txt");
        assert_eq!(body, b"abc");

        let (second, body) = collect_frame(&mut decoder, &mut buf);
        assert_eq!(second.uri().path(), "/b.txt");
        assert!(body.is_empty());
    }

    #[test]
    fn eof_mid_body_is_an_error() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from(&b"POST /a.txt HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc"[..]);

        assert!(matches!(decoder.decode(&mut buf).unwrap(), Some(Message::Header(_))));
        // the three buffered bytes drain first
        assert!(matches!(decoder.decode_eof(&mut buf).unwrap(), Some(Message::Payload(PayloadItem::Chunk(_)))));
        assert!(matches!(decoder.decode_eof(&mut buf), Err(ParseError::UnexpectedEof { .. })));
    }
}
