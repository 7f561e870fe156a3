//! Requesting-side frame decoder, the mirror of [`RequestDecoder`].
//!
//! [`RequestDecoder`]: crate::codec::RequestDecoder

use crate::codec::body::PayloadDecoder;
use crate::codec::header::ResponseHeadDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, ResponseHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

pub struct ResponseDecoder {
    head_decoder: ResponseHeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { head_decoder: ResponseHeadDecoder, payload_decoder: None }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<(ResponseHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
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
            None if self.payload_decoder.is_some() => Err(ParseError::unexpected_eof("response body incomplete")),
            None if !src.is_empty() => Err(ParseError::unexpected_eof("response head incomplete")),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn fetch_response_then_not_found() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 200 OK\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nhello world\r\n\r\nHTTP/1.1 404 Not Found\r\n\r\n"[..],
        );

        let Some(Message::Header((head, payload_size))) = decoder.decode(&mut buf).unwrap() else {
            panic!("expected the success head");
        };
        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(payload_size, PayloadSize::Length(11));

        let Some(Message::Payload(PayloadItem::Chunk(body))) = decoder.decode(&mut buf).unwrap() else {
            panic!("expected the body chunk");
        };
        assert_eq!(&body[..], b"hello world");
        assert!(matches!(decoder.decode(&mut buf).unwrap(), Some(Message::Payload(PayloadItem::Eof))));

        // the not-found framing rides the same connection, leading CRLFs and all
        let Some(Message::Header((head, payload_size))) = decoder.decode(&mut buf).unwrap() else {
            panic!("expected the not-found head");
        };
        assert_eq!(head.status(), StatusCode::NOT_FOUND);
        assert!(payload_size.is_empty());
        assert!(matches!(decoder.decode(&mut buf).unwrap(), Some(Message::Payload(PayloadItem::Eof))));
    }
}
