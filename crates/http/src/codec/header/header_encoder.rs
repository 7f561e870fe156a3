//! Head encoders for request and response header blocks.
//!
//! Serialization writes the start line, the header fields and the blank-line
//! terminator. A frame with a known body length gets a `Content-Length`
//! header; a frame declared empty gets none at all — the store-success
//! response is exactly `HTTP/1.1 200 OK\r\n\r\n`.
//!
//! `http::HeaderMap` stores field names lowercased, but the wire format of
//! this protocol subset is byte-exact, so names are written with canonical
//! capitalization (`Content-Type`, not `content-type`).

use crate::codec::NOT_FOUND_RESPONSE;
use crate::protocol::{PayloadSize, RequestHead, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};

use http::{HeaderMap, StatusCode, Version, header};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size reserved for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for response header blocks.
///
/// A not-found response is emitted as [`NOT_FOUND_RESPONSE`] verbatim,
/// headers and all: the leading CRLF pair is what deployed peers expect.
pub struct ResponseHeadEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for ResponseHeadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);

        if head.status() == StatusCode::NOT_FOUND {
            dst.put_slice(NOT_FOUND_RESPONSE);
            return Ok(());
        }

        match head.version() {
            Version::HTTP_11 => {
                let reason = head.status().canonical_reason().unwrap_or("Unknown");
                write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", head.status().as_str(), reason)?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        if let PayloadSize::Length(n) = payload_size
            && !head.headers().contains_key(header::CONTENT_LENGTH)
        {
            head.headers_mut().insert(header::CONTENT_LENGTH, n.into());
        }

        write_headers(head.headers(), dst);
        Ok(())
    }
}

/// Encoder for request header blocks.
pub struct RequestHeadEncoder;

impl Encoder<(RequestHead, PayloadSize)> for RequestHeadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (RequestHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, payload_size) = item;

        dst.reserve(INIT_HEADER_SIZE);

        match head.version() {
            Version::HTTP_11 => {
                write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", head.method(), head.uri().path())?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        let mut head = head.body(());
        if let PayloadSize::Length(n) = payload_size
            && !head.headers().contains_key(header::CONTENT_LENGTH)
        {
            head.headers_mut().insert(header::CONTENT_LENGTH, n.into());
        }

        write_headers(head.headers(), dst);
        Ok(())
    }
}

fn write_headers(headers: &HeaderMap, dst: &mut BytesMut) {
    for (header_name, header_value) in headers {
        write_title_case(dst, header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
}

/// Writes a header name with the first letter of each `-` separated segment
/// uppercased.
fn write_title_case(dst: &mut BytesMut, name: &[u8]) {
    let mut at_segment_start = true;
    for &byte in name {
        if at_segment_start {
            dst.put_u8(byte.to_ascii_uppercase());
        } else {
            dst.put_u8(byte);
        }
        at_segment_start = byte == b'-';
    }
}

/// Writer over `BytesMut` that skips the io error plumbing; space has
/// already been reserved.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestHead;
    use http::{HeaderValue, Method, Request, Response};

    #[test]
    fn response_head_exact_success_framing() {
        let mut head = Response::builder().status(StatusCode::OK).body(()).unwrap();
        head.headers_mut().insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        head.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let mut dst = BytesMut::new();
        ResponseHeadEncoder.encode((head, PayloadSize::Length(11)), &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            b"HTTP/1.1 200 OK\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\n"
        );
    }

    #[test]
    fn response_head_empty_has_no_headers() {
        let head = Response::builder().status(StatusCode::OK).body(()).unwrap();

        let mut dst = BytesMut::new();
        ResponseHeadEncoder.encode((head, PayloadSize::Empty), &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[test]
    fn response_head_not_found_is_byte_exact() {
        let head = Response::builder().status(StatusCode::NOT_FOUND).body(()).unwrap();

        let mut dst = BytesMut::new();
        ResponseHeadEncoder.encode((head, PayloadSize::Empty), &mut dst).unwrap();

        assert_eq!(&dst[..], b"\r\n\r\nHTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn request_head_with_body_headers() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/notes.txt")
            .header(header::HOST, "127.0.0.1:8000")
            .header(header::CONNECTION, "keep-alive")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(())
            .unwrap();
        let head = RequestHead::from(request);

        let mut dst = BytesMut::new();
        RequestHeadEncoder.encode((head, PayloadSize::Length(5)), &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            b"POST /notes.txt HTTP/1.1\r\nHost: 127.0.0.1:8000\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\n"
        );
    }
}
