//! Head decoders for request and response header blocks.
//!
//! Both decoders accumulate bytes until the `\r\n\r\n` terminator appears
//! (`httparse` reports `Partial` until then, whatever the delivery chunking),
//! parse the start line into the role-appropriate triple, and collect the
//! header fields keyed case-insensitively. The declared payload size comes
//! from the `Content-Length` header: present means that exact byte count,
//! absent means no body.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header block size: 8KB
//!
//! # Implementation notes
//!
//! `httparse` hands back header name/value slices borrowed from the source
//! buffer. The decoders record their byte ranges instead, so the header block
//! can be split off the buffer and the fields rebuilt from the frozen bytes
//! without copying.

use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHead, ResponseHead};

/// Maximum number of headers allowed in one frame
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header block
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for request header blocks.
///
/// The start line must split into exactly method, target and version;
/// anything else is a [`ParseError`].
pub struct RequestHeadDecoder;

impl Decoder for RequestHeadDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // shortest parseable request line is "GET / HTTP/1.1" plus terminators
        if src.len() < 14 {
            return Ok(None);
        }

        let mut parsed_headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut parsed_headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            Error::Version => ParseError::InvalidVersion(None),
            Error::HeaderName | Error::HeaderValue => ParseError::invalid_header(e.to_string()),
            e => ParseError::invalid_start_line(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(header_size = body_offset, "parsed request head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let header_count = req.headers.len();
                ensure!(header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(header_count));

                let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
                HeaderIndex::record(src, req.headers, &mut header_index);

                let version = match req.version {
                    Some(1) => http::Version::HTTP_11,
                    v => return Err(ParseError::InvalidVersion(v)),
                };

                let mut head_builder = Request::builder()
                    .method(req.method.ok_or_else(|| ParseError::invalid_start_line("missing method"))?)
                    .uri(req.path.ok_or_else(|| ParseError::invalid_start_line("missing target"))?)
                    .version(version);

                let headers = head_builder.headers_mut().expect("builder valid after start line checks");
                build_headers(src, body_offset, &header_index[..header_count], headers)?;

                let head: RequestHead = head_builder
                    .body(())
                    .map_err(|e| ParseError::invalid_start_line(e.to_string()))?
                    .into();

                let payload_size = content_length(head.headers())?;
                Ok(Some((head, payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Decoder for response header blocks.
///
/// The status line must split into exactly version, code and reason. Leading
/// CRLF pairs before the status line are discarded: the not-found framing of
/// this protocol subset leads with a blank line and must still parse.
pub struct ResponseHeadDecoder;

impl Decoder for ResponseHeadDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.starts_with(b"\r\n") {
            src.advance(2);
        }

        // shortest parseable status line is "HTTP/1.1 200 OK" plus terminators
        if src.len() < 15 {
            return Ok(None);
        }

        let mut parsed_headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut resp = httparse::Response::new(&mut parsed_headers);

        let parsed_result = resp.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            Error::Version => ParseError::InvalidVersion(None),
            Error::HeaderName | Error::HeaderValue => ParseError::invalid_header(e.to_string()),
            e => ParseError::invalid_start_line(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(header_size = body_offset, "parsed response head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                let header_count = resp.headers.len();
                ensure!(header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(header_count));

                let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
                HeaderIndex::record(src, resp.headers, &mut header_index);

                let version = match resp.version {
                    Some(1) => http::Version::HTTP_11,
                    v => return Err(ParseError::InvalidVersion(v)),
                };

                let code = resp.code.ok_or_else(|| ParseError::invalid_start_line("missing status code"))?;
                let status = StatusCode::from_u16(code)
                    .map_err(|_| ParseError::invalid_start_line(format!("status code {code} out of range")))?;

                let mut head_builder = Response::builder().status(status).version(version);

                let headers = head_builder.headers_mut().expect("builder valid after status line checks");
                build_headers(src, body_offset, &header_index[..header_count], headers)?;

                let head: ResponseHead =
                    head_builder.body(()).map_err(|e| ParseError::invalid_start_line(e.to_string()))?;

                let payload_size = content_length(head.headers())?;
                Ok(Some((head, payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Byte ranges of one header's name and value within the source buffer.
///
/// Recording positions instead of keeping `httparse`'s borrowed slices lets
/// the decoder split the header block off the buffer afterwards.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

const EMPTY_HEADER_INDEX_ARRAY: [HeaderIndex; MAX_HEADER_NUM] = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];

impl HeaderIndex {
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, index) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            index.name = (name_start, name_start + header.name.len());
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            index.value = (value_start, value_start + header.value.len());
        }
    }
}

/// Splits the header block off `src` and rebuilds the fields into `headers`.
fn build_headers(
    src: &mut BytesMut,
    body_offset: usize,
    header_index: &[HeaderIndex],
    headers: &mut HeaderMap,
) -> Result<(), ParseError> {
    headers.reserve(header_index.len());

    let header_bytes = src.split_to(body_offset).freeze();
    for index in header_index {
        let name = HeaderName::from_bytes(&header_bytes[index.name.0..index.name.1])
            .map_err(|e| ParseError::invalid_header(e.to_string()))?;
        let value = HeaderValue::from_maybe_shared(header_bytes.slice(index.value.0..index.value.1))
            .map_err(|e| ParseError::invalid_header(e.to_string()))?;
        headers.append(name, value);
    }
    Ok(())
}

/// Determines the declared payload size of a frame.
///
/// A present `Content-Length` must parse as a non-negative integer; an
/// absent one means the frame has no body. `httparse` has already trimmed
/// surrounding whitespace from the value.
fn content_length(headers: &HeaderMap) -> Result<PayloadSize, ParseError> {
    match headers.get(http::header::CONTENT_LENGTH) {
        None => Ok(PayloadSize::new_empty()),
        Some(value) => {
            let text = value.to_str().map_err(|_| ParseError::invalid_content_length("value is not visible ascii"))?;
            let length = text
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::invalid_content_length(format!("value {text} is not a non-negative integer")))?;
            Ok(PayloadSize::new_length(length))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn request_head_complete() {
        let mut buf = BytesMut::from(
            &b"GET /hello.txt HTTP/1.1\r\nHost:127.0.0.1:8000\r\nConnection:keep-alive\r\n\r\n"[..],
        );

        let (head, payload_size) = RequestHeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());
        assert_eq!(head.method(), &Method::GET);
        assert_eq!(head.uri().path(), "/hello.txt");
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "127.0.0.1:8000");
        assert_eq!(head.headers().get(http::header::CONNECTION).unwrap(), "keep-alive");
        assert!(buf.is_empty());
    }

    #[test]
    fn request_head_leaves_body_bytes() {
        let mut buf = BytesMut::from(
            &b"POST /notes.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello GET /next HTTP/1.1"[..],
        );

        let (head, payload_size) = RequestHeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.method(), &Method::POST);
        assert_eq!(payload_size, PayloadSize::Length(5));
        assert_eq!(&buf[..], b"hello GET /next HTTP/1.1");
    }

    #[test]
    fn request_head_partial_until_terminator() {
        let full = b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n";

        // the header terminator may arrive split across any delivery boundary
        for split in 15..full.len() {
            let mut buf = BytesMut::from(&full[..split]);
            assert!(RequestHeadDecoder.decode(&mut buf).unwrap().is_none(), "split at {split}");

            buf.extend_from_slice(&full[split..]);
            let (head, payload_size) = RequestHeadDecoder.decode(&mut buf).unwrap().unwrap();
            assert_eq!(head.uri().path(), "/hello.txt");
            assert!(payload_size.is_empty());
        }
    }

    #[test]
    fn request_head_rejects_bad_start_line() {
        let mut buf = BytesMut::from(&b"\x01garbage line without structure\r\n\r\n"[..]);
        let result = RequestHeadDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::InvalidStartLine { .. })));
    }

    #[test]
    fn request_head_rejects_non_numeric_content_length() {
        let mut buf = BytesMut::from(&b"POST /a.txt HTTP/1.1\r\nContent-Length: eleven\r\n\r\n"[..]);
        let result = RequestHeadDecoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn response_head_with_length() {
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 200 OK\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nhello world"[..],
        );

        let (head, payload_size) = ResponseHeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(payload_size, PayloadSize::Length(11));
        assert_eq!(head.headers().get(http::header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(&buf[..], b"hello world");
    }

    #[test]
    fn response_head_skips_leading_blank_line() {
        // the not-found framing leads with a CRLF pair
        let mut buf = BytesMut::from(&b"\r\n\r\nHTTP/1.1 404 Not Found\r\n\r\n"[..]);

        let (head, payload_size) = ResponseHeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.status(), StatusCode::NOT_FOUND);
        assert!(payload_size.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn response_head_partial() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Le"[..]);
        assert!(ResponseHeadDecoder.decode(&mut buf).unwrap().is_none());
    }
}
