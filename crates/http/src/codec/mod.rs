//! Framing codecs for the HTTP/1.1 subset.
//!
//! Decoding and encoding are both split into a head phase and a payload
//! phase, coordinated by small state machines:
//!
//! - Serving side: [`RequestDecoder`] reads requests, [`ResponseEncoder`]
//!   writes responses
//! - Requesting side: [`ResponseDecoder`] reads responses, [`RequestEncoder`]
//!   writes requests
//!
//! The decoders yield a [`Message::Header`] first and then payload chunks
//! until EOF; they tolerate deliveries of any size, down to a single byte,
//! and never consume bytes past a frame's declared `Content-Length`.
//!
//! [`Message::Header`]: crate::protocol::Message::Header

mod body;
mod header;
mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
pub use response_encoder::ResponseEncoder;

/// The exact bytes of the not-found response.
///
/// The leading CRLF pair is not valid HTTP, but deployed peers of this
/// protocol subset expect the sequence byte-for-byte, so it is reproduced
/// verbatim and must not be corrected.
pub const NOT_FOUND_RESPONSE: &[u8] = b"\r\n\r\nHTTP/1.1 404 Not Found\r\n\r\n";
