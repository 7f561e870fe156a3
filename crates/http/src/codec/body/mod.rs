//! Body framing for `Content-Length` delimited payloads.
//!
//! The decoders hand out body bytes as they arrive and stop exactly at the
//! declared length; the encoders write exactly the declared length. Frames
//! without a body short-circuit to EOF. There is no chunked transfer
//! encoding in this protocol subset.

mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
