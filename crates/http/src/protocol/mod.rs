//! Core protocol types for the framing engine.
//!
//! This module provides the building blocks the codec and connection layers
//! work with:
//!
//! - **Message handling** ([`message`]): the framing vocabulary
//!   - [`Message`]: either a parsed head or a payload item
//!   - [`PayloadItem`]: one body chunk, or end of body
//!   - [`PayloadSize`]: the declared body length of a frame
//!
//! - **Heads**: [`RequestHead`] and [`ResponseHead`] wrap the `http` crate's
//!   request/response types with the body left unattached
//!
//! - **Errors** ([`error`]): discriminated error kinds
//!   - [`HttpError`]: top-level connection error
//!   - [`ParseError`]: framing-contract violations while reading
//!   - [`SendError`]: failures while emitting a frame
//!
//! A frame, once assembled by the connection layer, is an ordinary
//! `http::Request<Bytes>` or `http::Response<Bytes>` whose body length equals
//! the declared `Content-Length` exactly.

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
