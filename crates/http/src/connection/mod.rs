//! Per-connection lifecycle for both protocol roles.
//!
//! - [`HttpConnection`]: serving side — reads request frames, dispatches
//!   them through a [`Handler`], writes response frames, loops under the
//!   keep-alive contract until error, timeout or peer close
//! - [`ClientConnection`]: requesting side — writes request frames and
//!   assembles response frames with the same framing contract in reverse
//!
//! Frame assembly is shared: [`read_frame`] drives a framed byte stream
//! until one complete message (head plus exactly the declared body length)
//! is available, whatever the chunking of the underlying deliveries.
//!
//! [`Handler`]: crate::handler::Handler

mod client_connection;
mod http_connection;

pub use client_connection::ClientConnection;
pub use http_connection::HttpConnection;

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize};

/// Reads one complete frame from a framed byte stream.
///
/// Returns the parsed head and the fully assembled body, whose length equals
/// the frame's declared `Content-Length` exactly. `Ok(None)` means the peer
/// closed on a frame boundary. When `read_timeout` is set, each underlying
/// delivery must arrive within it.
///
/// The peer closing mid-frame surfaces as [`HttpError::ConnectionClosed`];
/// bytes past the declared length are left unread for the next frame.
pub(crate) async fn read_frame<S, T>(
    framed: &mut S,
    read_timeout: Option<Duration>,
) -> Result<Option<(T, Bytes)>, HttpError>
where
    S: Stream<Item = Result<Message<(T, PayloadSize)>, ParseError>> + Unpin,
{
    let (head, payload_size) = match next_item(framed, read_timeout).await? {
        None => return Ok(None),
        Some(Message::Header(head_and_size)) => head_and_size,
        Some(Message::Payload(_)) => {
            return Err(ParseError::invalid_body("payload item before a head").into());
        }
    };

    let mut body = BytesMut::with_capacity(payload_size.len() as usize);
    loop {
        match next_item(framed, read_timeout).await? {
            None => return Err(HttpError::connection_closed("body incomplete")),
            Some(Message::Payload(PayloadItem::Chunk(bytes))) => body.extend_from_slice(&bytes),
            Some(Message::Payload(PayloadItem::Eof)) => break,
            Some(Message::Header(_)) => {
                return Err(ParseError::invalid_body("head inside a body").into());
            }
        }
    }

    Ok(Some((head, body.freeze())))
}

async fn next_item<S, I>(framed: &mut S, read_timeout: Option<Duration>) -> Result<Option<I>, HttpError>
where
    S: Stream<Item = Result<I, ParseError>> + Unpin,
{
    let item = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, framed.next()).await.map_err(|_| HttpError::Timeout)?,
        None => framed.next().await,
    };

    match item {
        Some(Ok(message)) => Ok(Some(message)),
        Some(Err(e)) => Err(to_http_error(e)),
        None => Ok(None),
    }
}

fn to_http_error(e: ParseError) -> HttpError {
    match e {
        ParseError::UnexpectedEof { context } => HttpError::connection_closed(context),
        e => e.into(),
    }
}
