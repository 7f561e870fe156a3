use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use http::{Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::connection::read_frame;
use crate::handler::Handler;
use crate::protocol::{HttpError, Message, PayloadItem, PayloadSize};

use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info};

/// The serving side of one connection.
///
/// Owns the connection for its whole lifetime and drives the keep-alive
/// loop: read one complete request frame, dispatch it through the handler,
/// write one response frame, repeat. The receive timeout is fixed when the
/// connection is accepted and bounds every underlying delivery; writes are
/// not timeout-bounded.
///
/// The loop ends when the peer closes, the timeout elapses, the peer
/// violates the framing contract, or dispatch fails. On a framing violation
/// or dispatch failure the not-found framing is sent before closing — a
/// deliberately coarse fallback of this protocol subset, not real error
/// signaling.
///
/// # Type Parameters
///
/// * `R`: the readable half of the transport
/// * `W`: the writable half of the transport
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    read_timeout: Duration,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, read_timeout: Duration) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            read_timeout,
        }
    }

    /// Runs the connection to completion.
    ///
    /// `Ok(())` means the peer finished cleanly on a frame boundary. Any
    /// error already terminated the connection; the caller only has to
    /// release its bookkeeping.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            let request = match read_frame(&mut self.framed_read, Some(self.read_timeout)).await {
                Ok(Some((head, body))) => head.body(body),
                Ok(None) => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
                Err(e) if e.is_connection_closed() || matches!(e, HttpError::Timeout) => {
                    return Err(e);
                }
                Err(e) => {
                    error!("can't receive next request, cause {}", e);
                    // coarse fallback framing before closing; best effort
                    let _ = self.write_response(not_found_response()).await;
                    return Err(e);
                }
            };

            match handler.call(request).await {
                Ok(response) => self.write_response(response).await?,
                Err(e) => {
                    let e = HttpError::handler(e);
                    error!("handle request error, cause: {}", e);
                    let _ = self.write_response(not_found_response()).await;
                    return Err(e);
                }
            }
        }
    }

    /// Frames the whole response and flushes it as one write.
    async fn write_response(&mut self, response: Response<Bytes>) -> Result<(), HttpError> {
        let (parts, body) = response.into_parts();

        let payload_size = if body.is_empty() {
            PayloadSize::Empty
        } else {
            PayloadSize::Length(body.len() as u64)
        };

        let head = Response::from_parts(parts, ());
        self.framed_write.feed(Message::Header((head, payload_size))).await?;
        if !body.is_empty() {
            self.framed_write.feed(Message::Payload(PayloadItem::Chunk(body))).await?;
        }
        // send (not feed) flushes the buffered frame to the transport
        self.framed_write.send(Message::Payload(PayloadItem::Eof)).await?;

        Ok(())
    }
}

fn not_found_response() -> Response<Bytes> {
    Response::builder().status(StatusCode::NOT_FOUND).body(Bytes::new()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use http::{Method, Request};
    use std::io;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    async fn serve(request: Request<Bytes>) -> Result<Response<Bytes>, io::Error> {
        match *request.method() {
            Method::GET => {
                let body = Bytes::from_static(b"hello world");
                let response = Response::builder()
                    .status(StatusCode::OK)
                    .header(http::header::CONNECTION, "keep-alive")
                    .header(http::header::CONTENT_TYPE, "text/plain")
                    .header(http::header::CONTENT_LENGTH, body.len())
                    .body(body)
                    .unwrap();
                Ok(response)
            }
            Method::POST => Ok(Response::builder().status(StatusCode::OK).body(Bytes::new()).unwrap()),
            _ => Err(io::Error::other("unsupported method")),
        }
    }

    #[tokio::test]
    async fn one_byte_deliveries_assemble_a_full_frame() {
        let (client, server) = duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let connection = HttpConnection::new(server_read, server_write, Duration::from_secs(5));
        let task = tokio::spawn(connection.process(Arc::new(make_handler(serve))));

        let request = b"POST /hello.txt HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        for &byte in request.iter() {
            client_write.write_all(&[byte]).await.unwrap();
            client_write.flush().await.unwrap();
        }

        let mut response = [0u8; 19];
        client_read.read_exact(&mut response).await.unwrap();
        assert_eq!(&response, b"HTTP/1.1 200 OK\r\n\r\n");

        client_write.shutdown().await.unwrap();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn keep_alive_sequences_two_exchanges() {
        let (client, server) = duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let connection = HttpConnection::new(server_read, server_write, Duration::from_secs(5));
        let task = tokio::spawn(connection.process(Arc::new(make_handler(serve))));

        client_write
            .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\nGET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let expected =
            b"HTTP/1.1 200 OK\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nhello world";
        let mut response = vec![0u8; expected.len() * 2];
        client_read.read_exact(&mut response).await.unwrap();

        let mut both = Vec::new();
        both.extend_from_slice(expected);
        both.extend_from_slice(expected);
        assert_eq!(response, both);

        client_write.shutdown().await.unwrap();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (client, server) = duplex(64);
        let (server_read, server_write) = tokio::io::split(server);

        let connection = HttpConnection::new(server_read, server_write, Duration::from_millis(50));
        let result = connection.process(Arc::new(make_handler(serve))).await;

        assert!(matches!(result, Err(HttpError::Timeout)));
        drop(client);
    }

    #[tokio::test]
    async fn malformed_request_gets_not_found_framing_then_close() {
        let (client, server) = duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let connection = HttpConnection::new(server_read, server_write, Duration::from_secs(5));
        let task = tokio::spawn(connection.process(Arc::new(make_handler(serve))));

        client_write
            .write_all(b"GET /hello.txt HTTP/1.1\r\nContent-Length: nonsense\r\n\r\n")
            .await
            .unwrap();

        let mut response = Vec::new();
        client_read.read_to_end(&mut response).await.unwrap();
        assert_eq!(&response[..], b"\r\n\r\nHTTP/1.1 404 Not Found\r\n\r\n");

        assert!(task.await.unwrap().is_err());
    }
}
