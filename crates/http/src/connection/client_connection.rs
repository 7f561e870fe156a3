use std::io;

use bytes::Bytes;
use futures::SinkExt;
use http::{Request, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::connection::read_frame;
use crate::protocol::{HttpError, Message, PayloadItem, PayloadSize};

use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

/// The requesting side of one connection.
///
/// Writes request frames and assembles response frames under the same
/// framing contract as the serving side, in reverse role. There is no
/// receive timeout on this side; a missing reply surfaces as the peer
/// closing the connection.
pub struct ClientConnection<R, W> {
    framed_read: FramedRead<R, ResponseDecoder>,
    framed_write: FramedWrite<W, RequestEncoder>,
}

impl ClientConnection<OwnedReadHalf, OwnedWriteHalf> {
    /// Opens a TCP connection to `host:port`.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!(host, port, "connected");
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer))
    }
}

impl<R, W> ClientConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, ResponseDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, RequestEncoder::new()),
        }
    }

    /// Frames the whole request and flushes it as one write.
    pub async fn send_request(&mut self, request: Request<Bytes>) -> Result<(), HttpError> {
        let (parts, body) = request.into_parts();

        let payload_size = if body.is_empty() {
            PayloadSize::Empty
        } else {
            PayloadSize::Length(body.len() as u64)
        };

        let head = Request::from_parts(parts, ()).into();
        self.framed_write.feed(Message::Header((head, payload_size))).await?;
        if !body.is_empty() {
            self.framed_write.feed(Message::Payload(PayloadItem::Chunk(body))).await?;
        }
        self.framed_write.send(Message::Payload(PayloadItem::Eof)).await?;

        Ok(())
    }

    /// Reads one complete response frame.
    ///
    /// The requesting side always expects a reply, so the peer closing
    /// before a full frame arrives is [`HttpError::ConnectionClosed`].
    pub async fn read_response(&mut self) -> Result<Response<Bytes>, HttpError> {
        match read_frame(&mut self.framed_read, None).await? {
            Some((head, body)) => Ok(head.map(|()| body)),
            None => Err(HttpError::connection_closed("no response before close")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test]
    async fn request_framing_and_response_assembly() {
        let (client, server) = duplex(1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (mut server_read, mut server_write) = tokio::io::split(server);

        let mut connection = ClientConnection::new(client_read, client_write);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/hello.txt")
            .header(http::header::HOST, "127.0.0.1:8000")
            .header(http::header::CONNECTION, "keep-alive")
            .body(Bytes::new())
            .unwrap();
        connection.send_request(request).await.unwrap();

        let expected = b"GET /hello.txt HTTP/1.1\r\nHost: 127.0.0.1:8000\r\nConnection: keep-alive\r\n\r\n";
        let mut sent = vec![0u8; expected.len()];
        server_read.read_exact(&mut sent).await.unwrap();
        assert_eq!(sent, expected);

        // reply dribbles in small pieces; assembly must not care
        let reply =
            b"HTTP/1.1 200 OK\r\nConnection: keep-alive\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nhello world";
        for piece in reply.chunks(7) {
            server_write.write_all(piece).await.unwrap();
            server_write.flush().await.unwrap();
        }

        let response = connection.read_response().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn close_before_reply_is_connection_closed() {
        let (client, server) = duplex(64);
        let (client_read, client_write) = tokio::io::split(client);

        let mut connection = ClientConnection::new(client_read, client_write);
        drop(server);

        let result = connection.read_response().await;
        assert!(matches!(result, Err(HttpError::ConnectionClosed { .. })));
    }
}
