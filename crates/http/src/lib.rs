//! A minimal asynchronous HTTP/1.1 framing engine
//!
//! This crate implements a small subset of HTTP/1.1 request/response framing
//! directly over raw byte streams, on both the serving and the requesting
//! side. It is built on tokio and does the byte accounting itself: arbitrary,
//! arbitrarily-chunked deliveries are assembled into complete, length-correct
//! messages, and a message's body is never read past its declared
//! `Content-Length` (trailing bytes belong to the next message on a
//! kept-alive connection).
//!
//! # Features
//!
//! - Complete-frame assembly tolerant of 1-byte deliveries
//! - `Content-Length` framed bodies (no chunked transfer encoding)
//! - Unconditional keep-alive connection loop
//! - Per-connection receive timeout, fixed at accept time
//! - Symmetric requesting-side framing via [`connection::ClientConnection`]
//! - Discriminated error kinds instead of a generic failure
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! use wire_http::connection::HttpConnection;
//! use wire_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8000").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(echo));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = Arc::clone(&handler);
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer, Duration::from_secs(20));
//!             match connection.process(handler).await {
//!                 Ok(()) => info!("finished process, connection shutdown"),
//!                 Err(e) => error!("connection has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn echo(request: Request<Bytes>) -> Result<Response<Bytes>, std::io::Error> {
//!     let body = request.into_body();
//!     Ok(Response::builder().status(StatusCode::OK).body(body).unwrap())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: message, head and error types
//! - [`codec`]: framing encoders/decoders over `tokio_util::codec`
//! - [`connection`]: per-connection lifecycle for both roles
//! - [`handler`]: dispatch trait consumed by the serving side
//!
//! # Limitations
//!
//! - HTTP/1.1 only, `Content-Length` framing only (no chunked bodies,
//!   no pipelining, no compression, no TLS)
//! - Maximum header block size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
