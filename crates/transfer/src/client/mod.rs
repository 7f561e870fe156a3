//! The requesting side: an ordered command script driven over kept-alive
//! connections.
//!
//! The driver opens one connection to the first command's endpoint and
//! reuses it for consecutive commands; a command naming a different
//! host/port replaces the connection. Transport failures are fail-fast:
//! the remaining commands are abandoned and the error surfaces to the
//! caller. There are no retries.

mod command;

pub use command::{Command, CommandError, DEFAULT_PORT, Operation, parse_script};

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use http::{Method, Request, StatusCode, header};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{info, warn};

use wire_http::connection::ClientConnection;
use wire_http::protocol::HttpError;

use crate::content_type::ContentTypeTable;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("transport error: {source}")]
    Http {
        #[from]
        source: HttpError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("invalid resource path: {0}")]
    InvalidTarget(String),
}

/// Executes commands in order against their servers.
pub struct RequestDriver {
    storage: Storage,
    content_types: ContentTypeTable,
}

struct Session {
    connection: ClientConnection<OwnedReadHalf, OwnedWriteHalf>,
    host: String,
    port: u16,
}

impl RequestDriver {
    /// `root` is the local directory fetched resources are persisted to and
    /// stored resources are read from.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { storage: Storage::new(root), content_types: ContentTypeTable::default() }
    }

    pub async fn run(&self, commands: &[Command]) -> Result<(), DriverError> {
        let mut session: Option<Session> = None;

        for command in commands {
            // a different endpoint replaces the connection, otherwise the
            // kept-alive one is reused
            if session.as_ref().is_none_or(|s| s.host != command.host || s.port != command.port) {
                let connection = ClientConnection::connect(&command.host, command.port).await?;
                session = Some(Session { connection, host: command.host.clone(), port: command.port });
            }
            let session = session.as_mut().expect("session was just established");

            match command.operation {
                Operation::Fetch => self.fetch(session, command).await?,
                Operation::Store => self.store(session, command).await?,
            }
        }

        Ok(())
    }

    async fn fetch(&self, session: &mut Session, command: &Command) -> Result<(), DriverError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(request_target(&command.target))
            .header(header::HOST, authority(command))
            .header(header::CONNECTION, "keep-alive")
            .body(Bytes::new())
            .map_err(|_| DriverError::InvalidTarget(command.target.clone()))?;

        session.connection.send_request(request).await?;
        let response = session.connection.read_response().await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(target = %command.target, "resource not found on server, skipping");
            return Ok(());
        }

        // only responses that declare a body are persisted
        if response.headers().contains_key(header::CONTENT_LENGTH) {
            let binary = self.content_types.is_binary(&command.target);
            self.storage.write_all(&command.target, response.body(), binary).await?;
            info!(target = %command.target, bytes = response.body().len(), "fetched resource");
        }

        Ok(())
    }

    async fn store(&self, session: &mut Session, command: &Command) -> Result<(), DriverError> {
        if !self.storage.exists(&command.target).await {
            warn!(target = %command.target, "local resource not found, skipping");
            return Ok(());
        }

        let data = self.storage.read_all(&command.target).await?;
        let content_type = self.content_types.classify(&command.target);

        let request = Request::builder()
            .method(Method::POST)
            .uri(request_target(&command.target))
            .header(header::HOST, authority(command))
            .header(header::CONNECTION, "keep-alive")
            .header(header::CONTENT_TYPE, content_type.as_ref())
            .body(Bytes::from(data))
            .map_err(|_| DriverError::InvalidTarget(command.target.clone()))?;

        session.connection.send_request(request).await?;
        let response = session.connection.read_response().await?;

        if response.status() == StatusCode::OK {
            info!(target = %command.target, "stored resource");
        } else {
            warn!(target = %command.target, status = %response.status(), "store was not accepted");
        }

        Ok(())
    }
}

fn request_target(target: &str) -> String {
    format!("/{}", target.trim_start_matches('/'))
}

fn authority(command: &Command) -> String {
    format!("{}:{}", command.host, command.port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_target_is_rooted_once() {
        assert_eq!(request_target("hello.txt"), "/hello.txt");
        assert_eq!(request_target("/hello.txt"), "/hello.txt");
    }
}
