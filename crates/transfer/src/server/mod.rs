//! The serving side: accept loop, worker pool, file service.
//!
//! Each accepted connection claims a pool slot, gets a receive timeout
//! computed from the pool's load at that moment, and runs in its own task
//! until it finishes. Connection failures never reach the accept loop; the
//! task logs the outcome and releases its slot.

mod file_service;
mod pool;

pub use file_service::{FileService, ServiceError};
pub use pool::{DEFAULT_CAPACITY, PoolPermit, WorkerPool};

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use wire_http::connection::HttpConnection;

use crate::content_type::ContentTypeTable;
use crate::storage::Storage;

pub struct ServerBuilder {
    address: Option<Vec<SocketAddr>>,
    root: Option<PathBuf>,
    capacity: usize,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, root: None, capacity: DEFAULT_CAPACITY }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = address.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>()).ok();
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?;
        let root = self.root.ok_or(ServerBuildError::MissingRoot)?;
        Ok(Server { address, root, capacity: self.capacity })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set and resolvable")]
    MissingAddress,
    #[error("resource root must be set")]
    MissingRoot,
}

pub struct Server {
    address: Vec<SocketAddr>,
    root: PathBuf,
    capacity: usize,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the configured address and serves until the process ends.
    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.address.as_slice()).await?;
        info!(address = %listener.local_addr()?, "start listening");
        self.serve(listener).await
    }

    /// Serves connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        let storage = Storage::new(self.root);
        let service = Arc::new(FileService::new(storage, ContentTypeTable::default()));
        let pool = Arc::new(WorkerPool::new(self.capacity));

        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            // timeout reflects the load this connection is joining; it is
            // fixed for the connection's whole lifetime
            let read_timeout = pool.adaptive_timeout();
            let permit = pool.acquire();
            info!(peer = %remote_addr, timeout = ?read_timeout, available = pool.available(), "accepted connection");

            let service = Arc::clone(&service);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer, read_timeout);
                match connection.process(service).await {
                    Ok(()) => info!(peer = %remote_addr, "connection finished"),
                    Err(e) if e.is_connection_closed() => {
                        debug!(peer = %remote_addr, "peer closed connection");
                    }
                    Err(e) => warn!(peer = %remote_addr, cause = %e, "connection ended with error"),
                }
                drop(permit);
            });
        }
    }
}
