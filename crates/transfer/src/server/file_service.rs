//! Fetch/store dispatch against the storage root.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, header};
use thiserror::Error;
use tracing::info;

use wire_http::handler::Handler;

use crate::content_type::ContentTypeTable;
use crate::storage::Storage;

/// Serves fetch and store requests from one directory root.
///
/// A fetch of a missing resource is a normal 404 branch, not an error; the
/// connection keeps going. Anything the dispatch cannot handle — storage
/// failures, methods outside the subset — is an error, which makes the
/// connection send the coarse not-found fallback and close.
#[derive(Debug)]
pub struct FileService {
    storage: Storage,
    content_types: ContentTypeTable,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("unsupported method: {0}")]
    UnsupportedMethod(Method),
}

impl FileService {
    pub fn new(storage: Storage, content_types: ContentTypeTable) -> Self {
        Self { storage, content_types }
    }

    async fn fetch(&self, target: &str) -> Result<Response<Bytes>, ServiceError> {
        if !self.storage.exists(target).await {
            info!(target, "resource not found");
            return Ok(not_found_response());
        }

        let data = self.storage.read_all(target).await?;
        let content_type = self.content_types.classify(target);
        info!(target, bytes = data.len(), content_type = %content_type, "serving resource");

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONNECTION, "keep-alive")
            .header(header::CONTENT_TYPE, content_type.as_ref())
            .header(header::CONTENT_LENGTH, data.len())
            .body(Bytes::from(data))
            .unwrap();
        Ok(response)
    }

    async fn store(&self, target: &str, body: Bytes) -> Result<Response<Bytes>, ServiceError> {
        let binary = self.content_types.is_binary(target);
        self.storage.write_all(target, &body, binary).await?;
        info!(target, bytes = body.len(), binary, "stored resource");

        Ok(Response::builder().status(StatusCode::OK).body(Bytes::new()).unwrap())
    }
}

#[async_trait]
impl Handler for FileService {
    type Error = ServiceError;

    async fn call(&self, request: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        let target = request.uri().path().to_owned();

        match *request.method() {
            Method::GET => self.fetch(&target).await,
            Method::POST => self.store(&target, request.into_body()).await,
            ref method => Err(ServiceError::UnsupportedMethod(method.clone())),
        }
    }
}

fn not_found_response() -> Response<Bytes> {
    Response::builder().status(StatusCode::NOT_FOUND).body(Bytes::new()).unwrap()
}
