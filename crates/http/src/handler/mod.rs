//! Dispatch trait consumed by the serving side.
//!
//! A [`Handler`] receives one complete request frame and produces one
//! complete response frame. Returning an error makes the connection send
//! the coarse not-found fallback and close; a missing resource is not an
//! error but an ordinary 404 response, which keeps the connection alive.

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;

use bytes::Bytes;
use http::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, request: Request<Bytes>) -> Result<Response<Bytes>, Self::Error>;
}

/// A [`Handler`] built from an async function, for tests and small servers.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<Bytes>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, request: Request<Bytes>) -> Result<Response<Bytes>, Self::Error> {
        (self.f)(request).await
    }
}

pub fn make_handler<F, Err, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<Bytes>, Err>> + Send,
{
    HandlerFn { f }
}
