//! Incoming response value object.
//!
//! The head of a [`Response`] (status, version, headers) is immutable. The body is a
//! [`ResponseBody`] handle owned by whoever holds the response, released when dropped.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::response::Parts;
use http::{HeaderMap, StatusCode, Version};

use crate::protocol::body::ResponseBody;
use crate::protocol::{Request, TransportError};

/// The header portion of a response, before a body is attached.
pub type ResponseHead = http::Response<()>;

#[derive(Debug)]
pub struct Response {
    head: Parts,
    body: ResponseBody,
    request: Request,
}

impl Response {
    pub fn new(request: Request, head: ResponseHead, body: ResponseBody) -> Self {
        let (head, ()) = head.into_parts();
        Self { head, body, request }
    }

    /// Starts a builder for a response answering `request`.
    pub fn builder(request: Request) -> ResponseBuilder {
        ResponseBuilder { request, inner: http::Response::builder() }
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// Returns true for 2xx statuses.
    pub fn is_successful(&self) -> bool {
        self.head.status.is_success()
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&HeaderValue> {
        self.head.headers.get(name)
    }

    /// Parses the `Content-Type` header, if present and well formed.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.header(http::header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// The request that produced this response.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// Reads the whole body, consuming the response.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body.bytes().await
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Splits the response, handing ownership of the body to the caller.
    pub fn into_parts(self) -> (ResponseHead, ResponseBody, Request) {
        (http::Response::from_parts(self.head, ()), self.body, self.request)
    }
}

/// Builder for [`Response`], backed by [`http::response::Builder`].
#[derive(Debug)]
pub struct ResponseBuilder {
    request: Request,
    inner: http::response::Builder,
}

impl ResponseBuilder {
    #[must_use]
    pub fn status<T>(mut self, status: T) -> Self
    where
        StatusCode: TryFrom<T>,
        <StatusCode as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.status(status);
        self
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.inner = self.inner.version(version);
        self
    }

    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    pub fn body(self, body: impl Into<ResponseBody>) -> Result<Response, http::Error> {
        let head = self.inner.body(())?;
        Ok(Response::new(self.request, head, body.into()))
    }
}
