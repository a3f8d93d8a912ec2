//! Outgoing request value object.
//!
//! A [`Request`] is built once, by hand through [`RequestBuilder`] or by a request factory,
//! and never mutated afterwards. Cloning it is cheap: the body is reference counted.

use http::header::{HeaderName, HeaderValue};
use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version};

use crate::protocol::body::RequestBody;

/// An immutable HTTP request.
///
/// Headers live in a [`HeaderMap`], so lookups are case-insensitive and repeated values of one
/// name keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Starts a builder carrying a copy of this request.
    pub fn to_builder(&self) -> RequestBuilder {
        let mut builder = Request::builder().method(self.method.clone()).uri(self.uri.clone()).version(self.version);
        if let Some(headers) = builder.inner.headers_mut() {
            headers.clone_from(&self.headers);
        }
        builder.body = self.body.clone();
        builder
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of the header, if any.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

/// Converts a parsed request into a [`Request`], dropping its extensions.
impl From<http::Request<Option<RequestBody>>> for Request {
    fn from(request: http::Request<Option<RequestBody>>) -> Self {
        let (parts, body) = request.into_parts();
        let Parts { method, uri, version, headers, .. } = parts;
        Self { method, uri, version, headers, body }
    }
}

/// Builder for [`Request`], backed by [`http::request::Builder`].
#[derive(Debug)]
pub struct RequestBuilder {
    inner: http::request::Builder,
    body: Option<RequestBody>,
}

impl RequestBuilder {
    fn new() -> Self {
        Self { inner: http::Request::builder(), body: None }
    }

    #[must_use]
    pub fn method<T>(mut self, method: T) -> Self
    where
        Method: TryFrom<T>,
        <Method as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.method(method);
        self
    }

    #[must_use]
    pub fn uri<T>(mut self, uri: T) -> Self
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.uri(uri);
        self
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.inner = self.inner.version(version);
        self
    }

    /// Appends a header, keeping earlier values of the same name.
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

    /// Copies in every header of `headers`, replacing earlier values of the same names.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        if let Some(current) = self.inner.headers_mut() {
            current.extend(headers);
        }
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> Result<Request, http::Error> {
        self.inner.body(self.body).map(Request::from)
    }
}
