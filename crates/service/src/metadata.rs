//! The declarative description of a service method.
//!
//! [`MethodMetadata`] is plain data: building one never fails. Everything is checked when the
//! method is compiled by [`RequestFactory::parse`](crate::RequestFactory::parse), which turns
//! mistakes into [`ConfigurationError`](crate::ConfigurationError)s naming the method.
//!
//! ```
//! use micro_service::{MethodMetadata, ParameterKind, TypeRef};
//!
//! let metadata = MethodMetadata::builder("getUser")
//!     .get("users/{id}")
//!     .header("Accept: application/json")
//!     .param(ParameterKind::path("id"))
//!     .param(ParameterKind::query("fields"))
//!     .returns(TypeRef::call(TypeRef::named("User")))
//!     .build();
//!
//! assert_eq!(metadata.name(), "getUser");
//! assert_eq!(metadata.parameters().len(), 2);
//! ```

use http::Method;

use crate::type_ref::TypeRef;

/// Where one call-site argument goes in the request.
///
/// `encoded` marks values that are already percent-encoded and must be used verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Replaces `{name}` in the relative URL.
    Path { name: String, encoded: bool },
    /// Adds `name=value` to the query string, once per value.
    Query { name: String, encoded: bool },
    /// Adds the value itself, without `=`, to the query string.
    QueryName { encoded: bool },
    /// Adds every pair of the value to the query string.
    QueryMap { encoded: bool },
    Header { name: String },
    HeaderMap,
    /// A form field; requires form encoding.
    Field { name: String, encoded: bool },
    FieldMap { encoded: bool },
    Body,
    /// The whole request URL, resolved against the base URL.
    Url,
}

impl ParameterKind {
    pub fn path<S: Into<String>>(name: S) -> Self {
        ParameterKind::Path { name: name.into(), encoded: false }
    }

    pub fn encoded_path<S: Into<String>>(name: S) -> Self {
        ParameterKind::Path { name: name.into(), encoded: true }
    }

    pub fn query<S: Into<String>>(name: S) -> Self {
        ParameterKind::Query { name: name.into(), encoded: false }
    }

    pub fn encoded_query<S: Into<String>>(name: S) -> Self {
        ParameterKind::Query { name: name.into(), encoded: true }
    }

    pub fn query_name() -> Self {
        ParameterKind::QueryName { encoded: false }
    }

    pub fn query_map() -> Self {
        ParameterKind::QueryMap { encoded: false }
    }

    pub fn header<S: Into<String>>(name: S) -> Self {
        ParameterKind::Header { name: name.into() }
    }

    pub fn header_map() -> Self {
        ParameterKind::HeaderMap
    }

    pub fn field<S: Into<String>>(name: S) -> Self {
        ParameterKind::Field { name: name.into(), encoded: false }
    }

    pub fn field_map() -> Self {
        ParameterKind::FieldMap { encoded: false }
    }

    pub fn body() -> Self {
        ParameterKind::Body
    }

    pub fn url() -> Self {
        ParameterKind::Url
    }

    /// A short label used in error messages.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            ParameterKind::Path { .. } => "Path",
            ParameterKind::Query { .. } => "Query",
            ParameterKind::QueryName { .. } => "QueryName",
            ParameterKind::QueryMap { .. } => "QueryMap",
            ParameterKind::Header { .. } => "Header",
            ParameterKind::HeaderMap => "HeaderMap",
            ParameterKind::Field { .. } => "Field",
            ParameterKind::FieldMap { .. } => "FieldMap",
            ParameterKind::Body => "Body",
            ParameterKind::Url => "Url",
        }
    }
}

/// One HTTP method declaration: the verb, its relative URL and whether it carries a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMethod {
    pub method: Method,
    pub relative_url: Option<String>,
    pub has_body: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    name: String,
    http_methods: Vec<HttpMethod>,
    headers: Vec<String>,
    parameters: Vec<ParameterKind>,
    return_type: TypeRef,
    form_encoded: bool,
}

impl MethodMetadata {
    pub fn builder<S: Into<String>>(name: S) -> MethodMetadataBuilder {
        MethodMetadataBuilder::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every HTTP method declared, in declaration order. A valid method has exactly one.
    pub fn http_methods(&self) -> &[HttpMethod] {
        &self.http_methods
    }

    /// Static headers, each in the `Name: Value` form.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn parameters(&self) -> &[ParameterKind] {
        &self.parameters
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    pub fn is_form_encoded(&self) -> bool {
        self.form_encoded
    }
}

#[derive(Debug)]
pub struct MethodMetadataBuilder {
    metadata: MethodMetadata,
}

impl MethodMetadataBuilder {
    fn new(name: String) -> Self {
        Self {
            metadata: MethodMetadata {
                name,
                http_methods: vec![],
                headers: vec![],
                parameters: vec![],
                return_type: TypeRef::Unit,
                form_encoded: false,
            },
        }
    }

    /// Declares a method with any verb. An empty `relative_url` declares none, for use with a
    /// [`ParameterKind::Url`] parameter.
    #[must_use]
    pub fn http<S: Into<String>>(mut self, method: Method, relative_url: S, has_body: bool) -> Self {
        let relative_url = relative_url.into();
        let relative_url = if relative_url.is_empty() { None } else { Some(relative_url) };
        self.metadata.http_methods.push(HttpMethod { method, relative_url, has_body });
        self
    }

    #[must_use]
    pub fn get<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::GET, relative_url, false)
    }

    #[must_use]
    pub fn head<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::HEAD, relative_url, false)
    }

    #[must_use]
    pub fn delete<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::DELETE, relative_url, false)
    }

    #[must_use]
    pub fn options<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::OPTIONS, relative_url, false)
    }

    #[must_use]
    pub fn post<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::POST, relative_url, true)
    }

    #[must_use]
    pub fn put<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::PUT, relative_url, true)
    }

    #[must_use]
    pub fn patch<S: Into<String>>(self, relative_url: S) -> Self {
        self.http(Method::PATCH, relative_url, true)
    }

    /// Adds a static header written as `Name: Value`.
    #[must_use]
    pub fn header<S: Into<String>>(mut self, header: S) -> Self {
        self.metadata.headers.push(header.into());
        self
    }

    /// Declares the next parameter; parameters are positional.
    #[must_use]
    pub fn param(mut self, kind: ParameterKind) -> Self {
        self.metadata.parameters.push(kind);
        self
    }

    #[must_use]
    pub fn form_url_encoded(mut self) -> Self {
        self.metadata.form_encoded = true;
        self
    }

    #[must_use]
    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.metadata.return_type = return_type;
        self
    }

    pub fn build(self) -> MethodMetadata {
        self.metadata
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::{MethodMetadata, ParameterKind};
    use crate::type_ref::TypeRef;

    #[test]
    fn builder_collects_everything() {
        let metadata = MethodMetadata::builder("createUser")
            .post("users")
            .header("X-Client: micro")
            .form_url_encoded()
            .param(ParameterKind::field("name"))
            .param(ParameterKind::field_map())
            .returns(TypeRef::call(TypeRef::named("User")))
            .build();

        assert_eq!(metadata.http_methods().len(), 1);
        let declared = &metadata.http_methods()[0];
        assert_eq!(declared.method, Method::POST);
        assert_eq!(declared.relative_url.as_deref(), Some("users"));
        assert!(declared.has_body);
        assert!(metadata.is_form_encoded());
        assert_eq!(metadata.headers(), &["X-Client: micro".to_string()]);
        assert_eq!(metadata.parameters()[1], ParameterKind::FieldMap { encoded: false });
    }

    #[test]
    fn empty_url_means_none() {
        let metadata = MethodMetadata::builder("fetch").get("").param(ParameterKind::url()).build();
        assert_eq!(metadata.http_methods()[0].relative_url, None);
        assert_eq!(metadata.return_type(), &TypeRef::Unit);
    }

    #[test]
    fn repeated_verbs_are_kept() {
        let metadata = MethodMetadata::builder("confused").get("a").post("b").build();
        assert_eq!(metadata.http_methods().len(), 2);
    }
}
