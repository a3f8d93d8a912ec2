//! Compiling method metadata into a request template, and binding arguments into requests.
//!
//! [`RequestFactory::parse`] runs once per declared method and performs every structural
//! check; [`RequestFactory::create`] runs once per invocation and only deals with the values.
//!
//! ```
//! use micro_service::{Arguments, BaseUrl, MethodMetadata, ParameterKind, RequestFactory, TypeRef};
//!
//! let base_url = BaseUrl::parse("https://api.example.test/").unwrap();
//! let metadata = MethodMetadata::builder("getUser")
//!     .get("users/{id}")
//!     .param(ParameterKind::path("id"))
//!     .returns(TypeRef::call(TypeRef::named("User")))
//!     .build();
//!
//! let factory = RequestFactory::parse(&base_url, &metadata).unwrap();
//! let request = factory.create(&Arguments::new().arg(42)).unwrap();
//! assert_eq!(request.uri(), "https://api.example.test/users/42");
//! ```

mod handler;
mod url;

pub use url::{BaseUrl, BaseUrlError};

use std::collections::HashSet;
use std::str::FromStr;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use mime::Mime;
use micro_call::protocol::Request;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::arguments::Arguments;
use crate::error::{ArgumentError, ConfigurationError};
use crate::metadata::{MethodMetadata, ParameterKind};
use handler::{Binding, ParameterHandler};

const PARAM: &str = "[a-zA-Z][a-zA-Z0-9_-]*";

static PARAM_URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\{{({PARAM})\}}")).expect("valid regex"));
static PARAM_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{PARAM}$")).expect("valid regex"));

/// The compiled, immutable request template of one declared method.
#[derive(Debug, Clone)]
pub struct RequestFactory {
    method_name: String,
    http_method: Method,
    base_url: BaseUrl,
    relative_url: Option<String>,
    headers: HeaderMap,
    content_type: Option<Mime>,
    has_body: bool,
    form_encoded: bool,
    handlers: Vec<ParameterHandler>,
}

impl RequestFactory {
    /// Validates `metadata` and compiles it against `base_url`.
    pub fn parse(base_url: &BaseUrl, metadata: &MethodMetadata) -> Result<Self, ConfigurationError> {
        let name = metadata.name();
        let error = |reason: String| ConfigurationError::new(name, reason);

        let declared = match metadata.http_methods() {
            [] => return Err(error("HTTP method is required (e.g. GET, POST)".to_string())),
            [declared] => declared,
            [first, second, ..] => {
                return Err(error(format!("only one HTTP method is allowed, found {} and {}", first.method, second.method)));
            }
        };
        let http_method = declared.method.clone();
        let relative_url = declared.relative_url.clone();
        let has_body = declared.has_body;
        let form_encoded = metadata.is_form_encoded();

        let url_params = match &relative_url {
            Some(url) => parse_relative_url(url).map_err(error)?,
            None => HashSet::new(),
        };
        let (headers, content_type) = parse_headers(metadata.headers()).map_err(error)?;

        if form_encoded && !has_body {
            return Err(error(
                "form encoding can only be specified on HTTP methods with a request body (e.g. POST)".to_string(),
            ));
        }

        let mut parser = ParameterParser::new(&http_method, relative_url.as_deref(), &url_params, form_encoded);
        let handlers = metadata
            .parameters()
            .iter()
            .enumerate()
            .map(|(index, kind)| parser.parse(kind).map_err(|reason| ConfigurationError::parameter(name, index, reason)))
            .collect::<Result<Vec<_>, _>>()?;

        if relative_url.is_none() && !parser.got_url {
            return Err(error(format!("missing either {http_method} URL or Url parameter")));
        }
        if !form_encoded && !has_body && parser.got_body {
            return Err(error("non-body HTTP method cannot contain a Body parameter".to_string()));
        }
        if form_encoded && !parser.got_field {
            return Err(error("form-encoded method must contain at least one Field parameter".to_string()));
        }
        if let Some(url) = &relative_url {
            let mut missing = url_params.difference(&parser.path_names).collect::<Vec<_>>();
            missing.sort();
            if let Some(param) = missing.first() {
                return Err(error(format!("URL \"{url}\" has placeholder {{{param}}} without a matching Path parameter")));
            }
        }

        trace!(method = name, %http_method, parameters = handlers.len(), "request template compiled");
        Ok(Self {
            method_name: name.to_string(),
            http_method,
            base_url: base_url.clone(),
            relative_url,
            headers,
            content_type,
            has_body,
            form_encoded,
            handlers,
        })
    }

    /// Binds one invocation's arguments into a request.
    pub fn create(&self, args: &Arguments) -> Result<Request, ArgumentError> {
        if args.len() != self.handlers.len() {
            return Err(ArgumentError::new(
                &self.method_name,
                None,
                format!("argument count ({}) doesn't match expected count ({})", args.len(), self.handlers.len()),
            ));
        }

        let mut binding = Binding::new(self);
        for (index, (handler, value)) in self.handlers.iter().zip(args).enumerate() {
            handler.apply(&mut binding, value).map_err(|reason| ArgumentError::new(&self.method_name, Some(index), reason))?;
        }
        binding.into_request(self).map_err(|reason| ArgumentError::new(&self.method_name, None, reason))
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    pub fn relative_url(&self) -> Option<&str> {
        self.relative_url.as_deref()
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn has_body(&self) -> bool {
        self.has_body
    }

    pub fn is_form_encoded(&self) -> bool {
        self.form_encoded
    }

    pub fn parameter_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Collects the `{placeholder}` names of a relative URL, rejecting placeholders in its query.
fn parse_relative_url(url: &str) -> Result<HashSet<String>, String> {
    if let Some((_, query)) = url.split_once('?')
        && PARAM_URL_REGEX.is_match(query)
    {
        return Err(format!(
            "URL query string \"{query}\" must not have replace block, use a Query parameter for dynamic query values"
        ));
    }
    Ok(PARAM_URL_REGEX.captures_iter(url).map(|captures| captures[1].to_string()).collect())
}

/// Splits static `Name: Value` headers, pulling out `Content-Type`.
fn parse_headers(headers: &[String]) -> Result<(HeaderMap, Option<Mime>), String> {
    let mut map = HeaderMap::new();
    let mut content_type = None;

    for header in headers {
        let malformed = || format!("static header must be in the form \"Name: Value\", found \"{header}\"");
        let (name, value) = header.split_once(':').ok_or_else(malformed)?;
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() {
            return Err(malformed());
        }

        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            let mime = Mime::from_str(value).map_err(|e| format!("malformed content type \"{value}\": {e}"))?;
            content_type = Some(mime);
            continue;
        }

        let name = HeaderName::from_str(name).map_err(|e| format!("invalid static header name \"{name}\": {e}"))?;
        let value = HeaderValue::from_str(value).map_err(|e| format!("invalid value for static header \"{name}\": {e}"))?;
        map.append(name, value);
    }
    Ok((map, content_type))
}

/// Per-parameter checks, tracking what earlier parameters declared.
#[derive(Debug)]
struct ParameterParser<'a> {
    http_method: &'a Method,
    relative_url: Option<&'a str>,
    url_params: &'a HashSet<String>,
    form_encoded: bool,
    got_url: bool,
    got_path: bool,
    got_query: bool,
    got_body: bool,
    got_field: bool,
    path_names: HashSet<String>,
}

impl<'a> ParameterParser<'a> {
    fn new(
        http_method: &'a Method,
        relative_url: Option<&'a str>,
        url_params: &'a HashSet<String>,
        form_encoded: bool,
    ) -> Self {
        Self {
            http_method,
            relative_url,
            url_params,
            form_encoded,
            got_url: false,
            got_path: false,
            got_query: false,
            got_body: false,
            got_field: false,
            path_names: HashSet::new(),
        }
    }

    fn parse(&mut self, kind: &ParameterKind) -> Result<ParameterHandler, String> {
        let handler = match kind {
            ParameterKind::Url => {
                if self.got_url {
                    return Err("multiple Url parameters found".to_string());
                }
                if self.got_path {
                    return Err("Path parameters may not be used with Url".to_string());
                }
                if self.got_query {
                    return Err("a Url parameter must not come after a Query parameter".to_string());
                }
                if self.relative_url.is_some() {
                    return Err(format!("Url cannot be used with {} URL", self.http_method));
                }
                self.got_url = true;
                ParameterHandler::Url
            }
            ParameterKind::Path { name, encoded } => {
                if self.got_query {
                    return Err("a Path parameter must not come after a Query parameter".to_string());
                }
                if self.got_url {
                    return Err("Path parameters may not be used with Url".to_string());
                }
                let Some(url) = self.relative_url else {
                    return Err(format!("Path can only be used with relative URL on {}", self.http_method));
                };
                if !PARAM_NAME_REGEX.is_match(name) {
                    return Err(format!("Path parameter name must match {PARAM}, found: {name}"));
                }
                if !self.url_params.contains(name) {
                    return Err(format!("URL \"{url}\" does not contain \"{{{name}}}\""));
                }
                self.got_path = true;
                self.path_names.insert(name.clone());
                ParameterHandler::Path { name: name.clone(), encoded: *encoded }
            }
            ParameterKind::Query { name, encoded } => {
                self.got_query = true;
                ParameterHandler::Query { name: name.clone(), encoded: *encoded }
            }
            ParameterKind::QueryName { encoded } => {
                self.got_query = true;
                ParameterHandler::QueryName { encoded: *encoded }
            }
            ParameterKind::QueryMap { encoded } => {
                self.got_query = true;
                ParameterHandler::QueryMap { encoded: *encoded }
            }
            ParameterKind::Header { name } => {
                let name = HeaderName::from_str(name).map_err(|e| format!("invalid header name \"{name}\": {e}"))?;
                ParameterHandler::Header { name }
            }
            ParameterKind::HeaderMap => ParameterHandler::HeaderMap,
            ParameterKind::Field { name, encoded } => {
                self.require_form(kind)?;
                self.got_field = true;
                ParameterHandler::Field { name: name.clone(), encoded: *encoded }
            }
            ParameterKind::FieldMap { encoded } => {
                self.require_form(kind)?;
                self.got_field = true;
                ParameterHandler::FieldMap { encoded: *encoded }
            }
            ParameterKind::Body => {
                if self.form_encoded {
                    return Err("Body parameters cannot be used with form encoding".to_string());
                }
                if self.got_body {
                    return Err("multiple Body parameters found".to_string());
                }
                self.got_body = true;
                ParameterHandler::Body
            }
        };
        Ok(handler)
    }

    fn require_form(&self, kind: &ParameterKind) -> Result<(), String> {
        if self.form_encoded {
            Ok(())
        } else {
            Err(format!("{} parameters can only be used with form encoding", kind.label()))
        }
    }
}
