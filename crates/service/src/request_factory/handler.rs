use std::str::FromStr;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Uri};
use mime::Mime;
use micro_call::protocol::{Request, RequestBody};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::arguments::ArgValue;
use crate::request_factory::RequestFactory;
use crate::request_factory::url::{encode_path_segment, reencode_component};

/// A substituted path that would climb out of its segment: `.`, `..` or their encoded forms.
static PATH_TRAVERSAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*/)?(\.|%2e|%2E){1,2}(/.*)?$").expect("valid regex"));

/// A compiled parameter: knows how to apply one argument to the request being bound.
#[derive(Debug, Clone)]
pub(crate) enum ParameterHandler {
    Path { name: String, encoded: bool },
    Query { name: String, encoded: bool },
    QueryName { encoded: bool },
    QueryMap { encoded: bool },
    Header { name: HeaderName },
    HeaderMap,
    Field { name: String, encoded: bool },
    FieldMap { encoded: bool },
    Body,
    Url,
}

impl ParameterHandler {
    /// Applies `value`, or explains in one sentence why it does not fit.
    pub(crate) fn apply(&self, binding: &mut Binding, value: &ArgValue) -> Result<(), String> {
        match (self, value) {
            (ParameterHandler::Path { name, .. }, ArgValue::Absent) => {
                Err(format!("path parameter \"{name}\" value must not be absent"))
            }
            (ParameterHandler::Path { name, encoded }, ArgValue::Text(text)) => binding.add_path(name, text, *encoded),

            (ParameterHandler::Query { .. } | ParameterHandler::QueryName { .. }, ArgValue::Absent) => Ok(()),
            (ParameterHandler::Query { name, encoded }, ArgValue::Text(text)) => binding.add_query(name, text, *encoded),
            (ParameterHandler::Query { name, encoded }, ArgValue::List(items)) => {
                items.iter().try_for_each(|item| binding.add_query(name, item, *encoded))
            }
            (ParameterHandler::QueryName { encoded }, ArgValue::Text(text)) => binding.add_query_name(text, *encoded),
            (ParameterHandler::QueryName { encoded }, ArgValue::List(items)) => {
                items.iter().try_for_each(|item| binding.add_query_name(item, *encoded))
            }
            (ParameterHandler::QueryMap { .. }, ArgValue::Absent) => Err("query map must not be absent".to_string()),
            (ParameterHandler::QueryMap { encoded }, ArgValue::Pairs(pairs)) => {
                pairs.iter().try_for_each(|(name, value)| binding.add_query(name, value, *encoded))
            }

            (ParameterHandler::Header { .. }, ArgValue::Absent) => Ok(()),
            (ParameterHandler::Header { name }, ArgValue::Text(text)) => binding.add_header(name.clone(), text),
            (ParameterHandler::Header { name }, ArgValue::List(items)) => {
                items.iter().try_for_each(|item| binding.add_header(name.clone(), item))
            }
            (ParameterHandler::HeaderMap, ArgValue::Absent) => Err("header map must not be absent".to_string()),
            (ParameterHandler::HeaderMap, ArgValue::Pairs(pairs)) => pairs.iter().try_for_each(|(name, value)| {
                let name = HeaderName::from_str(name).map_err(|e| format!("invalid header name \"{name}\": {e}"))?;
                binding.add_header(name, value)
            }),

            (ParameterHandler::Field { .. }, ArgValue::Absent) => Ok(()),
            (ParameterHandler::Field { name, encoded }, ArgValue::Text(text)) => binding.add_field(name, text, *encoded),
            (ParameterHandler::Field { name, encoded }, ArgValue::List(items)) => {
                items.iter().try_for_each(|item| binding.add_field(name, item, *encoded))
            }
            (ParameterHandler::FieldMap { .. }, ArgValue::Absent) => Err("field map must not be absent".to_string()),
            (ParameterHandler::FieldMap { encoded }, ArgValue::Pairs(pairs)) => {
                pairs.iter().try_for_each(|(name, value)| binding.add_field(name, value, *encoded))
            }

            (ParameterHandler::Body, ArgValue::Absent) => Err("body parameter value must not be absent".to_string()),
            (ParameterHandler::Body, ArgValue::Body(body)) => {
                binding.body = Some(body.clone());
                Ok(())
            }
            (ParameterHandler::Body, ArgValue::Text(text)) => {
                binding.body = Some(RequestBody::text(text.clone()));
                Ok(())
            }

            (ParameterHandler::Url, ArgValue::Absent) => Err("url parameter value must not be absent".to_string()),
            (ParameterHandler::Url, ArgValue::Text(url)) => {
                binding.relative_url = Some(url.clone());
                Ok(())
            }

            (handler, value) => Err(format!("{} parameter does not accept a {} value", handler.label(), value.kind())),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ParameterHandler::Path { .. } => "path",
            ParameterHandler::Query { .. } => "query",
            ParameterHandler::QueryName { .. } => "query name",
            ParameterHandler::QueryMap { .. } => "query map",
            ParameterHandler::Header { .. } => "header",
            ParameterHandler::HeaderMap => "header map",
            ParameterHandler::Field { .. } => "field",
            ParameterHandler::FieldMap { .. } => "field map",
            ParameterHandler::Body => "body",
            ParameterHandler::Url => "url",
        }
    }
}

/// The request of one invocation while its arguments are being applied.
#[derive(Debug)]
pub(crate) struct Binding {
    relative_url: Option<String>,
    query: Vec<String>,
    headers: HeaderMap,
    content_type: Option<Mime>,
    form: Vec<String>,
    body: Option<RequestBody>,
}

impl Binding {
    pub(crate) fn new(factory: &RequestFactory) -> Self {
        Self {
            relative_url: factory.relative_url.clone(),
            query: vec![],
            headers: factory.headers.clone(),
            content_type: factory.content_type.clone(),
            form: vec![],
            body: None,
        }
    }

    fn add_path(&mut self, name: &str, value: &str, encoded: bool) -> Result<(), String> {
        let Some(url) = self.relative_url.as_mut() else {
            return Err(format!("path parameter \"{name}\" has no relative URL to replace into"));
        };

        let replaced = url.replace(&format!("{{{name}}}"), &encode_path_segment(value, encoded));
        if PATH_TRAVERSAL.is_match(&replaced) {
            return Err(format!("path parameters shouldn't perform path traversal ('.' or '..'): {value}"));
        }
        *url = replaced;
        Ok(())
    }

    fn add_query(&mut self, name: &str, value: &str, encoded: bool) -> Result<(), String> {
        self.query.push(encode_pair(name, value, encoded)?);
        Ok(())
    }

    fn add_query_name(&mut self, name: &str, encoded: bool) -> Result<(), String> {
        let pair = encode_pair(name, "", encoded)?;
        self.query.push(pair.strip_suffix('=').unwrap_or(&pair).to_string());
        Ok(())
    }

    fn add_field(&mut self, name: &str, value: &str, encoded: bool) -> Result<(), String> {
        self.form.push(encode_pair(name, value, encoded)?);
        Ok(())
    }

    fn add_header(&mut self, name: HeaderName, value: &str) -> Result<(), String> {
        if name == CONTENT_TYPE {
            let content_type = value.parse::<Mime>().map_err(|e| format!("malformed content type \"{value}\": {e}"))?;
            self.content_type = Some(content_type);
            return Ok(());
        }

        let value = HeaderValue::from_str(value).map_err(|e| format!("invalid value for header \"{name}\": {e}"))?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Resolves the URL, assembles the body and builds the request.
    pub(crate) fn into_request(self, factory: &RequestFactory) -> Result<Request, String> {
        let Binding { relative_url, query, mut headers, content_type, form, body } = self;

        let url = relative_url.ok_or_else(|| "request has no URL".to_string())?;
        let mut target = factory
            .base_url
            .resolve(&url)
            .map_err(|e| format!("malformed URL: base {}, relative URL \"{url}\": {e}", factory.base_url))?
            .to_string();
        if !query.is_empty() {
            target.push(if target.contains('?') { '&' } else { '?' });
            target.push_str(&query.join("&"));
        }
        let uri = Uri::try_from(target.as_str()).map_err(|e| format!("malformed URL \"{target}\": {e}"))?;

        let body = if factory.form_encoded {
            Some(RequestBody::form(form.join("&")))
        } else if body.is_some() {
            body
        } else if factory.has_body {
            Some(RequestBody::empty())
        } else {
            None
        };

        let body = match (body, content_type) {
            (Some(body), Some(content_type)) => Some(body.with_content_type(content_type)),
            (None, Some(content_type)) => {
                let value = HeaderValue::from_str(content_type.as_ref()).map_err(|e| e.to_string())?;
                headers.insert(CONTENT_TYPE, value);
                None
            }
            (body, None) => body,
        };

        let mut builder = Request::builder().method(factory.http_method.clone()).uri(uri).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder.build().map_err(|e| e.to_string())
    }
}

/// `name=value`, form-encoded unless both parts are declared already encoded.
fn encode_pair(name: &str, value: &str, encoded: bool) -> Result<String, String> {
    if encoded {
        Ok(format!("{}={}", reencode_component(name), reencode_component(value)))
    } else {
        serde_urlencoded::to_string([(name, value)].as_slice()).map_err(|e| e.to_string())
    }
}
