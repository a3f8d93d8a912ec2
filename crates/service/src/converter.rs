use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AdaptationError;
use crate::type_ref::TypeRef;

/// How a successful response body becomes the declared value. Chosen once, from the response
/// type, when the method is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    /// `()`: the body is ignored.
    Discard,
    /// `String`: the body as UTF-8 text.
    Text,
    /// Anything else: the body as JSON.
    Json,
}

impl ConverterKind {
    pub fn for_type(response_type: &TypeRef) -> Self {
        match response_type {
            TypeRef::Unit => ConverterKind::Discard,
            TypeRef::Named { name, args } if name == "String" && args.is_empty() => ConverterKind::Text,
            _ => ConverterKind::Json,
        }
    }

    pub fn convert<T: DeserializeOwned>(self, body: Bytes) -> Result<T, AdaptationError> {
        match self {
            ConverterKind::Discard => Self::empty(),
            ConverterKind::Text => {
                let text = String::from_utf8(body.to_vec()).map_err(AdaptationError::decode)?;
                serde_json::from_value(Value::String(text)).map_err(AdaptationError::decode)
            }
            ConverterKind::Json => serde_json::from_slice(&body).map_err(AdaptationError::decode),
        }
    }

    /// The value of a response without content: `()`, `None` and the like.
    pub fn empty<T: DeserializeOwned>() -> Result<T, AdaptationError> {
        T::deserialize(Value::Null).map_err(AdaptationError::decode)
    }
}
