//! Failures of the declarative layer.
//!
//! - [`ConfigurationError`]: a declared method cannot be compiled. Raised once, before any call
//!   exists, and never worth retrying.
//! - [`ArgumentError`]: the arguments of one invocation do not fit the compiled template.
//! - [`AdaptationError`]: the exchange completed but its response is not the declared result.
//! - [`ServiceError`]: what an invocation returns, so callers can tell a failed request
//!   ([`ServiceError::Call`]) from an unusable response ([`ServiceError::Adaptation`]).

use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use micro_call::protocol::{CallError, TransportError};
use thiserror::Error;

/// A declared method that cannot be turned into a request template.
///
/// `parameter` is the zero-based index of the offending parameter, shown one-based in the
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    method: String,
    parameter: Option<usize>,
    reason: String,
}

impl ConfigurationError {
    pub fn new<M: ToString, S: ToString>(method: M, reason: S) -> Self {
        Self { method: method.to_string(), parameter: None, reason: reason.to_string() }
    }

    pub fn parameter<M: ToString, S: ToString>(method: M, index: usize, reason: S) -> Self {
        Self { method: method.to_string(), parameter: Some(index), reason: reason.to_string() }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)?;
        if let Some(index) = self.parameter {
            write!(f, " (parameter #{})", index + 1)?;
        }
        write!(f, "\n    for method {}", self.method)
    }
}

impl std::error::Error for ConfigurationError {}

/// Call-site arguments that do not fit a method's template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    method: String,
    index: Option<usize>,
    reason: String,
}

impl ArgumentError {
    pub fn new<M: ToString, S: ToString>(method: M, index: Option<usize>, reason: S) -> Self {
        Self { method: method.to_string(), index, reason: reason.to_string() }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)?;
        if let Some(index) = self.index {
            write!(f, " (parameter #{})", index + 1)?;
        }
        write!(f, "\n    for method {}", self.method)
    }
}

impl std::error::Error for ArgumentError {}

#[derive(Debug, Error)]
pub enum AdaptationError {
    #[error("unexpected response status {status}")]
    UnexpectedStatus { status: StatusCode, body: Bytes },

    #[error("failed to decode response body: {reason}")]
    Decode { reason: String },

    #[error("failed to read response body: {source}")]
    Body {
        #[from]
        source: TransportError,
    },
}

impl AdaptationError {
    pub fn decode<S: ToString>(str: S) -> Self {
        Self::Decode { reason: str.to_string() }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AdaptationError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid arguments: {source}")]
    Argument {
        #[from]
        source: ArgumentError,
    },

    #[error("call failed: {source}")]
    Call {
        #[from]
        source: CallError,
    },

    #[error("unusable response: {source}")]
    Adaptation {
        #[from]
        source: AdaptationError,
    },
}

impl ServiceError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ServiceError::Call { source } if source.is_canceled())
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, ServiceError::Call { source } if source.is_illegal_state())
    }

    /// The status of a non-2xx response that could not be adapted.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Adaptation { source } => source.status(),
            _ => None,
        }
    }
}

impl From<TransportError> for ServiceError {
    fn from(e: TransportError) -> Self {
        ServiceError::Call { source: e.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message() {
        let error = ConfigurationError::parameter("getUser", 1, "URL \"users/{id}\" does not contain \"{name}\"");
        assert_eq!(error.to_string(), "URL \"users/{id}\" does not contain \"{name}\" (parameter #2)\n    for method getUser");
        assert_eq!(error.parameter_index(), Some(1));

        let error = ConfigurationError::new("listUsers", "service methods cannot return unit");
        assert_eq!(error.to_string(), "service methods cannot return unit\n    for method listUsers");
    }

    #[test]
    fn argument_message() {
        let error = ArgumentError::new("getUser", Some(0), "path parameter \"id\" value must not be absent");
        assert_eq!(error.to_string(), "path parameter \"id\" value must not be absent (parameter #1)\n    for method getUser");

        let error = ArgumentError::new("getUser", None, "expected 1 arguments, found 2");
        assert_eq!(error.to_string(), "expected 1 arguments, found 2\n    for method getUser");
    }

    #[test]
    fn service_error_classification() {
        let canceled = ServiceError::from(TransportError::Canceled);
        assert!(canceled.is_canceled());
        assert_eq!(canceled.status(), None);

        let not_found: ServiceError =
            AdaptationError::UnexpectedStatus { status: StatusCode::NOT_FOUND, body: Bytes::new() }.into();
        assert!(!not_found.is_canceled());
        assert_eq!(not_found.status(), Some(StatusCode::NOT_FOUND));

        let misuse: ServiceError = CallError::illegal_state("already executed").into();
        assert!(misuse.is_illegal_state());
    }
}
