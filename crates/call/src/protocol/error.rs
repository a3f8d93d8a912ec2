use std::io;
use thiserror::Error;

/// Failures surfaced by [`Call::execute`](crate::call::Call::execute) and delivered to
/// [`Call::enqueue`](crate::call::Call::enqueue) callbacks.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("illegal call state: {reason}")]
    IllegalState { reason: String },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

impl CallError {
    pub fn illegal_state<S: ToString>(str: S) -> Self {
        Self::IllegalState { reason: str.to_string() }
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, CallError::IllegalState { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, CallError::Transport { source: TransportError::Canceled })
    }

    /// Returns the transport failure, if this error came from the exchange itself.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            CallError::Transport { source } => Some(source),
            CallError::IllegalState { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {reason}")]
    Connect { reason: String },

    #[error("timed out")]
    TimedOut,

    #[error("canceled")]
    Canceled,

    #[error("protocol violation: {reason}")]
    Protocol { reason: String },

    #[error("interrupted: {reason}")]
    Interrupted { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl TransportError {
    pub fn connect<S: ToString>(str: S) -> Self {
        Self::Connect { reason: str.to_string() }
    }

    pub fn protocol<S: ToString>(str: S) -> Self {
        Self::Protocol { reason: str.to_string() }
    }

    pub fn interrupted<S: ToString>(str: S) -> Self {
        Self::Interrupted { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, TransportError::Canceled)
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, TransportError::TimedOut)
    }
}
