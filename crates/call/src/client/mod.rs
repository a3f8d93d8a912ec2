//! The default [`CallFactory`].
//!
//! A [`Client`] wires a [`Transport`] and a [`Dispatcher`] together and stamps every call it
//! creates with the client's default timeout. Clients are cheap to clone and share.
//!
//! ```no_run
//! use std::time::Duration;
//! use micro_call::call::{Call, CallFactory};
//! use micro_call::client::Client;
//! use micro_call::protocol::{Request, Response, TransportError};
//! use micro_call::timeout::Timeout;
//! use micro_call::transport::transport_fn;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .transport(transport_fn(|request: Request, _timeout: Timeout| async move {
//!         Response::builder(request).status(200_u16).body("pong").map_err(TransportError::protocol)
//!     }))
//!     .call_timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let request = Request::builder().uri("https://api.example.test/ping").build()?;
//! let response = client.new_call(request).execute().await?;
//! assert!(response.is_successful());
//! # Ok(())
//! # }
//! ```

mod config;

pub use config::ClientConfig;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::call::{Call, CallFactory, HttpCall};
use crate::dispatcher::{Dispatcher, TokioDispatcher};
use crate::protocol::Request;
use crate::timeout::Timeout;
use crate::transport::Transport;

#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Box<dyn Transport>,
    dispatcher: Box<dyn Dispatcher>,
    call_timeout: Option<Duration>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn dispatcher(&self) -> &dyn Dispatcher {
        self.inner.dispatcher.as_ref()
    }

    /// The timeout every new call starts with, `None` meaning unlimited.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.inner.call_timeout
    }

    pub(crate) fn new_timeout(&self) -> Timeout {
        match self.inner.call_timeout {
            Some(timeout) => Timeout::with_timeout(timeout),
            None => Timeout::new(),
        }
    }
}

impl CallFactory for Client {
    fn new_call(&self, request: Request) -> Box<dyn Call> {
        Box::new(HttpCall::new(self.clone(), request))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("call_timeout", &self.inner.call_timeout).finish_non_exhaustive()
    }
}

pub struct ClientBuilder {
    transport: Option<Box<dyn Transport>>,
    dispatcher: Option<Box<dyn Dispatcher>>,
    config: ClientConfig,
}

impl ClientBuilder {
    fn new() -> Self {
        Self { transport: None, dispatcher: None, config: ClientConfig::default() }
    }

    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Replaces the default [`TokioDispatcher`], which makes `max_requests` irrelevant.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: impl Dispatcher) -> Self {
        self.dispatcher = Some(Box::new(dispatcher));
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    /// Applies every tunable of `config`, overriding earlier calls.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Client, ClientBuildError> {
        let transport = self.transport.ok_or(ClientBuildError::MissingTransport)?;
        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => {
                let dispatcher =
                    TokioDispatcher::try_current(self.config.max_requests).ok_or(ClientBuildError::NoRuntime)?;
                Box::new(dispatcher)
            }
        };

        let call_timeout = self.config.call_timeout;
        debug!(?call_timeout, max_requests = self.config.max_requests, "client built");
        Ok(Client { inner: Arc::new(Inner { transport, dispatcher, call_timeout }) })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("has_transport", &self.transport.is_some())
            .field("has_dispatcher", &self.dispatcher.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("transport must be set")]
    MissingTransport,
    #[error("no dispatcher was set and there is no tokio runtime to create the default one on")]
    NoRuntime,
}
