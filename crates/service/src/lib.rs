//! Declarative HTTP service methods on top of [`micro_call`].
//!
//! A method is described once, as data, by [`MethodMetadata`]: its verb and relative URL, static
//! headers, what each positional argument binds to and what it returns. [`ServiceMethod::parse`]
//! checks the description and compiles it; every later [`ServiceMethod::invoke`] binds the
//! arguments into a [`Request`](micro_call::protocol::Request), creates a call through the
//! configured [`CallFactory`](micro_call::call::CallFactory) and adapts the outcome.
//!
//! # Example
//!
//! ```no_run
//! use micro_call::client::Client;
//! use micro_call::protocol::{Request, Response, TransportError};
//! use micro_call::timeout::Timeout;
//! use micro_call::transport::transport_fn;
//! use micro_service::{Arguments, MethodMetadata, ParameterKind, Service, TypeRef};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .transport(transport_fn(|request: Request, _timeout: Timeout| async move {
//!             Response::builder(request)
//!                 .status(200_u16)
//!                 .body(r#"{"id":42,"name":"ann"}"#)
//!                 .map_err(TransportError::protocol)
//!         }))
//!         .build()?;
//!
//!     let service = Service::builder()
//!         .base_url("https://api.example.test/")
//!         .call_factory(client)
//!         .declare(
//!             MethodMetadata::builder("getUser")
//!                 .get("users/{id}")
//!                 .param(ParameterKind::path("id"))
//!                 .returns(TypeRef::call(TypeRef::named("User")))
//!                 .build(),
//!         )
//!         .build()?;
//!
//!     let get_user = service.method::<User>("getUser")?;
//!     let call = get_user.invoke(&Arguments::new().arg(42)).await?.into_call().unwrap();
//!     let user = call.execute().await?;
//!     println!("{} is {}", user.id, user.name);
//!     Ok(())
//! }
//! ```
//!
//! # Return types
//!
//! The declared return type picks the [`AdapterKind`]:
//!
//! - `Call<T>` returns an unexecuted [`ServiceCall`]
//! - `Pending<T>` enqueues the call and returns a [`PendingResult`]
//! - anything else executes the call before `invoke` returns
//!
//! The type inside picks the [`ConverterKind`]: `()` discards the body, `String` reads it as
//! text, anything else is decoded as JSON.

mod adapter;
mod arguments;
mod converter;
mod error;
mod metadata;
mod pending;
mod request_factory;
mod service;
mod service_call;
mod service_method;
mod type_ref;

pub use adapter::AdapterKind;
pub use arguments::{ArgValue, Arguments};
pub use converter::ConverterKind;
pub use error::{AdaptationError, ArgumentError, ConfigurationError, ServiceError};
pub use metadata::{HttpMethod, MethodMetadata, MethodMetadataBuilder, ParameterKind};
pub use pending::PendingResult;
pub use request_factory::{BaseUrl, BaseUrlError, RequestFactory};
pub use service::{Service, ServiceBuildError, ServiceBuilder};
pub use service_call::{Reply, ServiceCall};
pub use service_method::{Invocation, ServiceMethod};
pub use type_ref::TypeRef;
