//! Value objects exchanged between a call and its transport.
//!
//! - **Request** ([`request`]): an immutable outgoing request, cheap to clone
//!   - [`Request`] / [`RequestBuilder`]
//!
//! - **Response** ([`response`]): status, headers, the body handle and the originating request
//!   - [`Response`] / [`ResponseBuilder`] / [`ResponseHead`]
//!
//! - **Bodies** ([`body`]): opaque payload handles
//!   - [`RequestBody`]: bytes plus media type
//!   - [`ResponseBody`]: read-once, released on drop
//!
//! - **Errors** ([`error`])
//!   - [`CallError`]: misuse of a call, or a failed exchange
//!   - [`TransportError`]: why an exchange failed
//!
//! Requests and response heads are never mutated after construction and can be shared across
//! threads without synchronization.

mod request;
pub use request::Request;
pub use request::RequestBuilder;

mod response;
pub use response::Response;
pub use response::ResponseBuilder;
pub use response::ResponseHead;

mod error;
pub use error::CallError;
pub use error::TransportError;

pub mod body;
pub use body::RequestBody;
pub use body::ResponseBody;
