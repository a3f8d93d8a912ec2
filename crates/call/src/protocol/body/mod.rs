//! Body handles exchanged with the transport.
//!
//! - [`RequestBody`]: immutable bytes plus media type, shared freely between clones of a request
//! - [`ResponseBody`]: a read-once handle implementing `http_body::Body`, released on drop

mod request_body;
mod response_body;

pub use request_body::RequestBody;
pub use response_body::ResponseBody;
