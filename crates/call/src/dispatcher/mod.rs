//! Schedulers for asynchronous calls.
//!
//! [`Call::enqueue`](crate::call::Call::enqueue) does not run anything itself: it packs the
//! exchange and its completion into a [`DispatchTask`] and hands it to a [`Dispatcher`]. A
//! dispatcher must either run the task or drop it; a dropped task still reports a failure to
//! its callback.

mod tokio_dispatcher;

pub use tokio_dispatcher::DEFAULT_MAX_REQUESTS;
pub use tokio_dispatcher::TokioDispatcher;

use std::future::Future;
use std::pin::Pin;

pub type DispatchTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub trait Dispatcher: Send + Sync + 'static {
    fn dispatch(&self, task: DispatchTask);
}
