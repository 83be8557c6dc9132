//! HTTP plumbing: request description, in-flight tracking and the dispatcher.

pub mod active;
pub mod dispatcher;
pub mod request;

pub use active::{ActiveRequests, InFlight};
pub use dispatcher::Dispatcher;
pub use request::{ApiRequest, AuthMode};
