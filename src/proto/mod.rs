//! Wire types and the gRPC client for the dispatcher service.
//!
//! The encoding layer is kept separate from the domain types in
//! [`crate::types`]; conversions live in [`crate::transport::conversions`].

#[allow(clippy::all)]
pub mod dispatcher;

pub use dispatcher::dispatcher_client::DispatcherClient;
