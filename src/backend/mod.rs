//! Remote data plane for the EduConnect backend
//!
//! The hosted service exposes its tables through a declarative query
//! interface; this module carries the typed request contract, the
//! authenticated HTTP executor, and the error taxonomy shared with the
//! auth service.

pub mod client;
mod error;
mod query;
#[cfg(test)]
pub(crate) mod testing;

pub use client::BackendClient;
pub use error::{BackendError, BackendResult};
pub use query::{Embed, Filter, Operation, Order, Request};

use async_trait::async_trait;
use serde_json::Value;

/// Executes typed requests against the remote tables. The facade only
/// ever talks to this seam, so tests can swap the transport out.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: Request) -> BackendResult<Vec<Value>>;
}
