//! Data-access facade for the EduConnect backend
//!
//! One named operation per remote interaction, grouped by entity. Every
//! function takes the backend seam and returns typed rows; expected
//! failures come back as `BackendError` values, never panics.

mod chat;
mod courses;
mod help;
mod users;

pub use chat::*;
pub use courses::*;
pub use help::*;
pub use users::*;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::{BackendError, BackendResult};

/// Decode a row set into typed models.
fn rows<T: DeserializeOwned>(raw: Vec<Value>) -> BackendResult<Vec<T>> {
    raw.into_iter()
        .map(|row| Ok(serde_json::from_value(row)?))
        .collect()
}

/// First row of a single-row operation; zero rows is a NotFound value.
fn single<T: DeserializeOwned>(table: &str, raw: Vec<Value>) -> BackendResult<T> {
    let row = raw
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::not_found(table))?;
    Ok(serde_json::from_value(row)?)
}
