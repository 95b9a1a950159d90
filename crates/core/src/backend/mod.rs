//! Authenticated HTTP access shared by the download backends.
//!
//! Each backend speaks JSON over HTTP and authenticates with a static API
//! key; they differ only in the API prefix and in where the key goes.

mod client;
mod error;

pub use client::{ApiKeyPlacement, BackendKind, HttpBackend};
pub use error::BackendError;
