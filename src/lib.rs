//! Viento - cached weather lookups
//!
//! Weather API responses are kept in one JSON file shared by every process
//! on the host. Access is serialized with advisory file locks (shared for
//! reads, exclusive for writes) acquired with bounded backoff, and entries
//! expire after a fixed TTL.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lock;
pub mod logging;
pub mod orchestrator;
pub mod registry;

pub use error::{VientoError, VientoResult};
