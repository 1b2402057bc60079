//! Purpose: Define the public Rust API boundary for chartcache.
//! Exports: Config parsing, the error model, and the HTTP error convention.
//! Role: Single import path for the binary and integration tests.
//! Invariants: Internal modules are reached through these re-exports only.

mod respond;

pub use crate::core::cache_config::{BackendConfig, CACHE_COLLECTION_NAME, parse_backend_config};
pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use respond::{ErrorEnvelope, extract_error, write_error, write_internal_error, write_json_data};
