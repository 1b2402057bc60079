//! Purpose: Library crate backing the `chartcache` CLI and tests.
//! Exports: `api` (public surface), `core` (config parsing and errors).
//! Role: Cache backend config parsing and the JSON error convention for a chart proxy.
//! Invariants: Library operations are synchronous and hold no shared state.
pub mod api;
pub mod core;
