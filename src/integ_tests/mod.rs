//! Registry tests run in-process via `cargo test --lib`.
//!
//! These exercise the public registry API only (no HTTP server).

mod test_isolation;
mod test_registry;
