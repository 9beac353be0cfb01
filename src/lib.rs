//! Multi-tenant full-text page index.
//!
//! Each tenant owns an isolated index of web pages (`url`, `title`, `body`)
//! under one storage root. Pages are de-duplicated by URL; bodies are
//! searchable but never returned.

pub mod error;
pub mod index;
pub mod types;

#[cfg(test)]
mod integ_tests;

pub use error::{MultiindexError, Result};
pub use index::{IndexRegistry, TantivyEngine};
pub use types::{CreateOutcome, Page, PageHit, StoreOutcome, TenantId};
