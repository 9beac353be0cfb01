//! Seam between the registry's policy layer and the full-text engine.
//!
//! The registry never touches engine internals: it asks for an index living
//! in a directory, checks URLs with a point query, searches bodies with a
//! term query, and writes through a writer that either commits or cancels.

use crate::error::Result;
use crate::index::schema::PageSchema;
use crate::types::{Page, PageHit};
use std::path::Path;

pub trait TextEngine: Send + Sync + 'static {
    type Index: EngineIndex;

    /// Whether `dir` holds a committed index.
    fn exists(&self, dir: &Path) -> bool;

    /// Open the committed index in `dir`.
    fn open(&self, dir: &Path, schema: &PageSchema) -> Result<Self::Index>;

    /// Create an empty index in `dir`, discarding anything already there.
    fn create(&self, dir: &Path, schema: &PageSchema) -> Result<Self::Index>;

    fn open_or_create(
        &self,
        dir: &Path,
        schema: &PageSchema,
        overwrite: bool,
    ) -> Result<Self::Index> {
        if !overwrite && self.exists(dir) {
            self.open(dir, schema)
        } else {
            self.create(dir, schema)
        }
    }
}

pub trait EngineIndex: Send + Sync + 'static {
    /// Start a write transaction. Only one may be open per index at a time.
    fn begin_write(&self) -> Result<Box<dyn EngineWriter + '_>>;

    /// Point query on the exact `url` term.
    fn contains_url(&self, url: &str) -> Result<bool>;

    /// Every document whose body matches `query`, best match first.
    fn search_body(&self, query: &str) -> Result<Vec<PageHit>>;

    fn num_docs(&self) -> Result<u64>;
}

pub trait EngineWriter {
    fn add(&mut self, page: &Page) -> Result<()>;

    /// Durably publish everything added so far. On failure nothing becomes visible.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Drop everything added since `begin_write`.
    fn cancel(self: Box<Self>) -> Result<()>;
}
