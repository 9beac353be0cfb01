pub mod engine;
pub mod manager;
pub mod schema;
pub mod storage;
pub mod tantivy_engine;

pub use engine::{EngineIndex, EngineWriter, TextEngine};
pub use manager::IndexRegistry;
pub use schema::{PageField, PageSchema};
pub use tantivy_engine::{TantivyEngine, TantivyIndex};
