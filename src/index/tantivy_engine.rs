use crate::error::Result;
use crate::index::engine::{EngineIndex, EngineWriter, TextEngine};
use crate::index::schema::{exact_key, PageFields, PageSchema};
use crate::index::storage::remove_path;
use crate::types::{Page, PageHit};
use std::path::Path;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

/// Heap for the single indexing thread used per write. Must stay above
/// tantivy's 15MB per-thread floor.
const WRITER_HEAP_BYTES: usize = 50_000_000;

const META_FILE: &str = "meta.json";

/// [`TextEngine`] backed by an on-disk tantivy index per directory.
#[derive(Debug, Clone)]
pub struct TantivyEngine {
    writer_heap_bytes: usize,
}

impl Default for TantivyEngine {
    fn default() -> Self {
        TantivyEngine {
            writer_heap_bytes: WRITER_HEAP_BYTES,
        }
    }
}

impl TextEngine for TantivyEngine {
    type Index = TantivyIndex;

    fn exists(&self, dir: &Path) -> bool {
        dir.join(META_FILE).is_file()
    }

    fn open(&self, dir: &Path, _schema: &PageSchema) -> Result<TantivyIndex> {
        let index = Index::open_in_dir(dir)?;
        TantivyIndex::new(index, self.writer_heap_bytes)
    }

    fn create(&self, dir: &Path, schema: &PageSchema) -> Result<TantivyIndex> {
        if dir.exists() {
            remove_path(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        let index = Index::create_in_dir(dir, schema.to_tantivy())?;
        TantivyIndex::new(index, self.writer_heap_bytes)
    }
}

pub struct TantivyIndex {
    index: Index,
    reader: IndexReader,
    fields: PageFields,
    writer_heap_bytes: usize,
}

impl TantivyIndex {
    fn new(index: Index, writer_heap_bytes: usize) -> Result<Self> {
        let fields = PageFields::resolve(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(TantivyIndex {
            index,
            reader,
            fields,
            writer_heap_bytes,
        })
    }

    fn body_parser(&self) -> QueryParser {
        let mut parser = QueryParser::for_index(&self.index, vec![self.fields.body]);
        parser.set_conjunction_by_default();
        parser
    }
}

impl EngineIndex for TantivyIndex {
    fn begin_write(&self) -> Result<Box<dyn EngineWriter + '_>> {
        let writer: IndexWriter = self
            .index
            .writer_with_num_threads(1, self.writer_heap_bytes)?;
        Ok(Box::new(TantivyWriter {
            writer,
            fields: self.fields,
            reader: &self.reader,
        }))
    }

    fn contains_url(&self, url: &str) -> Result<bool> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.fields.url_key, &exact_key(url));
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        Ok(searcher.search(&query, &Count)? > 0)
    }

    fn search_body(&self, query: &str) -> Result<Vec<PageHit>> {
        let (parsed, errors) = self.body_parser().parse_query_lenient(query);
        if let Some(first_error) = errors.first() {
            tracing::debug!(
                error_count = errors.len(),
                first_error = %first_error,
                "lenient query parse produced warnings"
            );
        }

        let searcher = self.reader.searcher();
        let total = searcher.search(&*parsed, &Count)?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let top_docs = searcher.search(&*parsed, &TopDocs::with_limit(total))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(PageHit {
                url: first_text(&doc, self.fields.url),
                title: first_text(&doc, self.fields.title),
            });
        }
        Ok(hits)
    }

    fn num_docs(&self) -> Result<u64> {
        Ok(self.reader.searcher().num_docs())
    }
}

fn first_text(doc: &TantivyDocument, field: tantivy::schema::Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

struct TantivyWriter<'a> {
    writer: IndexWriter,
    fields: PageFields,
    reader: &'a IndexReader,
}

impl EngineWriter for TantivyWriter<'_> {
    fn add(&mut self, page: &Page) -> Result<()> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.fields.url, &page.url);
        doc.add_text(self.fields.url_key, exact_key(&page.url));
        doc.add_text(self.fields.title, &page.title);
        doc.add_text(self.fields.body, &page.body);
        self.writer.add_document(doc)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let TantivyWriter {
            mut writer, reader, ..
        } = *self;

        if let Err(e) = writer.commit() {
            if let Err(rollback_err) = writer.rollback() {
                tracing::warn!("rollback after failed commit also failed: {}", rollback_err);
            }
            return Err(e.into());
        }

        // Releases the writer lock once background merges settle, so the
        // directory can be deleted right after a write.
        if let Err(e) = writer.wait_merging_threads() {
            tracing::warn!("merge threads ended with an error after commit: {}", e);
        }

        reader.reload()?;
        Ok(())
    }

    fn cancel(self: Box<Self>) -> Result<()> {
        let TantivyWriter { mut writer, .. } = *self;
        writer.rollback()?;
        Ok(())
    }
}
