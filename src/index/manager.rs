use crate::error::{MultiindexError, Result};
use crate::index::engine::{EngineIndex, TextEngine};
use crate::index::schema::PageSchema;
use crate::index::storage::{
    list_tenants, manifest_path, remove_path, remove_tenant_artifacts, tenant_dir,
    validate_tenant_name, TenantManifest,
};
use crate::index::tantivy_engine::TantivyEngine;
use crate::types::{CreateOutcome, Page, PageHit, StoreOutcome, TenantId};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Multi-tenant page index registry.
///
/// `IndexRegistry` owns one storage root and one [`PageSchema`], and keeps an
/// isolated full-text index per tenant beneath that root. Indexes are created
/// on demand (explicitly or by the first write), opened lazily, and cached.
///
/// Every tenant has its own `RwLock`: writes (`create`, `add_document`,
/// `remove`) are exclusive, reads (`search_word`, `available`) are shared, and
/// different tenants never contend. Share the registry as `Arc<IndexRegistry>`;
/// all calls block, so async callers should go through `spawn_blocking`.
///
/// # Examples
///
/// ```rust,no_run
/// use multiindex::IndexRegistry;
///
/// # fn main() -> multiindex::Result<()> {
/// let registry = IndexRegistry::open("./data")?;
/// registry.add_document("pages", "http://x", "X", "quick fox");
/// let hits = registry.search_word("pages", "fox")?;
/// assert_eq!(hits[0].url, "http://x");
/// # Ok(())
/// # }
/// ```
pub struct IndexRegistry<E: TextEngine = TantivyEngine> {
    root: PathBuf,
    schema: PageSchema,
    engine: E,
    loaded: DashMap<TenantId, Arc<E::Index>>,
    locks: DashMap<TenantId, Arc<RwLock<()>>>,
}

impl IndexRegistry<TantivyEngine> {
    /// Open (or initialize) a registry rooted at `root` backed by tantivy.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Arc<Self>> {
        Self::with_engine(root, TantivyEngine::default())
    }
}

impl<E: TextEngine> IndexRegistry<E> {
    pub fn with_engine<P: AsRef<Path>>(root: P, engine: E) -> Result<Arc<Self>> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "index registry opened");
        Ok(Arc::new(IndexRegistry {
            root,
            schema: PageSchema::default(),
            engine,
            loaded: DashMap::new(),
            locks: DashMap::new(),
        }))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    fn lock_for(&self, tenant: &str) -> Arc<RwLock<()>> {
        if let Some(lock) = self.locks.get(tenant) {
            return Arc::clone(&lock);
        }
        Arc::clone(
            &self
                .locks
                .entry(tenant.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(()))),
        )
    }

    /// Lock for a read of `tenant`. A tenant that has never been created
    /// gets no lock entry and yields `None`.
    fn read_lock_for(&self, tenant: &str) -> Option<Arc<RwLock<()>>> {
        if let Some(lock) = self.locks.get(tenant) {
            return Some(Arc::clone(&lock));
        }
        if !manifest_path(&self.root, tenant).is_file() {
            return None;
        }
        Some(self.lock_for(tenant))
    }

    /// Exists means: manifest written and a committed engine index on disk.
    fn exists_locked(&self, tenant: &str) -> bool {
        manifest_path(&self.root, tenant).is_file()
            && self.engine.exists(&tenant_dir(&self.root, tenant))
    }

    fn handle_locked(&self, tenant: &str) -> Result<Arc<E::Index>> {
        if let Some(index) = self.loaded.get(tenant) {
            return Ok(Arc::clone(&index));
        }
        let index = Arc::new(
            self.engine
                .open(&tenant_dir(&self.root, tenant), &self.schema)?,
        );
        self.loaded.insert(tenant.to_string(), Arc::clone(&index));
        Ok(index)
    }

    fn create_locked(&self, tenant: &str, overwrite: bool) -> Result<CreateOutcome> {
        if !overwrite && self.exists_locked(tenant) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        self.loaded.remove(tenant);
        std::fs::create_dir_all(&self.root)?;
        let manifest = manifest_path(&self.root, tenant);
        remove_path(&manifest)?;

        let index = self.engine.open_or_create(
            &tenant_dir(&self.root, tenant),
            &self.schema,
            true,
        )?;
        TenantManifest::new(tenant).save(&manifest)?;
        self.loaded.insert(tenant.to_string(), Arc::new(index));

        tracing::info!(tenant, overwrite, "created index");
        Ok(CreateOutcome::Created)
    }

    /// Create `tenant`'s index. An existing index is kept unless `overwrite`,
    /// in which case all of its documents are discarded.
    pub fn create_index(&self, tenant: &str, overwrite: bool) -> Result<CreateOutcome> {
        validate_tenant_name(tenant)?;
        let lock = self.lock_for(tenant);
        let _guard = write_guard(&lock);
        self.create_locked(tenant, overwrite)
    }

    /// `true` when a fresh index was created. Failures are logged and
    /// reported as `false`.
    pub fn create(&self, tenant: &str, overwrite: bool) -> bool {
        match self.create_index(tenant, overwrite) {
            Ok(outcome) => outcome.is_created(),
            Err(e) => {
                log_rejection(tenant, &e, "create failed");
                false
            }
        }
    }

    /// Make sure `tenant` has an index, creating an empty one if needed.
    pub fn ensure_exists(&self, tenant: &str) -> Result<CreateOutcome> {
        self.create_index(tenant, false)
    }

    /// Insert `page` unless a page with the same URL is already indexed.
    /// The insert is committed before returning; on failure it is rolled back.
    pub fn store_document(&self, tenant: &str, page: &Page) -> Result<StoreOutcome> {
        validate_tenant_name(tenant)?;
        let lock = self.lock_for(tenant);
        let _guard = write_guard(&lock);

        self.create_locked(tenant, false)?;
        let index = self.handle_locked(tenant)?;

        if index.contains_url(&page.url)? {
            tracing::debug!(tenant, url = %page.url, "url already indexed");
            return Ok(StoreOutcome::AlreadyPresent);
        }

        let mut writer = index.begin_write()?;
        if let Err(e) = writer.add(page) {
            if let Err(cancel_err) = writer.cancel() {
                tracing::warn!(tenant, error = %cancel_err, "cancel after failed add");
            }
            self.loaded.remove(tenant);
            return Err(e);
        }
        if let Err(e) = writer.commit() {
            self.loaded.remove(tenant);
            return Err(e);
        }

        tracing::debug!(tenant, url = %page.url, "stored page");
        Ok(StoreOutcome::Inserted)
    }

    /// `true` when the page is indexed after the call, whether inserted now or
    /// already present. `false` only on storage failure.
    pub fn add_document(&self, tenant: &str, url: &str, title: &str, body: &str) -> bool {
        let page = Page::new(url, title, body);
        match self.store_document(tenant, &page) {
            Ok(_) => true,
            Err(e) => {
                log_rejection(tenant, &e, "add_document failed");
                false
            }
        }
    }

    /// Every page of `tenant` whose body matches `query`, best match first.
    /// A tenant without an index yields no hits.
    pub fn search_word(&self, tenant: &str, query: &str) -> Result<Vec<PageHit>> {
        validate_tenant_name(tenant)?;
        let Some(lock) = self.read_lock_for(tenant) else {
            return Ok(Vec::new());
        };
        let _guard = read_guard(&lock);

        if !self.exists_locked(tenant) {
            return Ok(Vec::new());
        }
        self.handle_locked(tenant)?.search_body(query)
    }

    /// With no tenant: whether the storage root is initialized. With a tenant:
    /// additionally whether that tenant's index exists and opens.
    pub fn available(&self, tenant: Option<&str>) -> bool {
        if !self.root.is_dir() {
            return false;
        }
        let Some(tenant) = tenant else {
            return true;
        };
        if validate_tenant_name(tenant).is_err() {
            return false;
        }
        let Some(lock) = self.read_lock_for(tenant) else {
            return false;
        };
        let _guard = read_guard(&lock);
        self.exists_locked(tenant) && self.handle_locked(tenant).is_ok()
    }

    /// Number of documents in `tenant`'s index, or `None` if it has none.
    pub fn doc_count(&self, tenant: &str) -> Option<u64> {
        validate_tenant_name(tenant).ok()?;
        let lock = self.read_lock_for(tenant)?;
        let _guard = read_guard(&lock);
        if !self.exists_locked(tenant) {
            return None;
        }
        self.handle_locked(tenant).ok()?.num_docs().ok()
    }

    pub fn tenant_names(&self) -> Vec<String> {
        list_tenants(&self.root).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list tenants");
            Vec::new()
        })
    }

    /// Delete `tenant`'s index, or the whole storage root when `None`.
    pub fn remove(&self, tenant: Option<&str>) -> Result<()> {
        match tenant {
            Some(tenant) => self.remove_tenant(tenant),
            None => self.remove_all(),
        }
    }

    fn remove_tenant(&self, tenant: &str) -> Result<()> {
        validate_tenant_name(tenant)?;
        let lock = self.lock_for(tenant);
        let _guard = write_guard(&lock);

        self.loaded.remove(tenant);
        let removed = remove_tenant_artifacts(&self.root, tenant)?;
        if removed > 0 {
            tracing::info!(tenant, entries = removed, "removed index");
        }
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        let mut names: Vec<String> = self.locks.iter().map(|e| e.key().clone()).collect();
        names.extend(self.tenant_names());
        names.sort();
        names.dedup();

        // Fixed order so concurrent teardowns cannot deadlock.
        let locks: Vec<Arc<RwLock<()>>> = names.iter().map(|t| self.lock_for(t)).collect();
        let _guards: Vec<RwLockWriteGuard<'_, ()>> = locks.iter().map(write_guard).collect();

        self.loaded.clear();
        remove_path(&self.root)?;
        tracing::info!(root = %self.root.display(), "removed storage root");
        Ok(())
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

fn log_rejection(tenant: &str, error: &MultiindexError, what: &str) {
    if error.is_storage_failure() {
        tracing::warn!(tenant, error = %error, "{}", what);
    } else {
        tracing::debug!(tenant, error = %error, "{}", what);
    }
}

// A poisoned lock only means another request panicked mid-operation; the
// on-disk state is still guarded by manifest ordering.
fn write_guard(lock: &Arc<RwLock<()>>) -> RwLockWriteGuard<'_, ()> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn read_guard(lock: &Arc<RwLock<()>>) -> RwLockReadGuard<'_, ()> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}
