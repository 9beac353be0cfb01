use crate::error::{MultiindexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_TENANT_NAME_LEN: usize = 128;
pub const SCHEMA_VERSION: u32 = 1;

const REMOVE_ATTEMPTS: usize = 10;
const REMOVE_BACKOFF: Duration = Duration::from_millis(50);
const MANIFEST_EXT: &str = "json";

/// Tenant names become file names, so only `[A-Za-z0-9_-]` is accepted and a
/// leading `_` is reserved for manifests.
pub fn validate_tenant_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_TENANT_NAME_LEN {
        return Err(MultiindexError::InvalidTenant(name.to_string()));
    }
    if name.starts_with('_') {
        return Err(MultiindexError::InvalidTenant(name.to_string()));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(MultiindexError::InvalidTenant(name.to_string()));
    }
    Ok(())
}

pub fn tenant_dir(root: &Path, tenant: &str) -> PathBuf {
    root.join(tenant)
}

pub fn manifest_path(root: &Path, tenant: &str) -> PathBuf {
    root.join(format!("_{}.{}", tenant, MANIFEST_EXT))
}

/// Marker written once a tenant's index is completely created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantManifest {
    pub tenant: String,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
}

impl TenantManifest {
    pub fn new(tenant: &str) -> Self {
        TenantManifest {
            tenant: tenant.to_string(),
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: TenantManifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Write through a temp file and rename, so a reader never sees a
    /// partial manifest.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, content)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Whether the root entry `entry_name` belongs to `tenant`: it starts with
/// `tenant` or `_tenant` and the rest is empty or begins with `.`.
pub fn owns_artifact(tenant: &str, entry_name: &str) -> bool {
    let rest = entry_name
        .strip_prefix('_')
        .and_then(|s| s.strip_prefix(tenant))
        .or_else(|| entry_name.strip_prefix(tenant));
    match rest {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Delete a file or directory tree. Directory removal is retried because
/// tantivy merge threads can still be releasing segment files.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        };
    }

    let mut last_err = None;
    for _ in 0..REMOVE_ATTEMPTS {
        match std::fs::remove_dir_all(path) {
            Ok(()) => {
                last_err = None;
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                last_err = None;
                break;
            }
            Err(e) => {
                last_err = Some(e);
                std::thread::sleep(REMOVE_BACKOFF);
            }
        }
    }
    match last_err {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Remove every root entry owned by `tenant`, manifest first. Returns the
/// number of entries deleted.
pub fn remove_tenant_artifacts(root: &Path, tenant: &str) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    let manifest = manifest_path(root, tenant);
    if manifest.exists() {
        remove_path(&manifest)?;
        removed += 1;
    }

    let entries: Vec<_> = std::fs::read_dir(root)?.collect::<std::result::Result<Vec<_>, _>>()?;
    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if owns_artifact(tenant, &name) {
            remove_path(&entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Tenants with a manifest under `root`, sorted.
pub fn list_tenants(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut tenants = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let tenant = name
            .strip_prefix('_')
            .and_then(|s| s.strip_suffix(".json"));
        if let Some(tenant) = tenant {
            if validate_tenant_name(tenant).is_ok() && entry.path().is_file() {
                tenants.push(tenant.to_string());
            }
        }
    }
    tenants.sort();
    Ok(tenants)
}
