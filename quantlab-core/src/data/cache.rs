//! Disk-backed HTTP response cache.
//!
//! Layout: `{cache_dir}/{blake3(url)}.body` plus a `.meta` JSON sidecar with
//! the source URL and fetch time. Writes go to a `.tmp` sibling and are
//! renamed into place; the rename step is serialized under a mutex so
//! replacement is atomic on a single filesystem even when the ingest fan-out
//! writes concurrently.

use super::provider::DataError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Metadata sidecar for a cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub url: String,
    pub status: u16,
    pub fetched_at: chrono::DateTime<Utc>,
}

/// Content-addressed response cache.
pub struct ResponseCache {
    cache_dir: PathBuf,
    rename_lock: Mutex<()>,
}

impl ResponseCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            rename_lock: Mutex::new(()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn base_path(&self, url: &str) -> PathBuf {
        let key = blake3::hash(url.as_bytes()).to_hex().to_string();
        self.cache_dir.join(key)
    }

    fn body_path(&self, url: &str) -> PathBuf {
        self.base_path(url).with_extension("body")
    }

    fn meta_path(&self, url: &str) -> PathBuf {
        self.base_path(url).with_extension("meta")
    }

    /// Look up a cached body for `url`. A hit requires both body and meta to
    /// be present and readable.
    pub fn probe(&self, url: &str) -> Option<String> {
        let meta_raw = fs::read_to_string(self.meta_path(url)).ok()?;
        let _meta: ResponseMeta = serde_json::from_str(&meta_raw).ok()?;
        fs::read_to_string(self.body_path(url)).ok()
    }

    /// Store a response body. Write-temp-then-rename on both files; the meta
    /// sidecar lands last so a crash cannot leave a meta without its body.
    pub fn store(&self, url: &str, status: u16, body: &str) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::Cache(format!("create cache dir: {e}")))?;

        let meta = ResponseMeta {
            url: url.to_string(),
            status,
            fetched_at: Utc::now(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Cache(format!("meta serialization: {e}")))?;

        self.write_atomic(&self.body_path(url), body)?;
        self.write_atomic(&self.meta_path(url), &meta_json)?;
        Ok(())
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), DataError> {
        // Append rather than replace the extension: the .body and .meta
        // siblings must not collide on one .tmp path.
        let mut tmp_os = path.as_os_str().to_owned();
        tmp_os.push(".tmp");
        let tmp_path = PathBuf::from(tmp_os);
        fs::write(&tmp_path, contents)
            .map_err(|e| DataError::Cache(format!("write {}: {e}", tmp_path.display())))?;

        let _guard = self.rename_lock.lock().expect("rename lock poisoned");
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename to {}: {e}", path.display()))
        })
    }
}
