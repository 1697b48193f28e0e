//! # Advisory Cache Module
//!
//! A time-bounded, file-backed cache of advisory records. Each identifier maps to
//! exactly one JSON file under the cache root, named after the canonical identifier.
//!
//! ## Behaviour
//!
//! - Every entry path is checked to resolve inside the cache root before it is
//!   touched; a path that escapes (for instance through a planted symlink) is
//!   refused with [`CacheError::PathTraversalDetected`]
//! - Missing, unreadable, corrupt or expired entries are reported as a miss
//! - Writes go through a temporary file and a rename, so readers never observe a
//!   half-written entry
//! - `purge_older_than` removes entries by file modification time

mod config;
mod error;

pub use config::{CacheConfig, CacheConfigBuilder, MAX_TTL_HOURS, MIN_TTL_HOURS};
pub use error::CacheError;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument, warn};

use crate::advisory::AdvisoryRecord;
use crate::identifier::AdvisoryId;

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

type Result<T> = std::result::Result<T, CacheError>;

/// Create `path` for writing, failing if anything (including a symlink) exists there
async fn create_new(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

/// Outcome of a purge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Entries deleted
    pub removed: usize,

    /// Entries that were stale but could not be deleted
    pub failed: usize,
}

/// File-backed advisory cache
#[derive(Debug, Clone)]
pub struct AdvisoryCache {
    config: CacheConfig,
}

impl AdvisoryCache {
    /// Create a cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cutoff for cleanup: entries untouched for twice the TTL are stale
    pub fn cleanup_cutoff(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::hours(i64::from(self.config.clamped_ttl_hours()));
        Utc::now() - ttl * 2
    }

    /// Absolute cache root, canonicalized when it already exists
    async fn resolved_root(&self) -> Result<PathBuf> {
        let absolute = std::path::absolute(&self.config.root)?;
        match fs::canonicalize(&absolute).await {
            Ok(canonical) => Ok(canonical),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(absolute),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the entry for `id`, verified to stay inside the cache root
    pub async fn entry_path(&self, id: &AdvisoryId) -> Result<PathBuf> {
        let root = self.resolved_root().await?;
        let candidate = root.join(format!("{}.{}", id, ENTRY_EXTENSION));
        self.verify_within(&root, &candidate).await?;
        Ok(candidate)
    }

    async fn verify_within(&self, root: &Path, candidate: &Path) -> Result<()> {
        // An existing entry may be a symlink; follow it before comparing
        let resolved = match fs::canonicalize(candidate).await {
            Ok(path) => path,
            Err(_) => candidate.to_path_buf(),
        };

        if resolved.parent() != Some(root) {
            error!(
                path = %resolved.display(),
                root = %root.display(),
                "Path traversal detected! Cache entry resolves outside the cache directory"
            );
            return Err(CacheError::PathTraversalDetected { path: resolved });
        }
        Ok(())
    }

    /// Look up a fresh record for `id`
    ///
    /// Returns `Ok(None)` on any kind of miss. The only error is a path that
    /// escapes the cache root.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn get(&self, id: &AdvisoryId) -> Result<Option<AdvisoryRecord>> {
        let path = self.entry_path(id).await?;

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss");
                return Ok(None);
            }
            Err(e) => {
                warn!("Error reading cache file for {}: {}", id, e);
                return Ok(None);
            }
        };

        let record: AdvisoryRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                warn!("Corrupt cache entry for {}, refetching: {}", id, e);
                return Ok(None);
            }
        };

        if &record.id != id {
            warn!("Cache entry for {} holds record for {}", id, record.id);
            return Ok(None);
        }

        let ttl = chrono::Duration::hours(i64::from(self.config.clamped_ttl_hours()));
        if Utc::now() - record.fetched_at > ttl {
            debug!(fetched_at = %record.fetched_at, "Cache entry expired");
            return Ok(None);
        }

        debug!("Cache hit");
        Ok(Some(record))
    }

    /// Store `record` as the entry for `id`
    ///
    /// The temporary file is checked against the cache root like the entry itself
    /// and is always created fresh, never opened through an existing link.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn put(&self, id: &AdvisoryId, record: &AdvisoryRecord) -> Result<()> {
        fs::create_dir_all(&self.config.root).await?;
        let root = self.resolved_root().await?;
        let path = self.entry_path(id).await?;
        let temp_path = path.with_extension(TEMP_EXTENSION);
        self.verify_within(&root, &temp_path).await?;

        let json = serde_json::to_string_pretty(record)?;
        let mut file = match create_new(&temp_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                // Leftover from an interrupted write, or a dangling link
                debug!("Replacing stale temporary file {}", temp_path.display());
                fs::remove_file(&temp_path).await?;
                create_new(&temp_path).await?
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
            drop(file);
            fs::rename(&temp_path, &path).await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!("Cached advisory record at {}", path.display());
        Ok(())
    }

    /// Delete entries last modified before `cutoff`
    ///
    /// Failures on individual entries are logged and counted; the scan continues.
    #[instrument(skip(self))]
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();

        let mut entries = match fs::read_dir(&self.config.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_entry = path
                .extension()
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION);
            if !is_entry {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(e) => {
                    warn!("Could not read modification time of {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if modified >= cutoff {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed stale cache entry {}", path.display());
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove cache entry {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{SeverityLevel, SeverityVotes};
    use crate::identifier::normalize;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir, ttl_hours: u32) -> AdvisoryCache {
        AdvisoryCache::new(
            CacheConfig::builder()
                .root(dir.path().join("cache"))
                .ttl_hours(ttl_hours)
                .build(),
        )
    }

    fn record(id: &str, fetched_at: DateTime<Utc>) -> AdvisoryRecord {
        AdvisoryRecord {
            id: normalize(id).unwrap(),
            severity: SeverityLevel::Moderate,
            descriptions: vec![
                "A couple kiss passionately in bed.".to_string(),
                "Brief rear nudity as a man walks to the shower.".to_string(),
            ],
            votes: SeverityVotes {
                none: 1,
                mild: 4,
                moderate: 20,
                severe: 2,
            },
            fetched_at,
        }
    }

    #[tokio::test]
    async fn test_round_trip_within_ttl() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();
        let original = record("tt1234567", Utc::now());

        cache.put(&id, &original).await.unwrap();
        let loaded = cache.get(&id).await.unwrap();

        assert_eq!(loaded, Some(original));
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 1);
        let id = normalize("tt1234567").unwrap();

        let stale = record("tt1234567", Utc::now() - chrono::Duration::hours(2));
        cache.put(&id, &stale).await.unwrap();

        assert_eq!(cache.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt7654321").unwrap();

        assert_eq!(cache.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache/tt1234567.json"), "{ not json").unwrap();

        assert_eq!(cache.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mismatched_id_is_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();
        let other = record("tt7654321", Utc::now());

        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(
            dir.path().join("cache/tt1234567.json"),
            serde_json::to_string(&other).unwrap(),
        )
        .unwrap();

        assert_eq!(cache.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_path_stays_in_root() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        let path = cache.entry_path(&id).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "tt1234567.json");
        assert!(path.ends_with("cache/tt1234567.json"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_detected() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        let outside = dir.path().join("outside.json");
        std::fs::write(&outside, "{}").unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::os::unix::fs::symlink(&outside, dir.path().join("cache/tt1234567.json")).unwrap();

        let result = cache.get(&id).await;
        assert!(matches!(
            result,
            Err(CacheError::PathTraversalDetected { .. })
        ));

        let result = cache.put(&id, &record("tt1234567", Utc::now())).await;
        assert!(matches!(
            result,
            Err(CacheError::PathTraversalDetected { .. })
        ));
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "{}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_planted_temp_symlink_is_refused() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        let victim = dir.path().join("victim.txt");
        std::fs::write(&victim, "original").unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::os::unix::fs::symlink("../victim.txt", dir.path().join("cache/tt1234567.tmp")).unwrap();

        let result = cache.put(&id, &record("tt1234567", Utc::now())).await;
        assert!(matches!(
            result,
            Err(CacheError::PathTraversalDetected { .. })
        ));
        assert_eq!(std::fs::read_to_string(&victim).unwrap(), "original");
        assert!(cache.get(&id).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_temp_symlink_is_replaced() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        let target = dir.path().join("created-outside.txt");
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("cache/tt1234567.tmp")).unwrap();

        let stored = record("tt1234567", Utc::now());
        cache.put(&id, &stored).await.unwrap();

        assert!(!target.exists());
        assert!(!dir.path().join("cache/tt1234567.tmp").exists());
        assert_eq!(cache.get(&id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_stale_temp_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);
        let id = normalize("tt1234567").unwrap();

        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache/tt1234567.tmp"), "half a rec").unwrap();

        let stored = record("tt1234567", Utc::now());
        cache.put(&id, &stored).await.unwrap();
        assert_eq!(cache.get(&id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn test_purge_respects_cutoff() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);

        for raw in ["tt1111111", "tt2222222"] {
            let id = normalize(raw).unwrap();
            cache.put(&id, &record(raw, Utc::now())).await.unwrap();
        }
        std::fs::write(dir.path().join("cache/notes.txt"), "keep me").unwrap();

        let report = cache
            .purge_older_than(Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(report, PurgeReport::default());

        let report = cache
            .purge_older_than(Utc::now() + chrono::Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(report.failed, 0);
        assert!(dir.path().join("cache/notes.txt").exists());
    }

    #[tokio::test]
    async fn test_purge_missing_root() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 24);

        let report = cache.purge_older_than(Utc::now()).await.unwrap();
        assert_eq!(report, PurgeReport::default());
    }

    #[test]
    fn test_cleanup_cutoff_is_twice_ttl() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir, 10);

        let before = Utc::now();
        let cutoff = cache.cleanup_cutoff();
        let after = Utc::now();

        assert!(cutoff >= before - chrono::Duration::hours(20));
        assert!(cutoff <= after - chrono::Duration::hours(20));
    }
}
