//! Two-layer athlete cache
//!
//! Lookups check the in-memory map first, then the durable directory.
//! Durable hits that are fresh and structurally valid are promoted into
//! memory. Unreadable, corrupt and stale records are misses, as are records
//! stored under another key or classified under different scan settings. Writes go to a temporary file that is renamed over the target, so
//! readers never observe a half-written record.

use super::entry::CacheEntry;
use crate::config::CacheConfig;
use crate::domain::{AthleteId, CacheError, CandidatePerformance};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedMutexGuard, RwLock};

type FillLocks = Mutex<HashMap<AthleteId, Arc<tokio::sync::Mutex<()>>>>;

/// Lookup and write counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub misses: u64,
    pub writes: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.memory_hits + self.disk_hits
    }
}

#[derive(Debug, Default)]
struct Counters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

/// Process-wide athlete performance cache
///
/// Shared between workers behind an `Arc`. Reads run concurrently; writers
/// for the same athlete are serialised through [`EntityCache::fill_lock`].
pub struct EntityCache {
    memory: RwLock<HashMap<AthleteId, CacheEntry>>,
    /// Durable directory; `None` keeps the cache in memory only
    directory: Option<PathBuf>,
    ttl: Option<Duration>,
    fill_locks: FillLocks,
    counters: Counters,
}

impl EntityCache {
    /// Open the cache described by `config`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] if the durable directory cannot be created.
    pub async fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let directory = if config.enabled {
            let dir = PathBuf::from(&config.directory);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| CacheError::Write {
                    key: dir.display().to_string(),
                    message: format!("failed to create cache directory: {e}"),
                })?;
            Some(dir)
        } else {
            None
        };

        tracing::debug!(
            directory = ?directory,
            ttl_seconds = ?config.ttl_seconds,
            "Entity cache opened"
        );

        Ok(Self::with_parts(directory, config.ttl()))
    }

    /// Memory-only cache
    pub fn in_memory(ttl: Option<Duration>) -> Self {
        Self::with_parts(None, ttl)
    }

    fn with_parts(directory: Option<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            directory,
            ttl,
            fill_locks: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Cached performances for `athlete_id` and whether the lookup hit
    ///
    /// `fingerprint` identifies the scan settings of the caller; entries
    /// written under other settings are misses. A miss returns an empty list.
    /// Durable read problems are logged and reported as misses so the caller
    /// refetches.
    pub async fn get(
        &self,
        athlete_id: &AthleteId,
        fingerprint: &str,
    ) -> (Vec<CandidatePerformance>, bool) {
        match self.lookup(athlete_id, fingerprint, Utc::now()).await {
            Some(performances) => (performances, true),
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                (Vec::new(), false)
            }
        }
    }

    async fn lookup(
        &self,
        athlete_id: &AthleteId,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Option<Vec<CandidatePerformance>> {
        {
            let memory = self.memory.read().await;
            if let Some(entry) = memory.get(athlete_id) {
                if entry.is_fresh(self.ttl, now) && entry.was_scanned_with(fingerprint) {
                    self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.performances.clone());
                }
            }
        }

        let entry = match self.read_durable(athlete_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(athlete_id = %athlete_id, error = %e, "Ignoring unusable cache entry");
                return None;
            }
        };

        if !entry.is_fresh(self.ttl, now) {
            tracing::debug!(
                athlete_id = %athlete_id,
                written_at = %entry.written_at,
                "Cache entry expired"
            );
            return None;
        }

        if !entry.was_scanned_with(fingerprint) {
            tracing::debug!(
                athlete_id = %athlete_id,
                stored = %entry.scan_fingerprint,
                current = %fingerprint,
                "Cache entry written under other scan settings"
            );
            return None;
        }

        self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
        let performances = entry.performances.clone();
        self.memory.write().await.insert(athlete_id.clone(), entry);
        Some(performances)
    }

    async fn read_durable(&self, athlete_id: &AthleteId) -> Result<Option<CacheEntry>, CacheError> {
        let Some(path) = self.entry_path(athlete_id) else {
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Read {
                    key: athlete_id.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                key: athlete_id.to_string(),
                message: e.to_string(),
            })?;

        if !entry.is_valid_for(athlete_id) {
            return Err(CacheError::Corrupt {
                key: athlete_id.to_string(),
                message: format!("entry belongs to athlete {}", entry.athlete_id),
            });
        }

        Ok(Some(entry))
    }

    /// Replace the cached performances for `athlete_id` in both layers
    ///
    /// The entry is tagged with `fingerprint` so lookups under other scan
    /// settings miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] if the durable record cannot be written.
    /// The memory layer is left untouched in that case.
    pub async fn put(
        &self,
        athlete_id: &AthleteId,
        fingerprint: &str,
        performances: Vec<CandidatePerformance>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(athlete_id.clone(), fingerprint, performances);

        if let Some(path) = self.entry_path(athlete_id) {
            write_atomically(&path, &entry).await?;
        }

        self.memory.write().await.insert(athlete_id.clone(), entry);
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Drop `athlete_id` from both layers
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] if an existing durable record cannot be removed.
    pub async fn invalidate(&self, athlete_id: &AthleteId) -> Result<(), CacheError> {
        self.memory.write().await.remove(athlete_id);

        if let Some(path) = self.entry_path(athlete_id) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Write {
                        key: athlete_id.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Per-athlete fill guard
    ///
    /// Holding the guard across lookup, fetch and `put` keeps two workers from
    /// filling the same athlete at once. Other athletes are unaffected. The
    /// lock is forgotten once the last holder or waiter lets go.
    pub async fn fill_lock(&self, athlete_id: &AthleteId) -> FillGuard<'_> {
        let lock = {
            let mut locks = self
                .fill_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(athlete_id.clone()).or_default())
        };
        let guard = Arc::clone(&lock).lock_owned().await;
        FillGuard {
            locks: &self.fill_locks,
            athlete_id: athlete_id.clone(),
            lock,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn tracked_fill_locks(&self) -> usize {
        self.fill_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    fn entry_path(&self, athlete_id: &AthleteId) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(CacheEntry::file_name(athlete_id)))
    }
}

/// Held while one worker fills an athlete; see [`EntityCache::fill_lock`]
pub struct FillGuard<'a> {
    locks: &'a FillLocks,
    athlete_id: AthleteId,
    lock: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FillGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // the map and this guard are the only owners left
        let idle = Arc::strong_count(&self.lock) == 2;
        let ours = locks
            .get(&self.athlete_id)
            .is_some_and(|held| Arc::ptr_eq(held, &self.lock));
        if idle && ours {
            locks.remove(&self.athlete_id);
        }
    }
}

async fn write_atomically(path: &Path, entry: &CacheEntry) -> Result<(), CacheError> {
    let key = entry.athlete_id.to_string();
    let write_error = |message: String| CacheError::Write {
        key: key.clone(),
        message,
    };

    let bytes = serde_json::to_vec_pretty(entry).map_err(|e| write_error(e.to_string()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    tokio::fs::write(&temp_path, &bytes)
        .await
        .map_err(|e| write_error(format!("failed to write temporary file: {e}")))?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(write_error(format!("failed to replace cache file: {e}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, TargetEvent};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const FP: &str = "strict;64;400 Free,800 Free,1500 Free";

    fn athlete(id: &str) -> AthleteId {
        AthleteId::new(id).unwrap()
    }

    fn performance(seconds: f64) -> CandidatePerformance {
        CandidatePerformance {
            event: TargetEvent::Free800,
            course: Course::LongCourse,
            seconds,
            date: NaiveDate::from_ymd_opt(2025, 5, 4).unwrap(),
            meet_name: None,
            meet_country: None,
        }
    }

    fn config(dir: &TempDir, ttl_seconds: Option<u64>) -> CacheConfig {
        CacheConfig {
            enabled: true,
            directory: dir.path().join("athletes").display().to_string(),
            ttl_seconds,
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit_from_memory() {
        let cache = EntityCache::in_memory(None);
        let id = athlete("1003542");

        let (rows, hit) = cache.get(&id, FP).await;
        assert!(!hit);
        assert!(rows.is_empty());

        cache.put(&id, FP, vec![performance(470.0)]).await.unwrap();
        let (rows, hit) = cache.get(&id, FP).await;
        assert!(hit);
        assert_eq!(rows, vec![performance(470.0)]);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_empty_list_is_a_hit() {
        let cache = EntityCache::in_memory(None);
        let id = athlete("42");
        cache.put(&id, FP, Vec::new()).await.unwrap();

        let (rows, hit) = cache.get(&id, FP).await;
        assert!(hit);
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_durable_entry_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let id = athlete("1003542");

        let first = EntityCache::open(&config(&dir, None)).await.unwrap();
        first.put(&id, FP, vec![performance(470.0)]).await.unwrap();

        let second = EntityCache::open(&config(&dir, None)).await.unwrap();
        let (rows, hit) = second.get(&id, FP).await;
        assert!(hit);
        assert_eq!(rows.len(), 1);
        assert_eq!(second.stats().disk_hits, 1);

        // promoted into memory
        let _ = second.get(&id, FP).await;
        assert_eq!(second.stats().memory_hits, 1);
    }

    #[tokio::test]
    async fn test_put_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::open(&config(&dir, None)).await.unwrap();
        cache.put(&athlete("1"), FP, vec![performance(470.0)]).await.unwrap();
        cache.put(&athlete("1"), FP, vec![performance(469.0)]).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(cache.directory().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CacheEntry::file_name(&athlete("1"))]);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_gets_overwritten() {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::open(&config(&dir, None)).await.unwrap();
        let id = athlete("7");
        let path = cache
            .directory()
            .unwrap()
            .join(CacheEntry::file_name(&id));
        std::fs::write(&path, b"{ not json").unwrap();

        let (_, hit) = cache.get(&id, FP).await;
        assert!(!hit);

        cache.put(&id, FP, vec![performance(480.0)]).await.unwrap();
        let reopened = EntityCache::open(&config(&dir, None)).await.unwrap();
        let (rows, hit) = reopened.get(&id, FP).await;
        assert!(hit);
        assert_eq!(rows[0].seconds, 480.0);
    }

    #[tokio::test]
    async fn test_entry_for_other_athlete_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::open(&config(&dir, None)).await.unwrap();
        let stored = CacheEntry::new(athlete("other"), FP, vec![performance(470.0)]);
        let path = cache
            .directory()
            .unwrap()
            .join(CacheEntry::file_name(&athlete("mine")));
        std::fs::write(&path, serde_json::to_vec(&stored).unwrap()).unwrap();

        let (_, hit) = cache.get(&athlete("mine"), FP).await;
        assert!(!hit);
    }

    #[tokio::test]
    async fn test_stale_durable_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::open(&config(&dir, Some(3600))).await.unwrap();
        let id = athlete("9");
        let mut stale = CacheEntry::new(id.clone(), FP, vec![performance(470.0)]);
        stale.written_at = Utc::now() - chrono::Duration::days(2);
        let path = cache
            .directory()
            .unwrap()
            .join(CacheEntry::file_name(&id));
        std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        let (_, hit) = cache.get(&id, FP).await;
        assert!(!hit);
    }

    #[tokio::test]
    async fn test_disabled_cache_writes_nothing_to_disk() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, None);
        cfg.enabled = false;
        let cache = EntityCache::open(&cfg).await.unwrap();
        cache.put(&athlete("1"), FP, vec![performance(470.0)]).await.unwrap();

        assert!(cache.directory().is_none());
        assert!(!dir.path().join("athletes").exists());
        assert!(cache.get(&athlete("1"), FP).await.1);
    }

    #[tokio::test]
    async fn test_invalidate_drops_both_layers() {
        let dir = TempDir::new().unwrap();
        let cache = EntityCache::open(&config(&dir, None)).await.unwrap();
        let id = athlete("5");
        cache.put(&id, FP, vec![performance(470.0)]).await.unwrap();

        cache.invalidate(&id).await.unwrap();
        assert!(!cache.get(&id, FP).await.1);
        cache.invalidate(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_fill_lock_serialises_same_key_only() {
        let cache = Arc::new(EntityCache::in_memory(None));
        let a = athlete("a");
        let b = athlete("b");

        let guard = cache.fill_lock(&a).await;

        // other keys are not blocked
        let other = tokio::time::timeout(Duration::from_millis(200), cache.fill_lock(&b)).await;
        assert!(other.is_ok());

        let contended = {
            let cache = Arc::clone(&cache);
            let a = a.clone();
            tokio::spawn(async move { cache.fill_lock(&a).await; })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contended.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contended)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_entry_from_other_scan_settings_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let id = athlete("1003542");
        let lenient = "lenient;64;400 Free,800 Free,1500 Free";

        let cache = EntityCache::open(&config(&dir, None)).await.unwrap();
        cache.put(&id, FP, vec![performance(470.0)]).await.unwrap();
        assert!(!cache.get(&id, lenient).await.1);
        assert!(cache.get(&id, FP).await.1);

        let reopened = EntityCache::open(&config(&dir, None)).await.unwrap();
        assert!(!reopened.get(&id, lenient).await.1);
        assert_eq!(reopened.stats().disk_hits, 0);

        reopened.put(&id, lenient, Vec::new()).await.unwrap();
        let (rows, hit) = reopened.get(&id, lenient).await;
        assert!(hit);
        assert!(rows.is_empty());
        assert!(!reopened.get(&id, FP).await.1);
    }

    #[tokio::test]
    async fn test_fill_locks_are_forgotten_after_release() {
        let cache = Arc::new(EntityCache::in_memory(None));
        let a = athlete("a");

        {
            let _first = cache.fill_lock(&a).await;
            let _second = cache.fill_lock(&athlete("b")).await;
            assert_eq!(cache.tracked_fill_locks(), 2);
        }
        assert_eq!(cache.tracked_fill_locks(), 0);

        let guard = cache.fill_lock(&a).await;
        let waiter = {
            let cache = Arc::clone(&cache);
            let a = a.clone();
            tokio::spawn(async move {
                let _guard = cache.fill_lock(&a).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // the waiter still needs the same lock
        drop(guard);
        assert_eq!(cache.tracked_fill_locks(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cache.tracked_fill_locks(), 0);
    }
}
