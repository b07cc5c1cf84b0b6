//! Memoized snapshot loading.
//!
//! Discovery is always redone so a newer snapshot wins immediately; only the
//! parse of an unchanged file is skipped.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::io::snapshot::{LoadedSnapshot, latest_snapshot, load_series};

/// Identity of a file's contents as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| AppError::io(path, e))?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<PathBuf, (FileStamp, LoadedSnapshot)>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest snapshot in `dir`, parsed at most once per file version.
    pub fn load(&mut self, dir: &Path) -> Result<LoadedSnapshot> {
        let file = latest_snapshot(dir)?;
        let stamp = FileStamp::of(&file.path)?;

        if let Some((cached, snapshot)) = self.entries.get(&file.path) {
            if *cached == stamp {
                debug!(file = %file.path.display(), "snapshot cache hit");
                return Ok(snapshot.clone());
            }
            debug!(file = %file.path.display(), "snapshot changed on disk; reloading");
        } else {
            debug!(file = %file.path.display(), "snapshot cache miss");
        }

        let snapshot = LoadedSnapshot {
            series: load_series(&file.path)?,
            path: file.path.clone(),
            tag: file.tag,
        };
        // Only the latest snapshot of a directory is kept.
        let parent = file.path.parent().map(Path::to_path_buf);
        self.entries
            .retain(|path, _| path.parent() != parent.as_deref() || *path == file.path);
        self.entries.insert(file.path, (stamp, snapshot.clone()));
        Ok(snapshot)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_unchanged_file_and_reloads_rewritten_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls_2024-02.csv");
        fs::write(&path, "ds,y\n2024-01-01,10\n2024-02-01,20\n").unwrap();

        let mut cache = SnapshotCache::new();
        let first = cache.load(dir.path()).unwrap();
        let again = cache.load(dir.path()).unwrap();
        assert_eq!(first, again);
        assert_eq!(cache.len(), 1);

        // Different length guarantees a new stamp even on coarse mtime clocks.
        fs::write(&path, "ds,y\n2024-01-01,10\n2024-02-01,20\n2024-03-01,300\n").unwrap();
        let reloaded = cache.load(dir.path()).unwrap();
        assert_eq!(reloaded.series.len(), 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn newer_snapshot_wins_over_cached_one() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("calls_2024-01.csv"), "ds,y\n2024-01-01,10\n").unwrap();
        let mut cache = SnapshotCache::new();
        assert_eq!(cache.load(dir.path()).unwrap().series.len(), 1);

        fs::write(
            dir.path().join("calls_2024-02.csv"),
            "ds,y\n2024-01-01,10\n2024-02-01,12\n",
        )
        .unwrap();
        let latest = cache.load(dir.path()).unwrap();
        assert_eq!(latest.tag.to_string(), "2024-02");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn superseded_snapshot_is_evicted_per_directory() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(a.path().join("calls_2024-01.csv"), "ds,y\n2024-01-01,10\n").unwrap();
        fs::write(b.path().join("calls_2024-01.csv"), "ds,y\n2024-01-01,20\n").unwrap();

        let mut cache = SnapshotCache::new();
        cache.load(a.path()).unwrap();
        cache.load(b.path()).unwrap();
        assert_eq!(cache.len(), 2);

        fs::write(
            a.path().join("calls_2024-02.csv"),
            "ds,y\n2024-01-01,10\n2024-02-01,12\n",
        )
        .unwrap();
        cache.load(a.path()).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.entries.contains_key(&a.path().join("calls_2024-02.csv")));
        assert!(!cache.entries.contains_key(&a.path().join("calls_2024-01.csv")));
        assert!(cache.entries.contains_key(&b.path().join("calls_2024-01.csv")));
    }
}
