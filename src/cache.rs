//! Read-through cache of term-frequency tables, invalidated by source mtime.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::TermFrequencies;
use crate::error::{Error, Result};
use crate::tokenizer::NgramRange;

#[derive(Serialize, Deserialize, Debug)]
struct CacheEntry {
    source: String,
    ngram: NgramRange,
    term_frequencies: TermFrequencies,
}

/// Fixed hasher keys, so a source keeps the same entry file across runs.
const DIGEST_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Debug, Clone)]
pub struct TermCache {
    dir: PathBuf,
}

impl TermCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The cached table for `source`, unless the source changed since it was
    /// written or it was built with a different n-gram range.
    pub fn get(&self, source: &Path, ngram: NgramRange) -> Result<Option<TermFrequencies>> {
        let entry_path = self.entry_path(source);

        let entry_modified = match fs::metadata(&entry_path) {
            Ok(meta) => meta.modified().map_err(|e| Error::io(&entry_path, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(&entry_path, e)),
        };
        let source_modified = fs::metadata(source)
            .and_then(|meta| meta.modified())
            .map_err(|e| Error::io(source, e))?;
        if source_modified > entry_modified {
            debug!(source = %source.display(), "cache entry is stale");
            return Ok(None);
        }

        let data = fs::read_to_string(&entry_path).map_err(|e| Error::io(&entry_path, e))?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(entry = %entry_path.display(), error = %e, "discarding corrupt cache entry");
                return Ok(None);
            }
        };

        if entry.source != source.to_string_lossy() || entry.ngram != ngram {
            return Ok(None);
        }
        Ok(Some(entry.term_frequencies))
    }

    pub fn set(&self, source: &Path, ngram: NgramRange, table: &TermFrequencies) -> Result<()> {
        let entry = CacheEntry {
            source: source.to_string_lossy().into_owned(),
            ngram,
            term_frequencies: table.clone(),
        };
        let entry_path = self.entry_path(source);
        fs::write(&entry_path, serde_json::to_string(&entry)?)
            .map_err(|e| Error::io(&entry_path, e))
    }

    /// Removes every entry.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&self.dir, e)),
        }
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }

    fn entry_path(&self, source: &Path) -> PathBuf {
        self.dir.join(entry_file_name(source))
    }
}

fn entry_file_name(source: &Path) -> String {
    let [k0, k1, k2, k3] = DIGEST_SEEDS;
    let digest = RandomState::with_seeds(k0, k1, k2, k3).hash_one(source);
    format!("{digest:016x}.json")
}

/// `$XDG_CACHE_HOME/internal-link`, else `$HOME/.cache/internal-link`.
pub fn default_cache_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("internal-link"));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".cache").join("internal-link"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn sample() -> TermFrequencies {
        [("static site".to_string(), 2), ("generator".to_string(), 1)]
            .into_iter()
            .collect()
    }

    fn setup() -> (TempDir, TermCache, PathBuf) {
        let dir = TempDir::new().unwrap();
        let cache = TermCache::open(dir.path().join("cache")).unwrap();
        let source = dir.path().join("doc.md");
        fs::write(&source, "Static site generator").unwrap();
        (dir, cache, source)
    }

    fn backdate(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_miss_then_hit() {
        let (_dir, cache, source) = setup();
        let range = NgramRange::new(1, 2);

        assert_eq!(cache.get(&source, range).unwrap(), None);
        backdate(&source, 60);
        cache.set(&source, range, &sample()).unwrap();
        assert_eq!(cache.get(&source, range).unwrap(), Some(sample()));
    }

    #[test]
    fn test_modified_source_invalidates() {
        let (_dir, cache, source) = setup();
        let range = NgramRange::default();
        cache.set(&source, range, &sample()).unwrap();
        backdate(&cache.entry_path(&source), 60);

        fs::write(&source, "changed").unwrap();
        assert_eq!(cache.get(&source, range).unwrap(), None);
    }

    #[test]
    fn test_different_range_misses() {
        let (_dir, cache, source) = setup();
        backdate(&source, 60);
        cache.set(&source, NgramRange::new(1, 1), &sample()).unwrap();
        assert_eq!(cache.get(&source, NgramRange::new(2, 3)).unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (_dir, cache, source) = setup();
        backdate(&source, 60);
        fs::write(cache.entry_path(&source), "{not json").unwrap();
        assert_eq!(cache.get(&source, NgramRange::default()).unwrap(), None);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let (dir, cache, _source) = setup();
        let gone = dir.path().join("gone.md");
        fs::write(&gone, "x").unwrap();
        cache.set(&gone, NgramRange::default(), &sample()).unwrap();
        fs::remove_file(&gone).unwrap();
        assert!(matches!(
            cache.get(&gone, NgramRange::default()),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_entry_name_uses_fixed_keys() {
        let source = Path::new("/srv/docs/guides/setup.md");
        let pinned = RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        )
        .hash_one(source);
        assert_eq!(entry_file_name(source), format!("{pinned:016x}.json"));

        // Process-seeded hashing would rename entries on every run
        let per_process = RandomState::new().hash_one(source);
        assert_ne!(entry_file_name(source), format!("{per_process:016x}.json"));
    }

    #[test]
    fn test_reopened_cache_hits_without_new_entries() {
        let (dir, cache, source) = setup();
        let range = NgramRange::default();
        backdate(&source, 60);
        cache.set(&source, range, &sample()).unwrap();

        let reopened = TermCache::open(dir.path().join("cache")).unwrap();
        assert_eq!(reopened.get(&source, range).unwrap(), Some(sample()));
        reopened.set(&source, range, &sample()).unwrap();
        assert_eq!(fs::read_dir(reopened.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_clear() {
        let (_dir, cache, source) = setup();
        backdate(&source, 60);
        cache.set(&source, NgramRange::default(), &sample()).unwrap();
        cache.clear().unwrap();
        assert!(cache.dir().exists());
        assert_eq!(cache.get(&source, NgramRange::default()).unwrap(), None);
    }
}
