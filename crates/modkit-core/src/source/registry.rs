//! Source Registry
//!
//! Persisted list of registered plugin sources (sources.json).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{ModkitError, Result};
use crate::source::types::Source;

/// Source Registry - ordered list of remote sources, persisted as JSON.
///
/// All mutation goes through this object; the internal mutex serializes
/// read-modify-write cycles from concurrent commands.
pub struct SourceRegistry {
    path: PathBuf,
    sources: Mutex<Vec<Source>>,
}

impl SourceRegistry {
    /// Load the registry from its JSON file.
    ///
    /// A missing or unparsable file yields an empty registry, not an error.
    pub fn load(path: PathBuf) -> Self {
        let sources = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(sources) => sources,
                Err(err) => {
                    log::warn!("ignoring unparsable registry {}: {}", path.display(), err);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self {
            path,
            sources: Mutex::new(sources),
        }
    }

    /// Registry file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all sources in display order
    pub fn list(&self) -> Vec<Source> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.lock().iter().any(|source| source.url == url)
    }

    /// Append a source and persist.
    ///
    /// Fails with `DuplicateSource` when the url is already registered; the
    /// check runs under the same lock as the append.
    pub fn insert(&self, source: Source) -> Result<()> {
        let mut sources = self.lock();

        if sources.iter().any(|existing| existing.url == source.url) {
            return Err(ModkitError::DuplicateSource { url: source.url });
        }

        sources.push(source);
        self.save_locked(&sources)
    }

    /// Remove the source at a 1-based index, persist, and return it.
    pub fn remove(&self, index: usize) -> Result<Source> {
        let mut sources = self.lock();

        if index < 1 || index > sources.len() {
            return Err(ModkitError::IndexOutOfRange {
                index,
                count: sources.len(),
            });
        }

        let removed = sources.remove(index - 1);
        self.save_locked(&sources)?;
        Ok(removed)
    }

    /// Apply refreshed sources produced by a sync run and persist once.
    ///
    /// Entries are matched by url, not index: the list may have shifted
    /// under a concurrent remove while the sync was fetching.
    pub(crate) fn apply_refreshed(&self, refreshed: Vec<Source>) -> Result<()> {
        let mut sources = self.lock();

        for fresh in refreshed {
            if let Some(slot) = sources.iter_mut().find(|s| s.url == fresh.url) {
                *slot = fresh;
            }
        }

        self.save_locked(&sources)
    }

    fn save_locked(&self, sources: &[Source]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(sources)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Source>> {
        self.sources.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_registry() -> (SourceRegistry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let registry = SourceRegistry::load(temp_dir.path().join("sources.json"));
        (registry, temp_dir)
    }

    fn sample_source(id: &str, url: &str) -> Source {
        Source {
            id: id.to_string(),
            name: format!("Source {}", id),
            url: url.to_string(),
            data: Vec::new(),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let (registry, _temp) = create_test_registry();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_unparsable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sources.json");
        fs::write(&path, "{not json").unwrap();

        let registry = SourceRegistry::load(path);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_and_list() {
        let (registry, _temp) = create_test_registry();

        registry
            .insert(sample_source("a", "https://a.example.com/s.json"))
            .unwrap();

        let sources = registry.list();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "a");
    }

    #[test]
    fn test_insert_duplicate_url() {
        let (registry, _temp) = create_test_registry();
        let url = "https://a.example.com/s.json";

        registry.insert(sample_source("a", url)).unwrap();
        let result = registry.insert(sample_source("b", url));

        assert!(matches!(result, Err(ModkitError::DuplicateSource { .. })));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].id, "a");
    }

    #[test]
    fn test_remove_out_of_range() {
        let (registry, _temp) = create_test_registry();
        registry
            .insert(sample_source("a", "https://a.example.com/s.json"))
            .unwrap();

        assert!(matches!(
            registry.remove(0),
            Err(ModkitError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            registry.remove(2),
            Err(ModkitError::IndexOutOfRange { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_persists() {
        let (registry, _temp) = create_test_registry();
        registry
            .insert(sample_source("a", "https://a.example.com/s.json"))
            .unwrap();
        registry
            .insert(sample_source("b", "https://b.example.com/s.json"))
            .unwrap();

        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.id, "a");

        // Restart-equivalent reload reproduces the mutated list
        let reloaded = SourceRegistry::load(registry.path().to_path_buf());
        let sources = reloaded.list();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "b");
    }

    #[test]
    fn test_apply_refreshed_matches_by_url() {
        let (registry, _temp) = create_test_registry();
        registry
            .insert(sample_source("a", "https://a.example.com/s.json"))
            .unwrap();

        let mut fresh = sample_source("a", "https://a.example.com/s.json");
        fresh.name = "Renamed".to_string();
        // A source that disappeared meanwhile is silently skipped
        let gone = sample_source("x", "https://gone.example.com/s.json");

        registry.apply_refreshed(vec![fresh, gone]).unwrap();

        let sources = registry.list();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Renamed");
    }
}
