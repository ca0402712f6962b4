//! Sync Engine
//!
//! Re-fetches every registered source and reports a per-source summary.

use crate::error::{ModkitError, Result};
use crate::source::fetcher::Fetch;
use crate::source::registry::SourceRegistry;
use crate::source::types::{Manifest, Source};

/// Progress event emitted before each source is fetched
#[derive(Debug, Clone)]
pub struct SyncProgress<'a> {
    /// 1-based position in the run
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
}

/// One source that failed to refresh
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub name: String,
    pub reason: String,
}

/// Outcome of a full sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub updated: usize,
    pub total: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sync Engine - sequential refresh of all registered sources.
///
/// Sources are processed strictly in registry order so progress stays
/// monotonic; one source failing never aborts the rest of the batch.
pub struct SyncEngine<'a, F: Fetch> {
    registry: &'a SourceRegistry,
    fetcher: &'a F,
}

impl<'a, F: Fetch> SyncEngine<'a, F> {
    pub fn new(registry: &'a SourceRegistry, fetcher: &'a F) -> Self {
        Self { registry, fetcher }
    }

    /// Refresh every source, persist once, and return the summary.
    pub fn update_all<P>(&self, mut progress: P) -> Result<SyncReport>
    where
        P: FnMut(SyncProgress<'_>),
    {
        let snapshot = self.registry.list();
        let total = snapshot.len();
        let mut refreshed = Vec::new();
        let mut failures = Vec::new();

        for (i, source) in snapshot.iter().enumerate() {
            progress(SyncProgress {
                index: i + 1,
                total,
                name: &source.name,
            });

            match self.refresh(source) {
                Ok(fresh) => refreshed.push(fresh),
                Err(err) => {
                    log::warn!("sync of '{}' failed: {}", source.name, err);
                    failures.push(SyncFailure {
                        name: source.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let updated = refreshed.len();
        self.registry.apply_refreshed(refreshed)?;

        Ok(SyncReport {
            updated,
            total,
            failures,
        })
    }

    fn refresh(&self, source: &Source) -> Result<Source> {
        let document = self.fetcher.fetch_document(&source.url)?;
        let manifest = Manifest::from_value(document, &source.url)?;

        if manifest.id != source.id {
            return Err(ModkitError::IdentityMismatch {
                local: source.id.clone(),
                remote: manifest.id,
            });
        }

        // The url is registry-owned; from_manifest pins it back to the
        // stored value regardless of what the manifest claims.
        Ok(Source::from_manifest(manifest, &source.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FakeFetcher {
        bodies: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                bodies: entries
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetch for FakeFetcher {
        fn fetch_document(&self, url: &str) -> Result<serde_json::Value> {
            let body = self.fetch_text(url)?;
            crate::source::fetcher::parse_document(&body).ok_or_else(|| ModkitError::NotJson {
                url: url.to_string(),
            })
        }

        fn fetch_text(&self, url: &str) -> Result<String> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| ModkitError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    fn seeded_registry(temp: &TempDir, entries: &[(&str, &str)]) -> SourceRegistry {
        let registry = SourceRegistry::load(temp.path().join("sources.json"));
        for (id, url) in entries {
            registry
                .insert(Source {
                    id: id.to_string(),
                    name: format!("Source {}", id),
                    url: url.to_string(),
                    data: Vec::new(),
                })
                .unwrap();
        }
        registry
    }

    fn manifest_body(id: &str, module_ids: &[&str]) -> String {
        let modules: Vec<serde_json::Value> = module_ids
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m,
                    "name": format!("Module {}", m),
                    "url": format!("https://example.com/{}_module.py", m)
                })
            })
            .collect();

        serde_json::json!({
            "name": format!("Source {}", id),
            "id": id,
            "data": modules
        })
        .to_string()
    }

    #[test]
    fn test_update_all_replaces_data_and_keeps_url() {
        let temp = TempDir::new().unwrap();
        let url = "https://a.example.com/s.json";
        let registry = seeded_registry(&temp, &[("a", url)]);
        let fetcher = FakeFetcher::new(&[(url, &manifest_body("a", &["x", "y"]))]);

        let report = SyncEngine::new(&registry, &fetcher)
            .update_all(|_| {})
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.total, 1);
        assert!(report.is_clean());

        let sources = registry.list();
        assert_eq!(sources[0].module_count(), 2);
        assert_eq!(sources[0].url, url);

        // Persisted once: a reload sees the refreshed data
        let reloaded = SourceRegistry::load(registry.path().to_path_buf());
        assert_eq!(reloaded.list()[0].module_count(), 2);
    }

    #[test]
    fn test_identity_mismatch_leaves_source_untouched() {
        let temp = TempDir::new().unwrap();
        let url_a = "https://a.example.com/s.json";
        let url_b = "https://b.example.com/s.json";
        let registry = seeded_registry(&temp, &[("a", url_a), ("b", url_b)]);
        let fetcher = FakeFetcher::new(&[
            (url_a, &manifest_body("changed-id", &["x"])),
            (url_b, &manifest_body("b", &["y"])),
        ]);

        let report = SyncEngine::new(&registry, &fetcher)
            .update_all(|_| {})
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "Source a");
        assert!(report.failures[0].reason.contains("mismatch"));

        let sources = registry.list();
        assert_eq!(sources[0].id, "a");
        assert_eq!(sources[0].module_count(), 0);
        assert_eq!(sources[1].module_count(), 1);
    }

    #[test]
    fn test_fetch_failure_does_not_abort_batch() {
        let temp = TempDir::new().unwrap();
        let url_a = "https://a.example.com/s.json";
        let url_b = "https://b.example.com/s.json";
        let registry = seeded_registry(&temp, &[("a", url_a), ("b", url_b)]);
        // Source a has no response registered, simulating HTTP 404
        let fetcher = FakeFetcher::new(&[(url_b, &manifest_body("b", &["y"]))]);

        let report = SyncEngine::new(&registry, &fetcher)
            .update_all(|_| {})
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("404"));
    }

    #[test]
    fn test_invalid_manifest_recorded() {
        let temp = TempDir::new().unwrap();
        let url = "https://a.example.com/s.json";
        let registry = seeded_registry(&temp, &[("a", url)]);
        let fetcher = FakeFetcher::new(&[(url, r#"{"name": "only a name"}"#)]);

        let report = SyncEngine::new(&registry, &fetcher)
            .update_all(|_| {})
            .unwrap();

        assert_eq!(report.updated, 0);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_progress_is_monotonic_and_emitted_before_fetch() {
        let temp = TempDir::new().unwrap();
        let url_a = "https://a.example.com/s.json";
        let url_b = "https://b.example.com/s.json";
        let registry = seeded_registry(&temp, &[("a", url_a), ("b", url_b)]);
        let fetcher = FakeFetcher::new(&[]);

        let mut events = Vec::new();
        SyncEngine::new(&registry, &fetcher)
            .update_all(|p| events.push((p.index, p.total, p.name.to_string())))
            .unwrap();

        assert_eq!(
            events,
            vec![
                (1, 2, "Source a".to_string()),
                (2, 2, "Source b".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::load(temp.path().join("sources.json"));
        let fetcher = FakeFetcher::new(&[]);

        let report = SyncEngine::new(&registry, &fetcher)
            .update_all(|_| {})
            .unwrap();

        assert_eq!(report.total, 0);
        assert!(report.is_clean());
    }
}
