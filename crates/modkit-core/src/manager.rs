//! Plugin Manager
//!
//! High-level API tying the source registry, fetcher, local store and
//! validator together. This is the surface the command layer talks to.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ModkitError, Result};
use crate::source::fetcher::{Fetch, ManifestFetcher};
use crate::source::registry::SourceRegistry;
use crate::source::search::{search_sources, SearchGroup};
use crate::source::sync::{SyncEngine, SyncProgress, SyncReport};
use crate::source::types::{InstallCandidate, Manifest, Module, Source};
use crate::store::local::{ExportedPlugin, LocalStore, StoreListing};
use crate::store::validator::{BaseModuleValidator, ContentValidator};

/// A successfully resolved and committed install
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Unqualified plugin id the file is addressable as
    pub plugin_id: String,
    pub module_name: String,
    pub version: String,
    pub source_id: String,
    pub source_name: String,
    pub path: PathBuf,
}

/// Install address: `<plugin_id>` or `<source_id>/<plugin_id>`
struct InstallAddress<'a> {
    source_id: Option<&'a str>,
    plugin_id: &'a str,
}

impl<'a> InstallAddress<'a> {
    fn parse(address: &'a str) -> Self {
        match address.split_once('/') {
            Some((source_id, plugin_id)) => Self {
                source_id: Some(source_id),
                plugin_id,
            },
            None => Self {
                source_id: None,
                plugin_id: address,
            },
        }
    }
}

/// Plugin Manager - the full plugin management command contract.
pub struct PluginManager<F: Fetch = ManifestFetcher> {
    registry: SourceRegistry,
    fetcher: F,
    store: LocalStore,
    validator: Box<dyn ContentValidator>,
}

impl PluginManager<ManifestFetcher> {
    /// Create a manager rooted at a base directory.
    pub fn new(base_dir: &Path, config: &Config) -> Result<Self> {
        let plugins_dir = config.plugins_dir(base_dir);
        fs::create_dir_all(&plugins_dir)?;

        Ok(Self {
            registry: SourceRegistry::load(config.sources_file(base_dir)),
            fetcher: ManifestFetcher::new(config.fetch_timeout())?,
            store: LocalStore::new(plugins_dir),
            validator: Box::new(BaseModuleValidator),
        })
    }
}

impl<F: Fetch> PluginManager<F> {
    /// Assemble a manager from explicit parts (used by tests).
    pub fn with_parts(
        registry: SourceRegistry,
        fetcher: F,
        store: LocalStore,
        validator: Box<dyn ContentValidator>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            validator,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // ========== Local Plugins ==========

    pub fn list_plugins(&self) -> Result<StoreListing> {
        self.store.list()
    }

    pub fn enable(&self, id: &str) -> Result<()> {
        self.store.toggle(id, false).map(|_| ())
    }

    pub fn disable(&self, id: &str) -> Result<()> {
        self.store.toggle(id, true).map(|_| ())
    }

    pub fn remove_plugin(&self, id: &str) -> Result<()> {
        self.store.remove(id)
    }

    pub fn export_plugin(&self, id: &str) -> Result<ExportedPlugin> {
        self.store.export(id)
    }

    /// Install a plugin delivered as a file (the upload path).
    pub fn install_from_attachment(&self, filename: &str, content: &str) -> Result<(String, PathBuf)> {
        self.store
            .install_from_attachment(filename, content, self.validator.as_ref())
    }

    // ========== Install from Sources ==========

    /// Resolve an install address against the registered sources, download
    /// the winning module and commit it to the local store.
    ///
    /// An unqualified id matching modules in several sources is reported as
    /// ambiguous, never resolved by precedence; the caller retries with the
    /// qualified `<source_id>/<plugin_id>` form.
    pub fn install(&self, address: &str) -> Result<InstallOutcome> {
        let parsed = InstallAddress::parse(address);
        let sources = self.registry.list();
        let candidates = find_candidates(&sources, &parsed);

        let (source, module) = match candidates.as_slice() {
            [] => {
                return Err(ModkitError::PluginNotFound {
                    id: address.to_string(),
                })
            }
            [only] => *only,
            many => {
                return Err(ModkitError::AmbiguousInstall {
                    id: parsed.plugin_id.to_string(),
                    candidates: many
                        .iter()
                        .map(|(source, module)| InstallCandidate {
                            source_id: source.id.clone(),
                            source_name: source.name.clone(),
                            module_id: module.id.clone(),
                            module_name: module.name.clone(),
                        })
                        .collect(),
                })
            }
        };

        let content = self.fetcher.fetch_text(&module.url)?;
        if !self.validator.validate(&content) {
            return Err(ModkitError::InvalidPluginContent);
        }

        let path = self.store.install(parsed.plugin_id, &content)?;

        Ok(InstallOutcome {
            plugin_id: parsed.plugin_id.to_string(),
            module_name: module.name.clone(),
            version: module.version.clone(),
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            path,
        })
    }

    // ========== Sources ==========

    /// Fetch a manifest, validate it, and register it under the requested url.
    pub fn add_source(&self, url: &str) -> Result<Source> {
        // Cheap pre-check; insert() re-checks under the registry lock
        if self.registry.contains_url(url) {
            return Err(ModkitError::DuplicateSource {
                url: url.to_string(),
            });
        }

        let document = self.fetcher.fetch_document(url)?;
        let manifest = Manifest::from_value(document, url)?;
        let source = Source::from_manifest(manifest, url);

        self.registry.insert(source.clone())?;
        Ok(source)
    }

    /// Remove the source at a 1-based index, returning it.
    pub fn remove_source(&self, index: usize) -> Result<Source> {
        self.registry.remove(index)
    }

    pub fn list_sources(&self) -> Vec<Source> {
        self.registry.list()
    }

    /// Re-fetch every source, reporting progress through the callback.
    pub fn update_sources<P>(&self, progress: P) -> Result<SyncReport>
    where
        P: FnMut(SyncProgress<'_>),
    {
        SyncEngine::new(&self.registry, &self.fetcher).update_all(progress)
    }

    // ========== Search ==========

    pub fn search(&self, keyword: &str) -> Vec<SearchGroup> {
        search_sources(&self.registry.list(), keyword)
    }
}

/// Collect every module matching the address.
///
/// A qualified address restricts the scan to sources with the given id;
/// source ids are not guaranteed unique (only urls are), so even the
/// qualified form can surface more than one candidate.
fn find_candidates<'s>(
    sources: &'s [Source],
    address: &InstallAddress<'_>,
) -> Vec<(&'s Source, &'s Module)> {
    sources
        .iter()
        .filter(|source| {
            address
                .source_id
                .map_or(true, |source_id| source.id == source_id)
        })
        .flat_map(|source| {
            source
                .data
                .iter()
                .filter(|module| module.id == address.plugin_id)
                .map(move |module| (source, module))
        })
        .collect()
}
