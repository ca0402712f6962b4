//! Source Module
//!
//! Remote plugin sources and everything that feeds off them:
//!
//! - `types`: manifest / source / module records
//! - `registry`: persisted, mutex-guarded source list
//! - `fetcher`: HTTP retrieval with tolerant JSON parsing
//! - `sync`: sequential refresh of all sources
//! - `search`: keyword search across manifests
//! - `publisher`: manifest generation from a plugin directory

pub mod fetcher;
pub mod publisher;
pub mod registry;
pub mod search;
pub mod sync;
pub mod types;

// Re-exports
pub use fetcher::{recover_embedded_json, Fetch, ManifestFetcher};
pub use publisher::SourcePublisher;
pub use registry::SourceRegistry;
pub use search::{search_sources, SearchGroup};
pub use sync::{SyncEngine, SyncFailure, SyncProgress, SyncReport};
pub use types::{InstallCandidate, Manifest, Module, Source};
