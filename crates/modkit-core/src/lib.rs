pub mod config;
pub mod error;
pub mod manager;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{ModkitError, Result};
pub use manager::{InstallOutcome, PluginManager};
pub use source::{
    recover_embedded_json, search_sources, Fetch, InstallCandidate, Manifest, ManifestFetcher,
    Module, SearchGroup, Source, SourcePublisher, SourceRegistry, SyncEngine, SyncFailure,
    SyncProgress, SyncReport,
};
pub use store::{
    BaseModuleValidator, ContentValidator, ExportedPlugin, LocalStore, PluginState, StoreListing,
    DISABLED_SUFFIX, ENABLED_SUFFIX,
};
