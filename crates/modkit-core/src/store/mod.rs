//! Store Module
//!
//! Local plugin files and the validation applied before anything is
//! committed to disk.
//!
//! - `local`: filesystem-backed plugin store (enabled/disabled by suffix)
//! - `validator`: pluggable structural content check

pub mod local;
pub mod validator;

// Re-exports
pub use local::{
    ExportedPlugin, LocalStore, PluginState, StoreListing, DISABLED_SUFFIX, ENABLED_SUFFIX,
};
pub use validator::{BaseModuleValidator, ContentValidator};
