use std::path::PathBuf;

use thiserror::Error;

use crate::source::types::InstallCandidate;
use crate::store::PluginState;

#[derive(Debug, Error)]
pub enum ModkitError {
    #[error("Source already registered: {url}")]
    DuplicateSource { url: String },

    #[error("Invalid source manifest from {url}: missing 'name', 'id' or 'data'")]
    InvalidManifest { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Response from {url} is not valid JSON")]
    NotJson { url: String },

    #[error("Source id mismatch: local '{local}' != remote '{remote}'")]
    IdentityMismatch { local: String, remote: String },

    #[error("Plugin not found: {id}")]
    PluginNotFound { id: String },

    #[error("Multiple sources provide '{id}' - reinstall as <source_id>/{id}")]
    AmbiguousInstall {
        id: String,
        candidates: Vec<InstallCandidate>,
    },

    #[error("Invalid plugin content - no class implementing the BaseModule contract")]
    InvalidPluginContent,

    #[error("Invalid plugin filename: '{filename}' must end with '{expected}'")]
    InvalidFilename {
        filename: String,
        expected: &'static str,
    },

    #[error("Plugin '{id}' is already {target}")]
    AlreadyInTargetState { id: String, target: PluginState },

    #[error("Source index {index} out of range (1..={count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ModkitError>;

impl ModkitError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PluginNotFound { .. } => 2,
            Self::AmbiguousInstall { .. } => 3,
            Self::DuplicateSource { .. } | Self::IndexOutOfRange { .. } => 4,
            Self::InvalidManifest { .. } | Self::NotJson { .. } | Self::IdentityMismatch { .. } => 5,
            Self::InvalidPluginContent | Self::InvalidFilename { .. } => 6,
            Self::AlreadyInTargetState { .. } => 7,
            _ => 1,
        }
    }
}
