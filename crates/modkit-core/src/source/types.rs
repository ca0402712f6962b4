//! Source and module type definitions
//!
//! Types for working with plugin sources and their manifests.

use serde::{Deserialize, Serialize};

use crate::error::{ModkitError, Result};

/// One installable plugin's metadata entry within a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier (unique within its source)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Version
    #[serde(default)]
    pub version: String,
    /// Raw content URL for installation
    #[serde(default)]
    pub url: String,
}

/// The document returned by fetching a source URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Source display name
    pub name: String,
    /// Stable source identifier chosen by the maintainer
    pub id: String,
    /// Generation timestamp, emitted by the publisher and otherwise ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Module list
    #[serde(default)]
    pub data: Vec<Module>,
}

impl Manifest {
    /// Validate and convert a fetched document.
    ///
    /// Requires all of `name`, `id` and `data` to be present; the fetcher
    /// itself does no schema validation.
    pub fn from_value(value: serde_json::Value, url: &str) -> Result<Self> {
        let has_required = ["name", "id", "data"]
            .iter()
            .all(|key| value.get(key).is_some());
        if !has_required {
            return Err(ModkitError::InvalidManifest {
                url: url.to_string(),
            });
        }

        serde_json::from_value(value).map_err(|_| ModkitError::InvalidManifest {
            url: url.to_string(),
        })
    }
}

/// A registered remote source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Stable source identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Fetch origin; the registry's external key
    pub url: String,
    /// Module list from the last sync
    #[serde(default)]
    pub data: Vec<Module>,
}

impl Source {
    /// Build a source from a fetched manifest.
    ///
    /// The url is registry-owned: the requested fetch url wins over anything
    /// the manifest may claim about itself.
    pub fn from_manifest(manifest: Manifest, url: &str) -> Self {
        Self {
            id: manifest.id,
            name: manifest.name,
            url: url.to_string(),
            data: manifest.data,
        }
    }

    pub fn module_count(&self) -> usize {
        self.data.len()
    }
}

/// One match of an install lookup, reported back on ambiguity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCandidate {
    pub source_id: String,
    pub source_name: String,
    pub module_id: String,
    pub module_name: String,
}

impl InstallCandidate {
    /// Qualified install address for this candidate
    pub fn address(&self) -> String {
        format!("{}/{}", self.source_id, self.module_id)
    }
}
