//! Local Plugin Store
//!
//! Filesystem-backed registry of installed plugin files. A plugin's
//! enabled/disabled state is encoded in its filename suffix and flipped
//! with a single rename; a plugin never has both representations on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ModkitError, Result};
use crate::store::validator::ContentValidator;

/// Filename suffix marking a file as an enabled plugin
pub const ENABLED_SUFFIX: &str = "_module.py";
/// Suffix of a disabled plugin: the enabled name plus a disabled marker
pub const DISABLED_SUFFIX: &str = "_module.py.disabled";

/// On-disk state of an installed plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Enabled,
    Disabled,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Installed plugins grouped by state, each group sorted by id
#[derive(Debug, Clone, Default)]
pub struct StoreListing {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

impl StoreListing {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }
}

/// A plugin prepared for delivery to the caller
#[derive(Debug, Clone)]
pub struct ExportedPlugin {
    /// Always the enabled-named filename, regardless of stored state
    pub filename: String,
    pub content: String,
}

/// Local Plugin Store - manages plugin files in one directory.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the enabled representation for an id
    pub fn enabled_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", id, ENABLED_SUFFIX))
    }

    /// Path of the disabled representation for an id
    pub fn disabled_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", id, DISABLED_SUFFIX))
    }

    /// Current state of a plugin, or None when not installed
    pub fn state_of(&self, id: &str) -> Option<PluginState> {
        if self.enabled_path(id).exists() {
            Some(PluginState::Enabled)
        } else if self.disabled_path(id).exists() {
            Some(PluginState::Disabled)
        } else {
            None
        }
    }

    /// Enumerate installed plugins.
    ///
    /// A store directory that does not exist yet reads as empty.
    pub fn list(&self) -> Result<StoreListing> {
        let mut listing = StoreListing::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(listing),
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            // Disabled first: its suffix contains the enabled one
            if let Some(id) = strip_plugin_suffix(&file_name, DISABLED_SUFFIX) {
                listing.disabled.push(id.to_string());
            } else if let Some(id) = strip_plugin_suffix(&file_name, ENABLED_SUFFIX) {
                listing.enabled.push(id.to_string());
            }
        }

        listing.enabled.sort();
        listing.disabled.sort();
        Ok(listing)
    }

    /// Flip a plugin between enabled and disabled with a single rename.
    pub fn toggle(&self, id: &str, disable: bool) -> Result<PluginState> {
        let (from, to, target) = if disable {
            (
                self.enabled_path(id),
                self.disabled_path(id),
                PluginState::Disabled,
            )
        } else {
            (
                self.disabled_path(id),
                self.enabled_path(id),
                PluginState::Enabled,
            )
        };

        if !from.exists() {
            if to.exists() {
                return Err(ModkitError::AlreadyInTargetState {
                    id: id.to_string(),
                    target,
                });
            }
            return Err(ModkitError::PluginNotFound { id: id.to_string() });
        }

        fs::rename(&from, &to)?;
        Ok(target)
    }

    /// Commit plugin content under the enabled name for an id.
    ///
    /// Content lands in a temp file first and reaches the final path via an
    /// atomic rename, so a partially written plugin is never observable.
    /// Overwrites an existing enabled file (idempotent install / upgrade);
    /// a stale disabled twin is dropped so the id keeps exactly one
    /// representation.
    pub fn install(&self, id: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let final_path = self.enabled_path(id);
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp.write_all(content.as_bytes())?;
        temp.persist(&final_path).map_err(|err| err.error)?;

        let disabled = self.disabled_path(id);
        if disabled.exists() {
            fs::remove_file(&disabled)?;
        }

        Ok(final_path)
    }

    /// Install a plugin delivered as a named file (the upload path).
    ///
    /// The filename must carry the enabled suffix; the content must pass
    /// the validator before anything reaches the store directory.
    pub fn install_from_attachment(
        &self,
        filename: &str,
        content: &str,
        validator: &dyn ContentValidator,
    ) -> Result<(String, PathBuf)> {
        let Some(id) = strip_plugin_suffix(filename, ENABLED_SUFFIX) else {
            return Err(ModkitError::InvalidFilename {
                filename: filename.to_string(),
                expected: ENABLED_SUFFIX,
            });
        };

        if !validator.validate(content) {
            return Err(ModkitError::InvalidPluginContent);
        }

        let path = self.install(id, content)?;
        Ok((id.to_string(), path))
    }

    /// Delete whichever representations exist for an id.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut found = false;

        for path in [self.enabled_path(id), self.disabled_path(id)] {
            if path.exists() {
                fs::remove_file(&path)?;
                found = true;
            }
        }

        if !found {
            return Err(ModkitError::PluginNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Read a plugin for delivery.
    ///
    /// A disabled plugin is exported under its enabled name; the stored
    /// file itself is not touched.
    pub fn export(&self, id: &str) -> Result<ExportedPlugin> {
        let enabled = self.enabled_path(id);
        let disabled = self.disabled_path(id);

        let path = if enabled.exists() {
            enabled
        } else if disabled.exists() {
            disabled
        } else {
            return Err(ModkitError::PluginNotFound { id: id.to_string() });
        };

        Ok(ExportedPlugin {
            filename: format!("{}{}", id, ENABLED_SUFFIX),
            content: fs::read_to_string(&path)?,
        })
    }
}

/// Strip a plugin suffix, rejecting a bare suffix with no id in front
fn strip_plugin_suffix<'a>(filename: &'a str, suffix: &str) -> Option<&'a str> {
    filename.strip_suffix(suffix).filter(|id| !id.is_empty())
}
