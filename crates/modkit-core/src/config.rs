use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ModkitError, Result};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# modkit configuration file
# Location: ~/.modkit/config.toml

[fetch]
# HTTP timeout applied to every manifest/plugin download, in seconds
# Default: 30
timeout_secs = 30

[store]
# Override the plugin directory
# Default: <base dir>/modules
# Example: dir = "/opt/bot/third_party_modules"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Network-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Plugin-store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Plugin directory override
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Default base directory (~/.modkit)
    pub fn default_base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ModkitError::HomeNotFound)?;
        Ok(home.join(".modkit"))
    }

    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ModkitError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Plugin directory, honoring the config override
    pub fn plugins_dir(&self, base_dir: &Path) -> PathBuf {
        self.store
            .dir
            .clone()
            .unwrap_or_else(|| base_dir.join("modules"))
    }

    /// Path of the persisted source registry
    pub fn sources_file(&self, base_dir: &Path) -> PathBuf {
        self.plugins_dir(base_dir).join("sources.json")
    }

    /// HTTP timeout as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "fetch.timeout_secs" => Some(self.fetch.timeout_secs.to_string()),
            "store.dir" => Some(
                self.store
                    .dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "fetch.timeout_secs" => {
                self.fetch.timeout_secs =
                    value.parse().map_err(|_| ModkitError::ConfigValue {
                        key: key.to_string(),
                        message: format!("'{}' is not a number of seconds", value),
                    })?;
                Ok(())
            }
            "store.dir" => {
                self.store.dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
                Ok(())
            }
            _ => Err(ModkitError::ConfigKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "fetch.timeout_secs".to_string(),
                self.fetch.timeout_secs.to_string(),
            ),
            (
                "store.dir".to_string(),
                self.store
                    .dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.store.dir.is_none());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();

        let mut config = Config::default();
        config.fetch.timeout_secs = 5;
        config.store.dir = Some(PathBuf::from("/tmp/plugins"));
        config.save(temp.path()).unwrap();

        let reloaded = Config::load(temp.path()).unwrap();
        assert_eq!(reloaded.fetch.timeout_secs, 5);
        assert_eq!(reloaded.store.dir, Some(PathBuf::from("/tmp/plugins")));
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        config.set("fetch.timeout_secs", "10").unwrap();
        assert_eq!(config.get("fetch.timeout_secs").unwrap(), "10");

        config.set("store.dir", "/srv/modules").unwrap();
        assert_eq!(config.get("store.dir").unwrap(), "/srv/modules");

        config.set("store.dir", "").unwrap();
        assert!(config.store.dir.is_none());
    }

    #[test]
    fn test_set_rejects_bad_value_and_unknown_key() {
        let mut config = Config::default();

        assert!(matches!(
            config.set("fetch.timeout_secs", "soon"),
            Err(ModkitError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("nope.key", "x"),
            Err(ModkitError::ConfigKeyNotFound { .. })
        ));
    }

    #[test]
    fn test_paths() {
        let config = Config::default();
        let base = Path::new("/home/u/.modkit");

        assert_eq!(config.plugins_dir(base), base.join("modules"));
        assert_eq!(
            config.sources_file(base),
            base.join("modules").join("sources.json")
        );
    }
}
