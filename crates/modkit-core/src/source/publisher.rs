//! Source Publisher
//!
//! Generates a source manifest from a directory of plugin files, so a
//! maintainer can host the output as a fetchable source.

use std::fs;
use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::Result;
use crate::source::types::{Manifest, Module};
use crate::store::ENABLED_SUFFIX;

const DEFAULT_VERSION: &str = "1.0.0";

/// Metadata extracted from one plugin file
struct ExtractedInfo {
    name: String,
    author: String,
    description: String,
    version: String,
}

/// Source Publisher - scans plugin files into a publishable manifest.
pub struct SourcePublisher {
    name: String,
    id: String,
    base_url: String,
    class_re: Regex,
    name_re: Regex,
    author_re: Regex,
    description_re: Regex,
    version_re: Regex,
}

impl SourcePublisher {
    pub fn new(name: &str, id: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            class_re: Regex::new(r"class\s+\w+\(BaseModule\)").expect("static pattern"),
            name_re: field_regex("name"),
            author_re: field_regex("author"),
            description_re: field_regex("description"),
            version_re: field_regex("version"),
        }
    }

    /// Scan a directory for enabled plugin files and build a manifest.
    ///
    /// Files without the `BaseModule` class marker or without name, author
    /// and description assignments are skipped, not reported as errors.
    /// Disabled plugins are left out: their filenames do not carry the
    /// enabled suffix.
    pub fn scan(&self, dir: &Path) -> Result<Manifest> {
        let mut modules = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(module_id) = file_name.strip_suffix(ENABLED_SUFFIX) else {
                continue;
            };
            if module_id.is_empty() {
                continue;
            }

            let content = fs::read_to_string(entry.path())?;
            let Some(info) = self.extract_info(&content) else {
                continue;
            };

            let relative = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            modules.push(Module {
                id: module_id.to_string(),
                name: info.name,
                author: info.author,
                description: info.description,
                version: info.version,
                url: format!("{}/{}", self.base_url, relative),
            });
        }

        Ok(Manifest {
            name: self.name.clone(),
            id: self.id.clone(),
            date: Some(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()),
            data: modules,
        })
    }

    /// Scan a directory and write the manifest JSON to `output`.
    pub fn write(&self, dir: &Path, output: &Path) -> Result<Manifest> {
        let manifest = self.scan(dir)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, serde_json::to_string_pretty(&manifest)?)?;

        Ok(manifest)
    }

    fn extract_info(&self, content: &str) -> Option<ExtractedInfo> {
        if !self.class_re.is_match(content) {
            return None;
        }

        Some(ExtractedInfo {
            name: capture(&self.name_re, content)?,
            author: capture(&self.author_re, content)?,
            description: capture(&self.description_re, content)?,
            version: capture(&self.version_re, content)
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        })
    }
}

fn field_regex(field: &str) -> Regex {
    Regex::new(&format!(r#"self\.{}\s*=\s*["'](.+?)["']"#, field)).expect("static pattern")
}

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content).map(|caps| caps[1].to_string())
}
