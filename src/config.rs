//! Application Configuration
//!
//! One JSON document, every field optional. Missing fields take the
//! defaults the badge site ships with.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Path or http(s) URL of the layout document
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    /// Per-image load timeout; 0 waits forever
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    #[serde(default)]
    pub counter: CounterConfig,
}

fn default_layout() -> String { "files/badgeConfig.json".to_string() }
fn default_image_timeout_ms() -> u64 { 10_000 }
fn default_archive_name() -> String { "devfest_badges.zip".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            templates: TemplateConfig::default(),
            fonts: FontConfig::default(),
            image_timeout_ms: default_image_timeout_ms(),
            archive_name: default_archive_name(),
            counter: CounterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read a config file. A missing file is not an error: defaults apply.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn image_timeout(&self) -> Option<Duration> {
        match self.image_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Directory or base URL the template paths are relative to
    #[serde(default = "default_root")]
    pub root: String,
    /// `{category}` is replaced by the lowercased participation type
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_root() -> String { ".".to_string() }
fn default_pattern() -> String { "images/badge/{category}.png".to_string() }
fn default_fallback() -> String { "images/badge/badge.png".to_string() }
fn default_category() -> String { "general".to_string() }

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            pattern: default_pattern(),
            fallback: default_fallback(),
            default_category: default_category(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default)]
    pub families: Vec<FontRegistration>,
    /// Font used for the generic `sans-serif` family (bundled DejaVu Sans when unset)
    #[serde(default)]
    pub fallback: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontRegistration {
    pub family: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_counter_url")]
    pub base_url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_true() -> bool { true }
fn default_counter_url() -> String { "https://abacus.jasoncameron.dev".to_string() }
fn default_namespace() -> String { "avatarbadge".to_string() }
fn default_key() -> String { "batch".to_string() }

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_counter_url(),
            namespace: default_namespace(),
            key: default_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_takes_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.layout, "files/badgeConfig.json");
        assert_eq!(config.templates.pattern, "images/badge/{category}.png");
        assert_eq!(config.templates.fallback, "images/badge/badge.png");
        assert_eq!(config.templates.default_category, "general");
        assert_eq!(config.archive_name, "devfest_badges.zip");
        assert!(config.counter.enabled);
        assert_eq!(config.image_timeout(), Some(Duration::from_millis(10_000)));
    }

    #[test]
    fn test_partial_override() {
        let config: AppConfig = serde_json::from_str(
            r#"{"imageTimeoutMs": 0, "counter": {"enabled": false}, "templates": {"root": "assets"}}"#,
        )
        .unwrap();
        assert_eq!(config.image_timeout(), None);
        assert!(!config.counter.enabled);
        assert_eq!(config.counter.namespace, "avatarbadge");
        assert_eq!(config.templates.root, "assets");
        assert_eq!(config.templates.fallback, "images/badge/badge.png");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.archive_name, "devfest_badges.zip");
    }
}
