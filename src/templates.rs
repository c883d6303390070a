//! Template Images - category artwork behind every badge
//!
//! A category maps to one image path through a pattern; one fixed fallback
//! path covers both "no attendee" and "category image missing".

use async_trait::async_trait;
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;

use crate::attendee::Attendee;
use crate::config::TemplateConfig;
use crate::error::{BadgeError, Result};

#[derive(Debug, Clone)]
pub struct TemplateSet {
    pattern: String,
    fallback: String,
    default_category: String,
}

/// Which template to try first, and what to try next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChoice {
    pub category: Option<String>,
    pub path: String,
    pub fallback: String,
}

impl TemplateChoice {
    pub fn is_fallback(&self) -> bool {
        self.path == self.fallback
    }
}

impl TemplateSet {
    pub fn new(pattern: impl Into<String>, fallback: impl Into<String>, default_category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            fallback: fallback.into(),
            default_category: default_category.into(),
        }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(&config.pattern, &config.fallback, &config.default_category)
    }

    pub fn path_for(&self, category: &str) -> String {
        self.pattern.replace("{category}", category)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn resolve(&self, attendee: Option<&Attendee>) -> TemplateChoice {
        match attendee {
            None => TemplateChoice {
                category: None,
                path: self.fallback.clone(),
                fallback: self.fallback.clone(),
            },
            Some(a) => {
                let mut category = a.category(&self.default_category);
                if !is_safe_category(&category) {
                    log::warn!(
                        "Participation type {:?} is not a usable category, using '{}'",
                        category,
                        self.default_category
                    );
                    category = self.default_category.clone();
                }
                TemplateChoice {
                    path: self.path_for(&category),
                    category: Some(category),
                    fallback: self.fallback.clone(),
                }
            }
        }
    }
}

/// Categories become path segments: only `[a-z0-9_-]` is allowed.
fn is_safe_category(category: &str) -> bool {
    !category.is_empty()
        && category
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::from_config(&TemplateConfig::default())
    }
}

/// Asynchronous template source.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, path: &str) -> Result<DynamicImage>;
}

/// Reads templates from a local directory.
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, path: &str) -> Result<DynamicImage> {
        let full = self.root.join(path);
        let bytes = tokio::fs::read(&full).await.map_err(|e| BadgeError::TemplateLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        decode(path, &bytes)
    }
}

/// Fetches templates relative to a base URL.
pub struct HttpImageLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageLoader {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, path: &str) -> Result<DynamicImage> {
        let url = self.url_for(path);
        let fail = |reason: String| BadgeError::TemplateLoad {
            path: path.to_string(),
            reason,
        };
        let response = self.client.get(&url).send().await.map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        decode(path, &bytes)
    }
}

fn decode(path: &str, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| BadgeError::TemplateLoad {
        path: path.to_string(),
        reason: format!("decode failed: {}", e),
    })
}

/// Load with an optional deadline so a stuck source cannot stall a badge.
pub async fn load_with_timeout(
    loader: &dyn ImageLoader,
    path: &str,
    timeout: Option<Duration>,
) -> Result<DynamicImage> {
    match timeout {
        None => loader.load(path).await,
        Some(limit) => tokio::time::timeout(limit, loader.load(path))
            .await
            .map_err(|_| BadgeError::Timeout(limit.as_millis() as u64))?,
    }
}
