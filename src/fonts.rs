//! Font Book
//!
//! Families are looked up case-insensitively in the order a font string lists
//! them; `sans-serif` resolves to the configured fallback face, or to the
//! bundled DejaVu Sans when none is configured.

use ab_glyph::FontArc;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::config::FontConfig;
use crate::error::{BadgeError, Result};

/// Families appended after every layout font, in order.
pub const FALLBACK_FAMILIES: [&str; 2] = ["Arial", "sans-serif"];

const GENERIC_SANS: &str = "sans-serif";

static BUNDLED_SANS: OnceLock<Option<FontArc>> = OnceLock::new();

/// DejaVu Sans, compiled into the binary.
pub fn bundled_sans() -> Option<FontArc> {
    BUNDLED_SANS
        .get_or_init(|| match FontArc::try_from_slice(include_bytes!("fonts/DejaVuSans.ttf")) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("Bundled sans-serif face is unreadable: {}", e);
                None
            }
        })
        .clone()
}

/// A resolved font request: pixel size plus a family list.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
    pub families: Vec<String>,
}

impl FontSpec {
    pub fn new(size_px: f32, family: &str) -> Self {
        let mut families = vec![family.to_string()];
        families.extend(FALLBACK_FAMILIES.iter().map(|f| f.to_string()));
        Self { size_px, families }
    }
}

impl fmt::Display for FontSpec {
    /// Canvas font shorthand, e.g. `24px "Google Sans", Arial, sans-serif`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px ", self.size_px)?;
        for (i, family) in self.families.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if i == 0 {
                write!(f, "\"{}\"", family)?;
            } else {
                f.write_str(family)?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FontBook {
    faces: HashMap<String, FontArc>,
    generic: Option<FontArc>,
    warned_missing: AtomicBool,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// An otherwise empty book whose `sans-serif` is the bundled face.
    pub fn with_bundled_sans() -> Self {
        Self {
            generic: bundled_sans(),
            ..Self::default()
        }
    }

    pub fn register(&mut self, family: &str, font: FontArc) {
        self.faces.insert(family.to_lowercase(), font);
    }

    pub fn set_generic(&mut self, font: FontArc) {
        self.generic = Some(font);
    }

    pub fn register_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| BadgeError::Font(format!("{}: {}", family, e)))?;
        self.register(family, font);
        Ok(())
    }

    /// Load every configured face. Broken files are logged and skipped.
    pub async fn load(config: &FontConfig) -> Self {
        let mut book = Self::with_bundled_sans();
        for reg in &config.families {
            match read_font(&reg.path).await {
                Ok(font) => {
                    log::debug!("registered font family '{}' from {}", reg.family, reg.path.display());
                    book.register(&reg.family, font);
                }
                Err(e) => log::warn!("Skipping font family '{}': {}", reg.family, e),
            }
        }
        if let Some(path) = &config.fallback {
            match read_font(path).await {
                Ok(font) => book.set_generic(font),
                Err(e) => log::warn!("Skipping fallback font, keeping bundled sans-serif: {}", e),
            }
        }
        book
    }

    /// First registered face among the requested families.
    pub fn resolve(&self, spec: &FontSpec) -> Option<&FontArc> {
        let found = spec.families.iter().find_map(|family| {
            let key = family.to_lowercase();
            if key == GENERIC_SANS {
                self.generic.as_ref()
            } else {
                self.faces.get(&key)
            }
        });
        if found.is_none() && !self.warned_missing.swap(true, Ordering::Relaxed) {
            log::warn!("No font available for {}; text will not be drawn", spec);
        }
        found
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.generic.is_none()
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<_> = self.faces.keys().collect();
        families.sort();
        f.debug_struct("FontBook")
            .field("families", &families)
            .field("generic", &self.generic.is_some())
            .finish()
    }
}

async fn read_font(path: &Path) -> Result<FontArc> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BadgeError::Font(format!("{}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes).map_err(|e| BadgeError::Font(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontRegistration;

    #[test]
    fn test_font_string() {
        let spec = FontSpec::new(24.0, "Google Sans");
        assert_eq!(spec.to_string(), r#"24px "Google Sans", Arial, sans-serif"#);
        assert_eq!(FontSpec::new(12.5, "Roboto").to_string(), r#"12.5px "Roboto", Arial, sans-serif"#);
    }

    #[test]
    fn test_empty_book_resolves_nothing() {
        let book = FontBook::new();
        assert!(book.is_empty());
        assert!(book.resolve(&FontSpec::new(10.0, "Arial")).is_none());
    }

    #[test]
    fn test_bundled_sans_backs_generic_family() {
        let book = FontBook::with_bundled_sans();
        assert!(!book.is_empty());
        assert!(book.faces.is_empty());
        assert!(book.resolve(&FontSpec::new(24.0, "Google Sans")).is_some());
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::new();
        assert!(book.register_bytes("Broken", vec![0u8; 16]).is_err());
        assert!(book.is_empty());
    }

    #[tokio::test]
    async fn test_load_skips_unreadable_faces() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.ttf");
        std::fs::write(&bad, b"nope").unwrap();
        let config = FontConfig {
            families: vec![
                FontRegistration { family: "Bad".into(), path: bad },
                FontRegistration { family: "Gone".into(), path: dir.path().join("gone.ttf") },
            ],
            fallback: Some(dir.path().join("missing.ttf")),
        };
        let book = FontBook::load(&config).await;
        assert!(book.faces.is_empty());
        // an unusable fallback keeps the bundled face
        assert!(book.resolve(&FontSpec::new(10.0, "Bad")).is_some());
    }

    #[tokio::test]
    async fn test_default_config_resolves_every_family() {
        let book = FontBook::load(&FontConfig::default()).await;
        assert!(book.resolve(&FontSpec::new(96.0, "Open Sans")).is_some());
    }
}
