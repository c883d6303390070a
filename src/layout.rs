//! Layout Configuration Store
//!
//! The layout document maps field names to a box plus typography. Document
//! order is kept: later entries draw on top of earlier ones.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;

use crate::error::{BadgeError, Result};

/// Text alignment as written in the layout document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Start,
    End,
    /// Unrecognized value, kept verbatim
    Other(String),
}

impl Align {
    pub fn as_str(&self) -> &str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Start => "start",
            Align::End => "end",
            Align::Other(s) => s,
        }
    }
}

impl From<&str> for Align {
    fn from(value: &str) -> Self {
        match value {
            "left" => Align::Left,
            "center" => Align::Center,
            "right" => Align::Right,
            "start" => Align::Start,
            "end" => Align::End,
            other => Align::Other(other.to_string()),
        }
    }
}

impl Serialize for Align {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Align {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Align::from(s.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub fontsize: f32,
    pub fontfamily: String,
    #[serde(default)]
    pub align: Align,
}

impl LayoutEntry {
    /// Horizontal draw anchor for this box.
    ///
    /// `right`/`end` anchor at the right edge of the box so right-aligned
    /// text stays inside it.
    pub fn anchor_x(&self) -> f32 {
        match self.align {
            Align::Center => self.x + self.w / 2.0,
            Align::Right | Align::End => self.x + self.w,
            _ => self.x,
        }
    }

    /// Vertical draw anchor: text is always centered on the box mid-line.
    pub fn anchor_y(&self) -> f32 {
        self.y + self.h / 2.0
    }
}

/// Ordered field layout. Iteration order is draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutConfig {
    entries: Vec<(String, LayoutEntry)>,
}

impl LayoutConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(String, LayoutEntry)>) -> Self {
        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BadgeError::Layout(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BadgeError::Layout(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Fetch the layout document over HTTP.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| BadgeError::Layout(format!("Failed to fetch {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(BadgeError::Layout(format!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| BadgeError::Layout(format!("Failed to read {}: {}", url, e)))?;
        Self::from_json_str(&body)
    }

    /// Load from a path or an http(s) URL.
    pub async fn load(client: &reqwest::Client, source: &str) -> Result<Self> {
        if is_url(source) {
            Self::fetch(client, source).await
        } else {
            Self::from_path(Path::new(source))
        }
    }

    /// Load, or fall back to an empty layout after a single warning.
    ///
    /// An empty layout still renders the template; it just draws no text.
    pub async fn load_or_empty(client: &reqwest::Client, source: &str) -> Self {
        match Self::load(client, source).await {
            Ok(layout) => {
                log::debug!("loaded {} layout entries from {}", layout.len(), source);
                layout
            }
            Err(e) => {
                log::warn!("Could not load layout from {}: {}. Using defaults.", source, e);
                Self::empty()
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|(k, _)| k == field).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayoutEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn fields(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

impl<'de> Deserialize<'de> for LayoutConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = LayoutConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of field name to layout entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, LayoutEntry)> = Vec::new();
                while let Some((key, entry)) = map.next_entry::<String, LayoutEntry>()? {
                    // JSON objects keep the last duplicate; so do we, at its first position
                    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                        slot.1 = entry;
                    } else {
                        entries.push((key, entry));
                    }
                }
                Ok(LayoutConfig { entries })
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl Serialize for LayoutConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}
