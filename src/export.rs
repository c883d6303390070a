//! Batch Export Pipeline
//!
//! Renders every attendee in registry order on a private canvas and feeds
//! the PNGs to an archive writer. A badge that cannot be rendered is
//! recorded and skipped; the batch always runs to the end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::archive::ArchiveWriter;
use crate::attendee::Attendee;
use crate::canvas::Canvas;
use crate::error::Result;
use crate::hashing::{compute_manifest_hash, layout_hash, sha256_hex};
use crate::layout::LayoutConfig;
use crate::render::{BadgeRenderer, RenderOutcome};
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub layout_hash: String,
    pub entries: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedBadge>,
    pub manifest_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// 1-based registry position
    pub index: usize,
    pub filename: String,
    pub template: String,
    pub used_fallback: bool,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedBadge {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

pub struct ExportOutcome {
    pub archive: Vec<u8>,
    pub manifest: ExportManifest,
}

impl ExportOutcome {
    pub fn badge_count(&self) -> usize {
        self.manifest.entries.len()
    }
}

/// Archive entry name: `badge_{n}_{firstname}_{lastname}.png`, `n` 1-based.
///
/// The position prefix keeps names unique even when two attendees share a
/// name.
pub fn entry_name(position: usize, attendee: &Attendee) -> String {
    format!(
        "badge_{}_{}_{}.png",
        position,
        sanitize(attendee.field("firstname")),
        sanitize(attendee.field("lastname"))
    )
}

fn sanitize(fragment: &str) -> String {
    fragment
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

pub struct BatchExporter<'a> {
    renderer: BadgeRenderer<'a>,
    layout: &'a LayoutConfig,
    // separate from the preview canvas
    canvas: Canvas,
}

impl<'a> BatchExporter<'a> {
    pub fn new(renderer: BadgeRenderer<'a>, layout: &'a LayoutConfig) -> Self {
        Self {
            renderer,
            layout,
            canvas: Canvas::new(),
        }
    }

    pub async fn export_all(
        &mut self,
        attendees: &[Attendee],
        mut archive: Box<dyn ArchiveWriter + Send>,
    ) -> Result<ExportOutcome> {
        let mut entries = Vec::with_capacity(attendees.len());
        let mut skipped = Vec::new();

        for (i, attendee) in attendees.iter().enumerate() {
            let position = i + 1;
            let outcome = self.renderer.render_into(Some(attendee), &mut self.canvas).await;
            let (template, used_fallback) = match outcome {
                RenderOutcome::Drawn { template, used_fallback } => (template, used_fallback),
                RenderOutcome::TemplateUnavailable => {
                    log::warn!("Skipping badge {} ({}): no template", position, attendee.display_name());
                    skipped.push(SkippedBadge {
                        index: position,
                        name: attendee.display_name(),
                        reason: "no template could be loaded".to_string(),
                    });
                    continue;
                }
            };

            let png = match self.canvas.encode_png() {
                Ok(png) => png,
                Err(e) => {
                    log::warn!("Skipping badge {} ({}): {}", position, attendee.display_name(), e);
                    skipped.push(SkippedBadge {
                        index: position,
                        name: attendee.display_name(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let filename = entry_name(position, attendee);
            archive.add(&filename, &png)?;
            log::debug!("rendered {} from {}", filename, template);
            entries.push(ManifestEntry {
                index: position,
                filename,
                template,
                used_fallback,
                sha256: sha256_hex(&png),
            });
        }

        let bytes = archive.finish()?;
        log::info!(
            "exported {} badge(s), skipped {}, archive {} bytes",
            entries.len(),
            skipped.len(),
            bytes.len()
        );

        let mut manifest = ExportManifest {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            layout_hash: layout_hash(self.layout)?,
            entries,
            skipped,
            manifest_hash: String::new(), // computed after
        };
        manifest.manifest_hash = compute_manifest_hash(&manifest)?;

        Ok(ExportOutcome {
            archive: bytes,
            manifest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name() {
        let a = Attendee::from_iter([("firstname", "Ada"), ("lastname", "Lovelace")]);
        assert_eq!(entry_name(1, &a), "badge_1_Ada_Lovelace.png");
    }

    #[test]
    fn test_entry_name_sanitizes_paths() {
        let a = Attendee::from_iter([("firstname", "../etc"), ("lastname", "a/b c")]);
        assert_eq!(entry_name(2, &a), "badge_2_.._etc_a_b_c.png");
    }

    #[test]
    fn test_entry_name_missing_fields() {
        assert_eq!(entry_name(3, &Attendee::default()), "badge_3__.png");
    }

    #[test]
    fn test_same_name_different_position() {
        let a = Attendee::from_iter([("firstname", "Sam"), ("lastname", "Lee")]);
        assert_ne!(entry_name(1, &a), entry_name(2, &a));
    }
}
