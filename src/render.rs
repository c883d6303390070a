//! Badge Renderer
//!
//! template + layout + attendee -> composited canvas. The text plan is
//! computed separately from rasterization so positions can be checked
//! without any font on disk.

use serde::Serialize;
use std::time::Duration;

use crate::attendee::Attendee;
use crate::canvas::{Canvas, TEXT_COLOR};
use crate::fonts::{FontBook, FontSpec};
use crate::layout::{Align, LayoutConfig};
use crate::error::{BadgeError, Result};
use crate::templates::{load_with_timeout, ImageLoader, TemplateChoice, TemplateSet};

/// One text draw, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDraw {
    pub field: String,
    pub text: String,
    pub font: String,
    #[serde(skip)]
    pub font_spec: FontSpec,
    pub align: Align,
    pub x: f32,
    pub y: f32,
}

/// Text draws for `attendee` in layout order (later draws sit on top).
pub fn plan_text(attendee: &Attendee, layout: &LayoutConfig) -> Vec<TextDraw> {
    layout
        .iter()
        .map(|(field, entry)| {
            let font_spec = FontSpec::new(entry.fontsize, &entry.fontfamily);
            TextDraw {
                field: field.to_string(),
                text: attendee.field(field).to_string(),
                font: font_spec.to_string(),
                font_spec,
                align: entry.align.clone(),
                x: entry.anchor_x(),
                y: entry.anchor_y(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn { template: String, used_fallback: bool },
    /// Neither the category template nor the fallback loaded; canvas untouched
    TemplateUnavailable,
}

impl RenderOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, RenderOutcome::Drawn { .. })
    }
}

pub struct BadgeRenderer<'a> {
    layout: &'a LayoutConfig,
    templates: &'a TemplateSet,
    loader: &'a dyn ImageLoader,
    fonts: &'a FontBook,
    timeout: Option<Duration>,
}

impl<'a> BadgeRenderer<'a> {
    pub fn new(
        layout: &'a LayoutConfig,
        templates: &'a TemplateSet,
        loader: &'a dyn ImageLoader,
        fonts: &'a FontBook,
    ) -> Self {
        Self {
            layout,
            templates,
            loader,
            fonts,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Render onto `canvas`, replacing its previous content.
    ///
    /// If no template loads, the canvas keeps whatever it held before.
    pub async fn render_into(&self, attendee: Option<&Attendee>, canvas: &mut Canvas) -> RenderOutcome {
        let choice = self.templates.resolve(attendee);
        let (image, template, used_fallback) = match self.load_template(&choice).await {
            Some(loaded) => loaded,
            None => return RenderOutcome::TemplateUnavailable,
        };

        canvas.clear();
        canvas.draw_image(&image);

        if let Some(attendee) = attendee {
            for draw in plan_text(attendee, self.layout) {
                log::trace!("drawing {} with font {}", draw.field, draw.font);
                let Some(font) = self.fonts.resolve(&draw.font_spec) else {
                    continue;
                };
                canvas.fill_text(&draw.text, font, draw.font_spec.size_px, &draw.align, draw.x, draw.y, TEXT_COLOR);
            }
        }

        RenderOutcome::Drawn { template, used_fallback }
    }

    /// Render onto a fresh canvas.
    pub async fn render(&self, attendee: Option<&Attendee>) -> Result<Canvas> {
        let mut canvas = Canvas::new();
        match self.render_into(attendee, &mut canvas).await {
            RenderOutcome::Drawn { .. } => Ok(canvas),
            RenderOutcome::TemplateUnavailable => Err(BadgeError::TemplateLoad {
                path: self.templates.fallback().to_string(),
                reason: "no template could be loaded".to_string(),
            }),
        }
    }

    async fn load_template(&self, choice: &TemplateChoice) -> Option<(image::DynamicImage, String, bool)> {
        match load_with_timeout(self.loader, &choice.path, self.timeout).await {
            Ok(img) => return Some((img, choice.path.clone(), false)),
            Err(e) if choice.is_fallback() => {
                log::warn!("Fallback template unavailable: {}", e);
                return None;
            }
            Err(e) => log::warn!("Template {} unavailable, retrying with fallback: {}", choice.path, e),
        }

        match load_with_timeout(self.loader, &choice.fallback, self.timeout).await {
            Ok(img) => Some((img, choice.fallback.clone(), true)),
            Err(e) => {
                log::warn!("Fallback template unavailable: {}", e);
                None
            }
        }
    }
}
