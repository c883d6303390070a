//! Badge Session
//!
//! Owns everything one badge run needs: configuration, layout, attendees,
//! template source, fonts, counter, and the preview canvas. Callers pass the
//! session around instead of reaching for shared globals.

use std::path::Path;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::archive::ZipArchiveWriter;
use crate::attendee::{parser_for_path, AttendeeParser, AttendeeRegistry};
use crate::canvas::Canvas;
use crate::config::AppConfig;
use crate::counter::CounterClient;
use crate::error::{BadgeError, ParseError, Result};
use crate::export::{BatchExporter, ExportOutcome};
use crate::fonts::FontBook;
use crate::layout::{is_url, LayoutConfig};
use crate::render::{BadgeRenderer, RenderOutcome};
use crate::templates::{FsImageLoader, HttpImageLoader, ImageLoader, TemplateSet};

pub struct BadgeSession {
    config: AppConfig,
    layout: LayoutConfig,
    registry: AttendeeRegistry,
    templates: TemplateSet,
    loader: Box<dyn ImageLoader>,
    fonts: OnceCell<FontBook>,
    counter: CounterClient,
    preview: Canvas,
}

/// Export result plus the pending counter bump.
pub struct SessionExport {
    pub outcome: ExportOutcome,
    pub counter: JoinHandle<Option<i64>>,
}

impl BadgeSession {
    /// Build a session and load the layout. A layout that fails to load
    /// leaves the session usable with an empty layout.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("badgeforge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let layout = LayoutConfig::load_or_empty(&client, &config.layout).await;
        let loader: Box<dyn ImageLoader> = if is_url(&config.templates.root) {
            Box::new(HttpImageLoader::new(client.clone(), &config.templates.root))
        } else {
            Box::new(FsImageLoader::new(&config.templates.root))
        };

        Ok(Self::with_parts(config, layout, loader, client))
    }

    /// Assemble a session from already-loaded parts.
    pub fn with_parts(
        config: AppConfig,
        layout: LayoutConfig,
        loader: Box<dyn ImageLoader>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            templates: TemplateSet::from_config(&config.templates),
            counter: CounterClient::new(client, config.counter.clone()),
            config,
            layout,
            registry: AttendeeRegistry::new(),
            loader,
            fonts: OnceCell::new(),
            preview: Canvas::new(),
        }
    }

    async fn fonts(&self) -> &FontBook {
        self.fonts.get_or_init(|| FontBook::load(&self.config.fonts)).await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn registry(&self) -> &AttendeeRegistry {
        &self.registry
    }

    pub fn preview_canvas(&self) -> &Canvas {
        &self.preview
    }

    pub fn count_label(&self) -> String {
        self.registry.count_label()
    }

    /// Parse an attendee file and replace the current list.
    pub async fn load_attendees(&mut self, path: &Path) -> Result<usize> {
        let parser = parser_for_path(path)?;
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| ParseError::Unreadable(format!("{}: {}", path.display(), e)))?;
        self.load_attendees_with(parser.as_ref(), &raw)
    }

    pub fn load_attendees_with(&mut self, parser: &dyn AttendeeParser, raw: &[u8]) -> Result<usize> {
        let count = self.registry.load(parser, raw)?;
        log::info!("{} via {} parser", self.registry.count_label(), parser.name());
        Ok(count)
    }

    /// Render attendee `index` onto the preview canvas.
    pub async fn preview(&mut self, index: usize) -> Result<RenderOutcome> {
        if self.registry.get(index).is_none() {
            return Err(BadgeError::NoSuchAttendee {
                index,
                count: self.registry.len(),
            });
        }
        let fonts = self.fonts.get_or_init(|| FontBook::load(&self.config.fonts)).await;
        let renderer = BadgeRenderer::new(&self.layout, &self.templates, self.loader.as_ref(), fonts)
            .with_timeout(self.config.image_timeout());
        Ok(renderer.render_into(self.registry.get(index), &mut self.preview).await)
    }

    /// Show the bare fallback template on the preview canvas.
    pub async fn preview_blank(&mut self) -> RenderOutcome {
        let fonts = self.fonts.get_or_init(|| FontBook::load(&self.config.fonts)).await;
        let renderer = BadgeRenderer::new(&self.layout, &self.templates, self.loader.as_ref(), fonts)
            .with_timeout(self.config.image_timeout());
        renderer.render_into(None, &mut self.preview).await
    }

    /// Render every loaded attendee into a ZIP archive.
    ///
    /// The preview canvas is not touched. On success a counter bump is
    /// started in the background; its result never affects the export.
    pub async fn export_all(&self) -> Result<SessionExport> {
        let fonts = self.fonts().await;
        let renderer = BadgeRenderer::new(&self.layout, &self.templates, self.loader.as_ref(), fonts)
            .with_timeout(self.config.image_timeout());
        let mut exporter = BatchExporter::new(renderer, &self.layout);
        let outcome = exporter
            .export_all(self.registry.attendees(), Box::new(ZipArchiveWriter::new()))
            .await?;

        let counter = self.counter.clone();
        let handle = tokio::spawn(async move { counter.increment_and_fetch().await });

        Ok(SessionExport { outcome, counter: handle })
    }

    pub async fn fetch_count(&self) -> Option<i64> {
        self.counter.fetch_count().await
    }
}
