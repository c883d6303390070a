//! BadgeForge Core - Badge Production Compiler
//!
//! # The Ground Rules
//! 1. The Template Is the Background
//! 2. Layout Order Is Draw Order
//! 3. Missing Fields Render Empty
//! 4. One Badge Never Sinks the Batch
//! 5. Deterministic Output
//! 6. Preview and Export Never Share a Canvas

pub mod error;
pub mod config;
pub mod layout;
pub mod attendee;
pub mod templates;
pub mod fonts;
pub mod canvas;
pub mod render;
pub mod archive;
pub mod hashing;
pub mod export;
pub mod counter;
pub mod session;

pub use error::{BadgeError, ParseError, Result};
pub use config::AppConfig;
pub use layout::{Align, LayoutConfig, LayoutEntry};
pub use attendee::{Attendee, AttendeeParser, AttendeeRegistry, JsonAttendeeParser};
pub use templates::{FsImageLoader, HttpImageLoader, ImageLoader, TemplateChoice, TemplateSet};
pub use fonts::{FontBook, FontSpec};
pub use canvas::{Canvas, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use render::{plan_text, BadgeRenderer, RenderOutcome, TextDraw};
pub use archive::{ArchiveWriter, ZipArchiveWriter};
pub use hashing::{canonical_json, compute_manifest_hash, sha256_hex};
pub use export::{entry_name, BatchExporter, ExportManifest, ExportOutcome};
pub use counter::CounterClient;
pub use session::{BadgeSession, SessionExport};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
