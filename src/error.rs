//! Error Types
//!
//! Every failure here is recoverable at some level: the session and the
//! exporter decide how far each one degrades.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BadgeError>;

#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Template not loadable: {path}: {reason}")]
    TemplateLoad { path: String, reason: String },

    #[error("Image error: {0}")]
    Image(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Attendee index {index} out of range ({count} loaded)")]
    NoSuchAttendee { index: usize, count: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the attendee parsing collaborator.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No attendees found")]
    NoAttendees,

    #[error("Unreadable attendee file: {0}")]
    Unreadable(String),

    #[error("Malformed attendee record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Unsupported attendee file format: {0}")]
    UnsupportedFormat(String),
}

impl From<image::ImageError> for BadgeError {
    fn from(err: image::ImageError) -> Self {
        BadgeError::Image(err.to_string())
    }
}

impl From<reqwest::Error> for BadgeError {
    fn from(err: reqwest::Error) -> Self {
        BadgeError::Network(err.to_string())
    }
}

impl From<zip::result::ZipError> for BadgeError {
    fn from(err: zip::result::ZipError) -> Self {
        BadgeError::Archive(err.to_string())
    }
}
