//! Defines the custom error types used throughout `slideview`.
//!
//! Playback itself never fails: property lookups fall back to defaults and
//! player access is guarded. The errors below cover the edges of the crate,
//! i.e. configuration loading, slideshow documents on disk, and media
//! (image probing, media backend player creation). Each error type implements
//! `Debug`, `Display`, and `std::error::Error`, and provides `From`
//! implementations for the underlying error types.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors related to application configuration loading and parsing.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while trying to read the configuration file.
    Io(std::io::Error),
    /// An error occurred while parsing the configuration file content.
    Parse(String),
    /// A required configuration key was missing from the file.
    MissingKey(String),
    /// A key was present but its value could not be interpreted.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key: '{}'", key),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for configuration key '{}'", value, key)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- MediaError ---
/// Errors related to media: probing image files and creating players.
#[must_use = "a media error should be handled or propagated"]
#[derive(Debug)]
pub enum MediaError {
    /// An I/O error occurred while accessing a media file.
    Io(std::io::Error),
    /// An error occurred while reading an image via the `image` crate.
    Image(image::ImageError),
    /// The media backend refused to create or drive a player.
    Backend(String),
    /// The format of the media is not supported.
    UnsupportedFormat(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Io(e) => write!(f, "Media I/O error: {}", e),
            MediaError::Image(e) => write!(f, "Image processing error: {}", e),
            MediaError::Backend(s) => write!(f, "Media backend error: {}", s),
            MediaError::UnsupportedFormat(s) => write!(f, "Unsupported media format: {}", s),
        }
    }
}

impl StdError for MediaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MediaError::Io(e) => Some(e),
            MediaError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self { MediaError::Io(err) }
}
impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self { MediaError::Image(err) }
}

// --- DocumentError ---
/// Errors related to reading and writing slideshow documents.
#[must_use = "a document error should be handled or propagated"]
#[derive(Debug)]
pub enum DocumentError {
    /// An I/O error occurred while reading or writing the document file.
    Io(std::io::Error),
    /// An error occurred during JSON serialization or deserialization.
    Json(serde_json::Error),
    /// The document references an element type no registry entry provides.
    UnknownElementType(u32),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Io(e) => write!(f, "Slideshow document I/O error: {}", e),
            DocumentError::Json(e) => write!(f, "Slideshow document JSON error: {}", e),
            DocumentError::UnknownElementType(id) => write!(f, "Unknown slide element type id: {}", id),
        }
    }
}

impl StdError for DocumentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DocumentError::Io(e) => Some(e),
            DocumentError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self { DocumentError::Io(err) }
}
impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self { DocumentError::Json(err) }
}

// --- AppError (Top-level error enum) ---
/// A top-level error type that can encompass any error within the application.
#[must_use = "an application error should be handled or propagated"]
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Media(MediaError),
    Document(DocumentError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Application Configuration Error: {}", e),
            AppError::Media(e) => write!(f, "Application Media Error: {}", e),
            AppError::Document(e) => write!(f, "Application Document Error: {}", e),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Media(e) => Some(e),
            AppError::Document(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self { AppError::Config(err) }
}
impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self { AppError::Media(err) }
}
impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self { AppError::Document(err) }
}
