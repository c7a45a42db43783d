//! Error types
//!
//! Camera acquisition failures are [`MediaError`]s; everything the library
//! surfaces to callers is a [`ScanError`].

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a media device when a stream is requested
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The user or platform refused camera access
    #[error("camera permission denied")]
    PermissionDenied,
    /// No device satisfies the constraints
    #[error("no camera found")]
    NotFound,
    /// The device exists but cannot be opened (busy, hardware error)
    #[error("camera not readable: {0}")]
    NotReadable(String),
    /// Any other acquisition failure
    #[error("camera error: {0}")]
    Other(String),
}

/// Errors surfaced by the scanner library
#[derive(Debug, Error)]
pub enum ScanError {
    /// Colour string could not be parsed
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    /// A file or directory could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// Config contents are not valid TOML for the settings schema
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    /// Settings could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    /// Frame image could not be loaded or saved
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Camera acquisition failure
    #[error(transparent)]
    Media(#[from] MediaError),
    /// `try_start` called while a session is active or being requested
    #[error("scanner already started")]
    AlreadyStarted,
}

/// Library result type
pub type Result<T, E = ScanError> = std::result::Result<T, E>;
