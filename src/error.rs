//! Error types for lineup rendering

use thiserror::Error;

/// Result type alias for lineup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a normalization or render call.
///
/// Data inconsistencies that still allow a render are reported as
/// [`crate::validate::Warning`] values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// A screen references a tile type that is absent from the catalog
    #[error("Unknown tile type '{0}'")]
    UnknownTileType(String),

    /// Circle-X rendering needs a declared resolution
    #[error("Circle X Grid requires expected pixel width/height (screen '{0}')")]
    MissingExpectedSize(String),

    /// The computed canvas has no pixels
    #[error("Canvas would be empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    /// A tabular row could not be normalized
    #[error("Row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    /// The tabular input produced no screens
    #[error("No LED screens found in the sheet data")]
    NoScreens,

    /// Encoding or decoding an image failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed job file
    #[error("Invalid job file: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn invalid_row(row: usize, message: impl Into<String>) -> Self {
        Error::InvalidRow {
            row,
            message: message.into(),
        }
    }
}
