use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two size fields a [`ConfigError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
        }
    }
}

/// Invalid form input. Always reported before any file is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please choose a valid folder.")]
    MissingFolder,

    #[error("Folder does not exist or is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid {field}: {value:?} is not an integer.")]
    NotAnInteger { field: Dimension, value: String },

    #[error("Invalid {field}: {value} must be a positive integer.")]
    NotPositive { field: Dimension, value: String },

    #[error("Invalid {field}: {value} is too large.")]
    TooLarge { field: Dimension, value: String },
}

/// Failure to resize a single file. Never aborts the batch.
#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to open: {0}")]
    Open(#[source] image::ImageError),

    #[error("save failed: {0}")]
    Save(#[source] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec panicked: {0}")]
    Panicked(String),
}

/// Unexpected failure that ends the whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("could not read folder {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("background worker failed: {0}")]
    Worker(String),
}
