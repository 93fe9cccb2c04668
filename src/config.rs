use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::error::{ConfigError, Dimension};

pub const DEFAULT_WIDTH: &str = "1024";
pub const DEFAULT_HEIGHT: &str = "1024";

/// Suffix appended to the file stem of every output file.
pub const OUTPUT_SUFFIX: &str = "_red";

/// Resampling filter used for both fit and stretch resizes.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Validated parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    pub folder: PathBuf,
    pub target_width: u32,
    pub target_height: u32,
    pub preserve_aspect_ratio: bool,
}

impl RunConfiguration {
    /// Builds a configuration from raw form values.
    ///
    /// The folder is checked first, then width, then height, so the error
    /// names the first invalid input in form order.
    pub fn from_input(
        folder: &str,
        width: &str,
        height: &str,
        preserve_aspect_ratio: bool,
    ) -> Result<Self, ConfigError> {
        let folder = validate_folder(folder)?;
        let target_width = parse_dimension(Dimension::Width, width)?;
        let target_height = parse_dimension(Dimension::Height, height)?;

        Ok(Self {
            folder,
            target_width,
            target_height,
            preserve_aspect_ratio,
        })
    }
}

/// Encoder settings applied when writing output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Spend extra time on smaller files where the format allows it.
    pub optimize: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            quality: 95,
            optimize: true,
        }
    }
}

fn validate_folder(folder: &str) -> Result<PathBuf, ConfigError> {
    if folder.trim().is_empty() {
        return Err(ConfigError::MissingFolder);
    }
    let path = Path::new(folder);
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

pub fn parse_dimension(field: Dimension, raw: &str) -> Result<u32, ConfigError> {
    let trimmed = raw.trim();
    let value: i64 = match trimmed.parse() {
        Ok(value) => value,
        Err(e) => {
            use std::num::IntErrorKind;
            return Err(match e.kind() {
                IntErrorKind::PosOverflow => ConfigError::TooLarge {
                    field,
                    value: trimmed.to_string(),
                },
                IntErrorKind::NegOverflow => ConfigError::NotPositive {
                    field,
                    value: trimmed.to_string(),
                },
                _ => ConfigError::NotAnInteger {
                    field,
                    value: raw.to_string(),
                },
            });
        }
    };

    if value <= 0 {
        return Err(ConfigError::NotPositive {
            field,
            value: trimmed.to_string(),
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::TooLarge {
        field,
        value: trimmed.to_string(),
    })
}
