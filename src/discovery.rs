//! Finding the images a run will process.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::RunError;

/// Extensions picked up by discovery, matched either fully lower-case or
/// fully upper-case (`jpg` and `JPG`, but not `Jpg`).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "webp"];

/// Lists the images directly inside `folder`, sorted by path.
///
/// Subdirectories are not descended into and hidden files are skipped.
/// Each directory entry appears at most once, even on case-insensitive
/// filesystems.
pub fn discover_image_files(folder: &Path) -> Result<Vec<PathBuf>, RunError> {
    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(RunError::Discovery {
                    path: folder.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && !is_hidden(path) && is_image_file(path) {
            images.push(path.to_path_buf());
        }
    }

    images.sort();
    debug!(folder = %folder.display(), count = images.len(), "discovered images");
    Ok(images)
}

pub fn is_image_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext == *known || ext == known.to_ascii_uppercase()),
        None => false,
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
