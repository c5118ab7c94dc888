//! Reading input images.

use std::path::{Path, PathBuf};

use image::{imageops, RgbImage};
use walkdir::WalkDir;

use crate::errors::{HandLandmarkError, Result};

/// Loads an image, converts it to 8-bit RGB and mirrors it horizontally.
///
/// The landmark network expects a mirrored view (as from a selfie camera) to classify
/// handedness correctly.
pub fn load_mirrored(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|e| HandLandmarkError::ImageProcessing {
        path: path.display().to_string(),
        operation: "image loading".to_string(),
        source: Box::new(e),
    })?;

    let mut image = image.into_rgb8();
    imageops::flip_horizontal_in_place(&mut image);
    Ok(image)
}

pub fn is_supported_image_format(path: &Path) -> bool {
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        matches!(
            extension.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "gif" | "tiff" | "avif"
        )
    } else {
        false
    }
}

/// Expands the configured inputs into the list of files to process.
///
/// Files are kept in the given order, whether or not they exist. Directories are walked
/// recursively and contribute their image files sorted by path, so indices are stable across
/// runs.
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_supported_image_format(e.path()))
            .map(|e| e.into_path())
            .collect::<Vec<_>>();
        found.sort();
        log::debug!("{} image(s) found in {}", found.len(), input.display());
        files.append(&mut found);
    }

    files
}
