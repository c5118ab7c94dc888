//! Writing annotated images.

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops, ImageFormat, RgbImage};

use crate::errors::{HandLandmarkError, Result};

/// Path of the annotated image for the input at `index`: `<dir>/<prefix><index>.<format>`.
pub fn output_path(dir: &Path, prefix: &str, index: usize, format: &str) -> PathBuf {
    dir.join(format!("{}{}.{}", prefix, index, format))
}

/// Mirrors `image` back to the orientation of the source file and writes it to `path`.
///
/// The output directory is created if needed and an existing file is overwritten.
pub fn save_annotated(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HandLandmarkError::FileSystem {
            path: parent.to_path_buf(),
            operation: "output directory creation".to_string(),
            source: e,
        })?;
    }

    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    imageops::flip_horizontal(image)
        .save_with_format(path, format)
        .map_err(|e| HandLandmarkError::ImageProcessing {
            path: path.display().to_string(),
            operation: "image saving".to_string(),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), "annotated_image_", 3, "png"),
            Path::new("out").join("annotated_image_3.png")
        );
    }

    #[test]
    fn test_save_unmirrors_and_overwrites() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("annotated_image_0.png");

        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        save_annotated(&RgbImage::new(4, 4), &path)?;
        save_annotated(&image, &path)?;

        let saved = image::open(&path)?.into_rgb8();
        assert_eq!(saved.dimensions(), (2, 1));
        assert_eq!(saved.get_pixel(1, 0), &Rgb([255, 0, 0]));
        assert_eq!(saved.get_pixel(0, 0), &Rgb([0, 0, 0]));
        Ok(())
    }
}
