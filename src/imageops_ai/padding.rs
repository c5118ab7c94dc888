use image::{imageops, imageops::FilterType, GenericImageView, ImageBuffer, Pixel, Primitive};
use num_traits::AsPrimitive;

/// Computes the offset that centers a `width` x `height` image on a `pad_width` x `pad_height`
/// canvas.
///
/// Returns `None` if the image does not fit.
pub fn center_position(width: u32, height: u32, pad_width: u32, pad_height: u32) -> Option<(i64, i64)> {
    if width > pad_width || height > pad_height {
        return None;
    }

    let (x, y) = ((pad_width - width) / 2, (pad_height - height) / 2);
    Some((x.as_(), y.as_()))
}

pub fn padding<I, P, S>(
    image: &I,
    pad_width: u32,
    pad_height: u32,
    color: P,
) -> Option<(ImageBuffer<P, Vec<S>>, (i64, i64))>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();

    center_position(width, height, pad_width, pad_height).map(|(x, y)| {
        let mut canvas = ImageBuffer::from_pixel(pad_width, pad_height, color);
        imageops::overlay(&mut canvas, image, x, y);
        (canvas, (x, y))
    })
}

/// How an image was fitted into a network input by [`letterbox`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    source: (u32, u32),
    target: (u32, u32),
}

impl Letterbox {
    /// Maps a normalized position in the letterboxed image to a normalized position in the
    /// source image.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let px = (x * self.target.0 as f32 - self.pad_x) / self.scale;
        let py = (y * self.target.1 as f32 - self.pad_y) / self.scale;
        (px / self.source.0 as f32, py / self.source.1 as f32)
    }

    /// Factors converting a normalized extent in the letterboxed image to the source image.
    pub fn extent_scale(&self) -> (f32, f32) {
        (
            self.target.0 as f32 / self.scale / self.source.0 as f32,
            self.target.1 as f32 / self.scale / self.source.1 as f32,
        )
    }
}

/// Resizes `image` to fit into `target_width` x `target_height` without changing its aspect
/// ratio, filling the remaining area with `color`.
pub fn letterbox<I, P, S>(
    image: &I,
    target_width: u32,
    target_height: u32,
    color: P,
) -> (ImageBuffer<P, Vec<S>>, Letterbox)
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    let scale = (target_width as f32 / width as f32).min(target_height as f32 / height as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, target_width);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, target_height);

    let resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);
    // sizes are clamped to the target above, so `padding` cannot fail
    let (canvas, (x, y)) = padding(&resized, target_width, target_height, color)
        .unwrap_or_else(|| (resized.clone(), (0, 0)));

    let info = Letterbox {
        scale,
        pad_x: x as f32,
        pad_y: y as f32,
        source: (width, height),
        target: (target_width, target_height),
    };
    (canvas, info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_center_position() {
        assert_eq!(center_position(10, 20, 30, 20), Some((10, 0)));
        assert_eq!(center_position(40, 20, 30, 20), None);
    }

    #[test]
    fn test_letterbox_wide_image() {
        let image = RgbImage::from_pixel(400, 200, Rgb([255, 255, 255]));
        let (boxed, info) = letterbox(&image, 192, 192, Rgb([0, 0, 0]));

        assert_eq!(boxed.dimensions(), (192, 192));
        // 400x200 shrinks to 192x96, centered with 48 rows of padding above
        assert_eq!(boxed.get_pixel(96, 10), &Rgb([0, 0, 0]));
        assert_eq!(boxed.get_pixel(96, 96), &Rgb([255, 255, 255]));

        let (x, y) = info.to_source(0.5, 0.5);
        assert_relative_eq!(x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(y, 0.5, epsilon = 1e-6);

        let (_, top) = info.to_source(0.5, 48.0 / 192.0);
        assert_relative_eq!(top, 0.0, epsilon = 1e-6);

        let (sx, sy) = info.extent_scale();
        assert_relative_eq!(sx, 1.0, epsilon = 1e-6);
        assert_relative_eq!(sy, 2.0, epsilon = 1e-6);
    }
}
