use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use crate::rect::RotatedRect;

/// Samples the rotated region `roi` of `image` into a new `width` x `height` image.
///
/// Areas of the region outside the source image are filled with black.
pub fn crop_rotated(image: &RgbImage, roi: &RotatedRect, width: u32, height: u32) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    if roi.size() <= 0.0 {
        return out;
    }

    // Image pixel -> crop pixel, with pixel centers at +0.5.
    let projection = Projection::translate(width as f32 / 2.0 - 0.5, height as f32 / 2.0 - 0.5)
        * Projection::scale(width as f32 / roi.size(), height as f32 / roi.size())
        * Projection::rotate(-roi.rotation())
        * Projection::translate(0.5 - roi.x_center(), 0.5 - roi.y_center());

    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    out
}
