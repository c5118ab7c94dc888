//! Drawing hand landmarks onto images.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, BresenhamLineIter};

use crate::hand::{HandRecord, NormalizedLandmark, HAND_CONNECTIONS};

/// Color and size used to draw a landmark or a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingSpec {
    pub color: Rgb<u8>,
    pub thickness: u32,
    pub circle_radius: u32,
}

impl DrawingSpec {
    /// Red dots for landmarks.
    pub const LANDMARKS: Self = Self {
        color: Rgb([255, 0, 0]),
        thickness: 2,
        circle_radius: 2,
    };

    /// White lines for connections.
    pub const CONNECTIONS: Self = Self {
        color: Rgb([255, 255, 255]),
        thickness: 2,
        circle_radius: 2,
    };
}

/// Draws hand skeletons onto an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotator {
    landmark_spec: DrawingSpec,
    connection_spec: DrawingSpec,
}

impl Default for Annotator {
    fn default() -> Self {
        Self {
            landmark_spec: DrawingSpec::LANDMARKS,
            connection_spec: DrawingSpec::CONNECTIONS,
        }
    }
}

impl Annotator {
    pub fn new(landmark_spec: DrawingSpec, connection_spec: DrawingSpec) -> Self {
        Self {
            landmark_spec,
            connection_spec,
        }
    }

    /// Draws the connections of `hand`, then its landmarks on top.
    ///
    /// Landmarks outside the image are skipped, along with every connection that touches them.
    pub fn draw_hand(&self, image: &mut RgbImage, hand: &HandRecord) {
        let (width, height) = image.dimensions();
        let landmarks = hand.landmarks();
        let to_px = |lm: &NormalizedLandmark| {
            lm.is_within_image().then(|| pixel_position(lm, width, height))
        };

        for (a, b) in HAND_CONNECTIONS {
            if let (Some(start), Some(end)) = (
                to_px(&landmarks[*a as usize]),
                to_px(&landmarks[*b as usize]),
            ) {
                draw_thick_line(image, start, end, &self.connection_spec);
            }
        }

        for lm in landmarks {
            if let Some(center) = to_px(lm) {
                draw_filled_circle_mut(
                    image,
                    center,
                    self.landmark_spec.circle_radius as i32,
                    self.landmark_spec.color,
                );
            }
        }
    }
}

/// Pixel position of a landmark, clamped to the last row/column.
fn pixel_position(lm: &NormalizedLandmark, width: u32, height: u32) -> (i32, i32) {
    let (x, y) = lm.to_pixel(width, height);
    let x = (x.floor() as i32).min(width.saturating_sub(1) as i32);
    let y = (y.floor() as i32).min(height.saturating_sub(1) as i32);
    (x, y)
}

fn draw_thick_line(image: &mut RgbImage, start: (i32, i32), end: (i32, i32), spec: &DrawingSpec) {
    let radius = (spec.thickness / 2) as i32;
    let line = BresenhamLineIter::new(
        (start.0 as f32, start.1 as f32),
        (end.0 as f32, end.1 as f32),
    );
    for point in line {
        if radius == 0 {
            if point.0 >= 0
                && point.1 >= 0
                && (point.0 as u32) < image.width()
                && (point.1 as u32) < image.height()
            {
                image.put_pixel(point.0 as u32, point.1 as u32, spec.color);
            }
        } else {
            draw_filled_circle_mut(image, point, radius, spec.color);
        }
    }
}
