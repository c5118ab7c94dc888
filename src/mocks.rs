use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};

use crate::errors::Result;
use crate::hand::{HandRecord, Handedness, NormalizedLandmark, NUM_LANDMARKS};
use crate::traits::HandLandmarker;

/// Test detector that "finds" a hand wherever a marker-colored pixel is.
///
/// All 21 landmarks of the hand are placed on the center of the first marker pixel in row-major
/// order. Images without the marker yield no hands.
#[derive(Debug)]
pub struct MockHandLandmarker {
    pub marker: Rgb<u8>,
    pub raw_handedness: f32,
    calls: AtomicUsize,
}

impl MockHandLandmarker {
    pub const fn new(marker: Rgb<u8>) -> Self {
        Self {
            marker,
            raw_handedness: 0.9,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl HandLandmarker for MockHandLandmarker {
    fn detect(&self, image: &RgbImage) -> Result<Vec<HandRecord>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let (width, height) = image.dimensions();
        let Some((x, y, _)) = image.enumerate_pixels().find(|(_, _, p)| **p == self.marker) else {
            return Ok(Vec::new());
        };

        let lm = NormalizedLandmark::new(
            (x as f32 + 0.5) / width as f32,
            (y as f32 + 0.5) / height as f32,
            0.0,
        );
        Ok(vec![HandRecord::new(
            Handedness::from_raw_score(self.raw_handedness),
            [lm; NUM_LANDMARKS],
        )])
    }
}

/// Mock detector using pure red as the marker.
pub const fn create_mock_landmarker() -> MockHandLandmarker {
    MockHandLandmarker::new(Rgb([255, 0, 0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::LandmarkIdx;
    use approx::assert_relative_eq;

    #[test]
    fn test_mock_finds_marker() -> Result<()> {
        let mock = create_mock_landmarker();
        let mut image = RgbImage::new(10, 4);
        image.put_pixel(7, 1, Rgb([255, 0, 0]));

        let hands = mock.detect(&image)?;
        assert_eq!(hands.len(), 1);
        let (x, y) = hands[0].index_finger_tip_px(10, 4);
        assert_relative_eq!(x, 7.5);
        assert_relative_eq!(y, 1.5);
        assert_eq!(
            hands[0].landmark(LandmarkIdx::Wrist),
            hands[0].landmark(LandmarkIdx::PinkyTip)
        );
        assert_eq!(mock.calls(), 1);
        Ok(())
    }

    #[test]
    fn test_mock_without_marker() -> Result<()> {
        let mock = create_mock_landmarker();
        assert!(mock.detect(&RgbImage::new(5, 5))?.is_empty());
        Ok(())
    }
}
