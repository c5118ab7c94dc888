use crate::errors::Result;
use crate::hand::HandRecord;
use image::RgbImage;

/// Abstraction over hand landmark detectors.
///
/// The pipeline depends on this trait rather than on the ONNX implementation, so it can be
/// driven by a mock in tests.
pub trait HandLandmarker {
    /// Detects hands in an RGB image.
    ///
    /// Returns one record per hand, most confident first. An empty vector means no hand was
    /// found, which is not an error.
    fn detect(&self, image: &RgbImage) -> Result<Vec<HandRecord>>;
}

impl<T: HandLandmarker + ?Sized> HandLandmarker for &T {
    fn detect(&self, image: &RgbImage) -> Result<Vec<HandRecord>> {
        (**self).detect(image)
    }
}

impl<T: HandLandmarker + ?Sized> HandLandmarker for Box<T> {
    fn detect(&self, image: &RgbImage) -> Result<Vec<HandRecord>> {
        (**self).detect(image)
    }
}
