//! Non-maximum suppression for palm detections.
//!
//! The palm network fires on many neighboring anchors for a single hand. Overlapping detections
//! are merged into one by taking a confidence-weighted average of their boxes and keypoints
//! ([`SuppressionMode::Average`], the default), or the lower-confidence ones are dropped
//! ([`SuppressionMode::Remove`]).

use crate::rect::Rect;

use super::{Detection, Keypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionMode {
    Remove,
    Average,
}

#[derive(Debug, Clone)]
pub struct NonMaxSuppression {
    iou_thresh: f32,
    mode: SuppressionMode,
}

impl NonMaxSuppression {
    /// Intersection-over-union above which two detections are considered the same object.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            iou_thresh: Self::DEFAULT_IOU_THRESH,
            mode: SuppressionMode::Average,
        }
    }

    pub fn with_iou_thresh(mut self, iou_thresh: f32) -> Self {
        self.iou_thresh = iou_thresh;
        self
    }

    pub fn with_mode(mut self, mode: SuppressionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Filters `detections`, returning the survivors ordered by descending confidence.
    pub fn process(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        // Ascending order so the highest confidence is popped first.
        detections.sort_by(|a, b| a.confidence().total_cmp(&b.confidence()));

        let mut out = Vec::new();
        while let Some(seed) = detections.pop() {
            let seed_rect = seed.bounding_rect();
            let (overlapping, rest): (Vec<_>, Vec<_>) = detections
                .into_iter()
                .partition(|other| seed_rect.iou(&other.bounding_rect()) >= self.iou_thresh);
            detections = rest;

            match self.mode {
                SuppressionMode::Remove => out.push(seed),
                SuppressionMode::Average => out.push(weighted_average(seed, &overlapping)),
            }
        }
        out
    }
}

impl Default for NonMaxSuppression {
    fn default() -> Self {
        Self::new()
    }
}

/// Averages `seed` with the detections overlapping it, weighted by confidence.
///
/// The result keeps the seed's confidence.
fn weighted_average(seed: Detection, overlapping: &[Detection]) -> Detection {
    if overlapping.is_empty() {
        return seed;
    }

    let mut divisor = 0.0;
    let (mut xc, mut yc, mut w, mut h) = (0.0, 0.0, 0.0, 0.0);
    let mut keypoints = vec![Keypoint::new(0.0, 0.0); seed.keypoints().len()];

    for det in std::iter::once(&seed).chain(overlapping) {
        let factor = det.confidence();
        divisor += factor;

        let rect = det.bounding_rect();
        xc += rect.x_center() * factor;
        yc += rect.y_center() * factor;
        w += rect.width() * factor;
        h += rect.height() * factor;
        for (acc, kp) in keypoints.iter_mut().zip(det.keypoints()) {
            acc.x += kp.x * factor;
            acc.y += kp.y * factor;
        }
    }

    if divisor <= 0.0 {
        return seed;
    }

    for kp in &mut keypoints {
        kp.x /= divisor;
        kp.y /= divisor;
    }

    Detection::with_keypoints(
        seed.confidence(),
        Rect::from_center(xc / divisor, yc / divisor, w / divisor, h / divisor),
        keypoints,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(confidence: f32, xc: f32, kp_x: f32) -> Detection {
        Detection::with_keypoints(
            confidence,
            Rect::from_center(xc, 0.5, 0.2, 0.2),
            vec![Keypoint::new(kp_x, 0.5)],
        )
    }

    #[test]
    fn test_average_merges_overlapping() {
        let nms = NonMaxSuppression::new();
        let out = nms.process(vec![det(0.6, 0.52, 0.3), det(0.9, 0.5, 0.6)]);

        assert_eq!(out.len(), 1);
        let merged = &out[0];
        assert_relative_eq!(merged.confidence(), 0.9);
        assert_relative_eq!(
            merged.bounding_rect().x_center(),
            (0.5 * 0.9 + 0.52 * 0.6) / 1.5,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            merged.keypoints()[0].x,
            (0.6 * 0.9 + 0.3 * 0.6) / 1.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_disjoint_detections_survive() {
        let nms = NonMaxSuppression::new();
        let out = nms.process(vec![det(0.7, 0.2, 0.2), det(0.8, 0.8, 0.8)]);

        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].confidence(), 0.8);
        assert_relative_eq!(out[1].confidence(), 0.7);
    }

    #[test]
    fn test_remove_mode_keeps_seed() {
        let nms = NonMaxSuppression::new().with_mode(SuppressionMode::Remove);
        let out = nms.process(vec![det(0.6, 0.52, 0.3), det(0.9, 0.5, 0.6)]);

        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].bounding_rect().x_center(), 0.5);
        assert_relative_eq!(out[0].keypoints()[0].x, 0.6);
    }

    #[test]
    fn test_iou_threshold_controls_merging() {
        // the two boxes overlap with an IoU of about 0.82
        let detections = vec![det(0.6, 0.52, 0.3), det(0.9, 0.5, 0.6)];

        let strict = NonMaxSuppression::new().with_iou_thresh(0.9);
        assert_eq!(strict.process(detections.clone()).len(), 2);

        let loose = NonMaxSuppression::new().with_iou_thresh(0.8);
        assert_eq!(loose.process(detections).len(), 1);
    }
}
