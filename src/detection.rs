//! Palm detection output decoding.
//!
//! The palm network predicts, for every SSD anchor, a box and 7 keypoints relative to the anchor
//! plus a logit. Everything here works in normalized coordinates of the network input.

pub mod nms;
pub mod ssd;

use ndarray::ArrayView2;
use num_traits::Float;

use crate::rect::Rect;

use self::ssd::Anchors;

/// Number of values regressed per anchor: box center and size, then 7 keypoints.
pub const PALM_REGRESSOR_LEN: usize = 18;

/// A palm keypoint of a [`Detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalmKeypoint {
    Wrist = 0,
    IndexFingerMcp = 1,
    MiddleFingerMcp = 2,
    RingFingerMcp = 3,
    PinkyMcp = 4,
    ThumbCmc = 5,
    ThumbMcp = 6,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A detected palm: bounding box, confidence in `[0, 1]` and keypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    confidence: f32,
    rect: Rect,
    keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn with_keypoints(confidence: f32, rect: Rect, keypoints: Vec<Keypoint>) -> Self {
        Self {
            confidence,
            rect,
            keypoints,
        }
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bounding_rect(&self) -> Rect {
        self.rect
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn keypoint(&self, kp: PalmKeypoint) -> Option<Keypoint> {
        self.keypoints.get(kp as usize).copied()
    }

    /// Applies `f` to the box center and every keypoint, and scales the box size by `scale`.
    ///
    /// Used to move detections out of the letterboxed network input into image space.
    pub fn map_coords(
        &mut self,
        scale: (f32, f32),
        mut f: impl FnMut(f32, f32) -> (f32, f32),
    ) {
        let (xc, yc) = f(self.rect.x_center(), self.rect.y_center());
        self.rect = Rect::from_center(
            xc,
            yc,
            self.rect.width() * scale.0,
            self.rect.height() * scale.1,
        );
        for kp in &mut self.keypoints {
            let (x, y) = f(kp.x, kp.y);
            kp.x = x;
            kp.y = y;
        }
    }
}

/// Logistic function with the input clipped to `[-clip, clip]`.
pub fn clipped_sigmoid<T: Float>(v: T, clip: T) -> T {
    let v = v.max(-clip).min(clip);
    T::one() / (T::one() + (-v).exp())
}

/// Turns raw palm network outputs into detections above `threshold`.
///
/// `boxes` has shape `[anchors, 18]`, `scores` has shape `[anchors, 1]`. `input_size` is the
/// network input resolution that the box regressors are expressed in.
pub fn decode_palms(
    anchors: &Anchors,
    boxes: ArrayView2<'_, f32>,
    scores: ArrayView2<'_, f32>,
    input_size: (u32, u32),
    threshold: f32,
) -> Vec<Detection> {
    const SCORE_CLIP: f32 = 100.0;

    let (input_w, input_h) = (input_size.0 as f32, input_size.1 as f32);
    let count = anchors
        .anchor_count()
        .min(boxes.nrows())
        .min(scores.nrows());

    let mut detections = Vec::new();
    for index in 0..count {
        let confidence = clipped_sigmoid(scores[[index, 0]], SCORE_CLIP);
        if confidence < threshold {
            continue;
        }

        let anchor = &anchors[index];
        let raw = boxes.row(index);
        let rect = Rect::from_center(
            raw[0] / input_w + anchor.x_center(),
            raw[1] / input_h + anchor.y_center(),
            raw[2] / input_w,
            raw[3] / input_h,
        );
        let keypoints = (4..PALM_REGRESSOR_LEN)
            .step_by(2)
            .map(|i| {
                Keypoint::new(
                    raw[i] / input_w + anchor.x_center(),
                    raw[i + 1] / input_h + anchor.y_center(),
                )
            })
            .collect();

        detections.push(Detection::with_keypoints(confidence, rect, keypoints));
    }

    log::trace!("{} palm candidates above {}", detections.len(), threshold);
    detections
}

#[cfg(test)]
mod tests {
    use super::ssd::AnchorParams;
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_clipped_sigmoid() {
        assert_relative_eq!(clipped_sigmoid(0.0f32, 100.0), 0.5);
        assert_relative_eq!(clipped_sigmoid(1e6f32, 100.0), 1.0);
        assert!(clipped_sigmoid(-1e6f32, 100.0) >= 0.0);
    }

    #[test]
    fn test_decode_single_anchor() {
        let anchors = Anchors::calculate(&AnchorParams::palm(192, 192));
        let count = anchors.anchor_count();

        let mut boxes = Array2::<f32>::zeros((count, PALM_REGRESSOR_LEN));
        let mut scores = Array2::<f32>::from_elem((count, 1), -10.0);

        let index = 5;
        scores[[index, 0]] = 4.0;
        boxes[[index, 0]] = 19.2; // +0.1 in normalized units
        boxes[[index, 2]] = 38.4;
        boxes[[index, 3]] = 57.6;
        boxes[[index, 8]] = -9.6; // middle finger MCP x

        let detections = decode_palms(&anchors, boxes.view(), scores.view(), (192, 192), 0.5);
        assert_eq!(detections.len(), 1);

        let det = &detections[0];
        let anchor = anchors[index];
        assert_relative_eq!(det.confidence(), clipped_sigmoid(4.0, 100.0));
        assert_relative_eq!(det.bounding_rect().x_center(), anchor.x_center() + 0.1, epsilon = 1e-6);
        assert_relative_eq!(det.bounding_rect().width(), 0.2, epsilon = 1e-6);
        assert_relative_eq!(det.bounding_rect().height(), 0.3, epsilon = 1e-6);
        assert_eq!(det.keypoints().len(), 7);

        let mcp = det.keypoint(PalmKeypoint::MiddleFingerMcp).unwrap();
        assert_relative_eq!(mcp.x, anchor.x_center() - 0.05, epsilon = 1e-6);
        assert_relative_eq!(mcp.y, anchor.y_center(), epsilon = 1e-6);
    }

    #[test]
    fn test_map_coords() {
        let mut det = Detection::with_keypoints(
            0.9,
            Rect::from_center(0.5, 0.5, 0.2, 0.2),
            vec![Keypoint::new(0.25, 0.75)],
        );
        det.map_coords((2.0, 1.0), |x, y| (x * 2.0, y));

        assert_relative_eq!(det.bounding_rect().x_center(), 1.0);
        assert_relative_eq!(det.bounding_rect().width(), 0.4);
        assert_relative_eq!(det.bounding_rect().height(), 0.2);
        assert_relative_eq!(det.keypoints()[0].x, 0.5);
    }
}
