//! Hand records returned by a [`crate::HandLandmarker`].

use std::fmt;

use crate::errors::{HandLandmarkError, Result};

/// Number of landmarks estimated per hand.
pub const NUM_LANDMARKS: usize = 21;

/// Names for the hand landmarks, in the order the landmark network emits them.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb, near the wrist.
/// - **MCP**: Metacarpophalangeal joint, the knuckles near the palm.
/// - **PIP**: Proximal interphalangeal joint, between the MCP and DIP.
/// - **DIP**: Distal interphalangeal joint, the highest joint of a finger.
/// - **Tip**: placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Anatomical connections between landmarks, used to draw the hand skeleton.
pub const HAND_CONNECTIONS: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Palm:
        (Wrist, ThumbCmc),
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// A landmark in normalized image coordinates.
///
/// `x` and `y` are relative to the image width and height. `z` is the depth relative to the
/// wrist, on roughly the same scale as `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedLandmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Converts the landmark to pixel coordinates of a `width` x `height` image.
    #[inline]
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// Returns `true` if the landmark lies within the image bounds.
    #[inline]
    pub fn is_within_image(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLabel {
    Left,
    Right,
}

impl fmt::Display for HandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandLabel::Left => f.write_str("Left"),
            HandLabel::Right => f.write_str("Right"),
        }
    }
}

/// Handedness classification of a detected hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handedness {
    pub label: HandLabel,
    pub score: f32,
}

impl Handedness {
    /// Derives the handedness from the landmark network's raw score, for a mirrored image.
    ///
    /// The raw score is the probability of the first class, `Left`, of the mirrored view. On
    /// an image passed in as-is the labels swap.
    pub fn from_raw_score(raw: f32) -> Self {
        if raw > 0.5 {
            Self {
                label: HandLabel::Left,
                score: raw,
            }
        } else {
            Self {
                label: HandLabel::Right,
                score: 1.0 - raw,
            }
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.score)
    }
}

/// One detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandRecord {
    handedness: Handedness,
    landmarks: [NormalizedLandmark; NUM_LANDMARKS],
}

impl HandRecord {
    pub const fn new(handedness: Handedness, landmarks: [NormalizedLandmark; NUM_LANDMARKS]) -> Self {
        Self {
            handedness,
            landmarks,
        }
    }

    /// Builds a record from a landmark list, checking that it holds exactly 21 points.
    pub fn from_landmarks(handedness: Handedness, landmarks: &[NormalizedLandmark]) -> Result<Self> {
        let landmarks: [NormalizedLandmark; NUM_LANDMARKS] =
            landmarks
                .try_into()
                .map_err(|_| HandLandmarkError::Validation {
                    field: "landmarks".to_string(),
                    reason: format!(
                        "must contain {} points, got {}",
                        NUM_LANDMARKS,
                        landmarks.len()
                    ),
                })?;
        Ok(Self::new(handedness, landmarks))
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn landmarks(&self) -> &[NormalizedLandmark; NUM_LANDMARKS] {
        &self.landmarks
    }

    #[inline]
    pub fn landmark(&self, idx: LandmarkIdx) -> NormalizedLandmark {
        self.landmarks[idx as usize]
    }

    /// Pixel coordinates of the index finger tip in a `width` x `height` image.
    pub fn index_finger_tip_px(&self, width: u32, height: u32) -> (f32, f32) {
        self.landmark(LandmarkIdx::IndexFingerTip)
            .to_pixel(width, height)
    }
}
