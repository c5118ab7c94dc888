use std::path::Path;

use image::{Rgb, RgbImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

use crate::{
    config::DetectorOptions,
    detection::{
        decode_palms,
        nms::NonMaxSuppression,
        ssd::{AnchorParams, Anchors},
        Detection, PalmKeypoint, PALM_REGRESSOR_LEN,
    },
    errors::{HandLandmarkError, Result},
    hand::{HandRecord, Handedness, NormalizedLandmark, NUM_LANDMARKS},
    imageops_ai::{crop_rotated, letterbox},
    rect::{normalize_radians, RotatedRect},
    traits::HandLandmarker,
};

/// Memory layout of an image input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    Nchw,
    Nhwc,
}

/// An ONNX network taking a single RGB image, with values in `[0, 1]`.
struct ImageNetwork {
    session: Mutex<Session>,
    input_name: String,
    output_names: Vec<String>,
    layout: TensorLayout,
    width: u32,
    height: u32,
}

impl ImageNetwork {
    fn load(model_path: &Path, device_id: i32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| HandLandmarkError::model("session builder initialization", e))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| HandLandmarkError::model("execution provider setup", e))?
            .with_memory_pattern(true)
            .map_err(|e| HandLandmarkError::model("memory pattern setup", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                HandLandmarkError::model(format!("loading model {}", model_path.display()), e)
            })?;

        let input = session.inputs.first().ok_or_else(|| HandLandmarkError::Validation {
            field: "model inputs".to_string(),
            reason: format!("{} declares no inputs", model_path.display()),
        })?;
        let input_name = input.name.clone();
        let shape: Vec<i64> = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect())
            .ok_or_else(|| HandLandmarkError::Validation {
                field: "model input".to_string(),
                reason: format!("{} input is not a tensor", model_path.display()),
            })?;
        let (layout, width, height) = input_layout(&shape).ok_or_else(|| {
            HandLandmarkError::Validation {
                field: "model input shape".to_string(),
                reason: format!("expected an RGB image tensor, got {:?}", shape),
            }
        })?;
        let output_names: Vec<String> =
            session.outputs.iter().map(|o| o.name.clone()).collect();

        // warm up
        let data = zeros_input(layout, width, height);
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)?])
            .map_err(|e| HandLandmarkError::model("model warm-up run", e))?;

        log::debug!(
            "loaded {} ({:?}, {}x{}, outputs {:?})",
            model_path.display(),
            layout,
            width,
            height,
            output_names
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_names,
            layout,
            width,
            height,
        })
    }

    /// Runs the network and returns every output as an owned `f32` array, in model order.
    fn run(&self, image: &RgbImage) -> Result<Vec<ArrayD<f32>>> {
        let tensor = image_to_tensor(image, self.layout);
        let mut session = self.session.lock();
        let outputs = session.run(
            ort::inputs![self.input_name.as_str() => TensorRef::from_array_view(&tensor)?],
        )?;

        let arrays = self
            .output_names
            .iter()
            .map(|name| -> Result<ArrayD<f32>> {
                Ok(outputs[name.as_str()].try_extract_array::<f32>()?.to_owned())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(arrays)
    }
}

fn input_layout(shape: &[i64]) -> Option<(TensorLayout, u32, u32)> {
    match *shape {
        [_, 3, h, w] if h > 0 && w > 0 => Some((TensorLayout::Nchw, w as u32, h as u32)),
        [_, h, w, 3] if h > 0 && w > 0 => Some((TensorLayout::Nhwc, w as u32, h as u32)),
        _ => None,
    }
}

fn zeros_input(layout: TensorLayout, width: u32, height: u32) -> Array4<f32> {
    let (w, h) = (width as usize, height as usize);
    match layout {
        TensorLayout::Nchw => Array4::zeros((1, 3, h, w)),
        TensorLayout::Nhwc => Array4::zeros((1, h, w, 3)),
    }
}

/// Converts an RGB image to a batch-of-one tensor with values in `[0, 1]`.
pub fn image_to_tensor(image: &RgbImage, layout: TensorLayout) -> Array4<f32> {
    let chw = image.as_ndarray3().mapv(|v| f32::from(v) / 255.0);
    let tensor = match layout {
        TensorLayout::Nchw => chw,
        TensorLayout::Nhwc => chw.permuted_axes([1, 2, 0]),
    };
    tensor.insert_axis(Axis(0)).as_standard_layout().into_owned()
}

/// Hand landmark detection with the MediaPipe palm detection and hand landmark networks.
///
/// Each image goes through the palm detector first; every palm that survives non-maximum
/// suppression is expanded into a rotated square region that the landmark network is run on.
pub struct MediapipeHands {
    palm: ImageNetwork,
    landmark: ImageNetwork,
    anchors: Anchors,
    nms: NonMaxSuppression,
    options: DetectorOptions,
}

impl MediapipeHands {
    pub fn new(palm_model: &Path, landmark_model: &Path, options: DetectorOptions) -> Result<Self> {
        if !options.static_image_mode {
            return Err(HandLandmarkError::Configuration {
                message: "only static image mode is supported, tracking across frames is not"
                    .to_string(),
            });
        }

        let palm = ImageNetwork::load(palm_model, options.device_id)?;
        let landmark = ImageNetwork::load(landmark_model, options.device_id)?;
        let anchors = Anchors::calculate(&AnchorParams::palm(palm.width, palm.height));

        Ok(Self {
            palm,
            landmark,
            anchors,
            nms: NonMaxSuppression::new(),
            options,
        })
    }

    /// Finds palms, in normalized image coordinates, most confident first.
    fn detect_palms(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (boxed, info) = letterbox(image, self.palm.width, self.palm.height, Rgb([0, 0, 0]));
        let outputs = self.palm.run(&boxed)?;

        let boxes = find_output(&outputs, PALM_REGRESSOR_LEN, "palm box regressors")?;
        let scores = find_output(&outputs, 1, "palm scores")?;
        if boxes.nrows() != self.anchors.anchor_count() {
            return Err(HandLandmarkError::Validation {
                field: "palm box regressors".to_string(),
                reason: format!(
                    "expected {} anchors, got {}",
                    self.anchors.anchor_count(),
                    boxes.nrows()
                ),
            });
        }

        let candidates = decode_palms(
            &self.anchors,
            boxes.view(),
            scores.view(),
            (self.palm.width, self.palm.height),
            self.options.min_detection_confidence,
        );
        let mut palms = self.nms.process(candidates);
        palms.truncate(self.options.max_num_hands);

        let scale = info.extent_scale();
        for palm in &mut palms {
            palm.map_coords(scale, |x, y| info.to_source(x, y));
        }
        log::debug!("{} palm(s) detected", palms.len());
        Ok(palms)
    }

    /// Runs the landmark network on one region. Returns `None` if no hand is present there.
    fn estimate_landmarks(&self, image: &RgbImage, roi: &RotatedRect) -> Result<Option<HandRecord>> {
        let (in_w, in_h) = (self.landmark.width, self.landmark.height);
        let crop = crop_rotated(image, roi, in_w, in_h);
        let outputs = self.landmark.run(&crop)?;

        let [landmarks, presence, handedness, ..] = outputs.as_slice() else {
            return Err(HandLandmarkError::Validation {
                field: "landmark outputs".to_string(),
                reason: format!("expected at least 3 outputs, got {}", outputs.len()),
            });
        };

        let presence = first_value(presence, "hand presence")?;
        if presence < self.options.min_presence_confidence {
            log::debug!("dropping hand with presence {:.3}", presence);
            return Ok(None);
        }
        let handedness = Handedness::from_raw_score(first_value(handedness, "handedness")?);

        let raw = landmarks.iter().copied().collect::<Vec<f32>>();
        let points = project_landmarks(&raw, roi, (in_w, in_h), image.dimensions())?;

        HandRecord::from_landmarks(handedness, &points).map(Some)
    }
}

impl HandLandmarker for MediapipeHands {
    fn detect(&self, image: &RgbImage) -> Result<Vec<HandRecord>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mut hands = Vec::new();
        for palm in self.detect_palms(image)? {
            let roi = palm_roi(&palm, width, height)?;
            if let Some(hand) = self.estimate_landmarks(image, &roi)? {
                hands.push(hand);
            }
        }
        Ok(hands)
    }
}

/// Picks the first output whose innermost dimension is `len`, as a `[rows, len]` matrix.
fn find_output(outputs: &[ArrayD<f32>], len: usize, what: &str) -> Result<Array2<f32>> {
    let output = outputs
        .iter()
        .find(|o| o.shape().last() == Some(&len) && o.len() > len.max(1))
        .ok_or_else(|| HandLandmarkError::Validation {
            field: what.to_string(),
            reason: format!("no output with innermost dimension {}", len),
        })?;
    Ok(output
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((output.len() / len, len))?)
}

/// Palm box scale applied before cropping the landmark network input.
const ROI_SCALE: f32 = 2.6;
/// Palm box shift along its rotated y axis, in box heights.
const ROI_SHIFT_Y: f32 = -0.5;
/// Wrist to middle finger MCP points straight up in an upright hand.
const TARGET_ANGLE: f32 = std::f32::consts::FRAC_PI_2;
/// Divisor applied to the landmark network's relative depth.
const Z_NORMALIZATION: f32 = 0.4;

/// Derives the rotated landmark crop region, in image pixels, from a palm detection in
/// normalized image coordinates.
///
/// The region is turned so that wrist to middle finger MCP points up, moved half a box height
/// towards the fingers and squared on the longer box side.
pub fn palm_roi(palm: &Detection, width: u32, height: u32) -> Result<RotatedRect> {
    let (w, h) = (width as f32, height as f32);
    let keypoint = |kp: PalmKeypoint| {
        palm.keypoint(kp).ok_or_else(|| HandLandmarkError::Validation {
            field: "palm keypoints".to_string(),
            reason: format!("missing {:?}", kp),
        })
    };
    let wrist = keypoint(PalmKeypoint::Wrist)?;
    let middle = keypoint(PalmKeypoint::MiddleFingerMcp)?;

    let rotation = normalize_radians(
        TARGET_ANGLE - (-(middle.y - wrist.y) * h).atan2((middle.x - wrist.x) * w),
    );

    let rect = palm.bounding_rect();
    let (box_w, box_h) = (rect.width() * w, rect.height() * h);
    let (sin, cos) = rotation.sin_cos();
    let x_center = rect.x_center() * w - box_h * ROI_SHIFT_Y * sin;
    let y_center = rect.y_center() * h + box_h * ROI_SHIFT_Y * cos;
    let size = box_w.max(box_h) * ROI_SCALE;

    Ok(RotatedRect::new(x_center, y_center, size, rotation))
}

/// Maps raw landmark network output, `x y z` triples in crop pixels, back into normalized
/// image coordinates through `roi`.
pub fn project_landmarks(
    raw: &[f32],
    roi: &RotatedRect,
    input_size: (u32, u32),
    image_size: (u32, u32),
) -> Result<Vec<NormalizedLandmark>> {
    if raw.len() < NUM_LANDMARKS * 3 {
        return Err(HandLandmarkError::Validation {
            field: "landmarks".to_string(),
            reason: format!("expected {} values, got {}", NUM_LANDMARKS * 3, raw.len()),
        });
    }

    let (in_w, in_h) = (input_size.0 as f32, input_size.1 as f32);
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);
    let points = raw
        .chunks_exact(3)
        .take(NUM_LANDMARKS)
        .map(|lm| {
            let (x, y) = roi.to_image(lm[0] / in_w, lm[1] / in_h);
            let z = lm[2] / in_w / Z_NORMALIZATION * roi.size();
            NormalizedLandmark::new(x / width, y / height, z / width)
        })
        .collect();
    Ok(points)
}

fn first_value(output: &ArrayD<f32>, what: &str) -> Result<f32> {
    output
        .iter()
        .next()
        .copied()
        .ok_or_else(|| HandLandmarkError::Validation {
            field: what.to_string(),
            reason: "output is empty".to_string(),
        })
}
