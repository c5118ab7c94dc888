use clap::Parser;
use image::ImageFormat;
use std::path::PathBuf;

use crate::errors::{HandLandmarkError, Result};

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Image files or directories to process
    #[arg(default_value = "hand.jpg")]
    pub images: Vec<PathBuf>,

    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = "annotated_image_")]
    pub prefix: String,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(long, default_value = "models/palm_detection_full.onnx")]
    pub palm_model: PathBuf,

    #[arg(long, default_value = "models/hand_landmark_full.onnx")]
    pub landmark_model: PathBuf,

    #[arg(long, default_value_t = 2)]
    pub max_num_hands: usize,

    #[arg(long, default_value_t = 0.5)]
    pub min_detection_confidence: f32,

    #[arg(long, default_value_t = 0.5)]
    pub min_presence_confidence: f32,

    /// Skip images that cannot be read instead of aborting the run
    #[arg(long)]
    pub skip_unreadable: bool,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Parses the configuration from the process arguments.
    pub fn new() -> Self {
        Self::parse()
    }

    /// Checks the value ranges clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_num_hands == 0 {
            return Err(HandLandmarkError::Validation {
                field: "max_num_hands".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_presence_confidence", self.min_presence_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(HandLandmarkError::Validation {
                    field: field.to_string(),
                    reason: format!("must be within [0, 1], got {}", value),
                });
            }
        }
        if self.images.is_empty() {
            return Err(HandLandmarkError::Configuration {
                message: "no input images given".to_string(),
            });
        }
        Ok(())
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            static_image_mode: true,
            max_num_hands: self.max_num_hands,
            min_detection_confidence: self.min_detection_confidence,
            min_presence_confidence: self.min_presence_confidence,
            device_id: self.device_id,
        }
    }
}

/// Options handed to the hand landmark detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Every image is detected from scratch; no state is kept between calls. The ONNX detector
    /// rejects `false`.
    pub static_image_mode: bool,
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub device_id: i32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            static_image_mode: true,
            max_num_hands: 2,
            min_detection_confidence: 0.5,
            min_presence_confidence: 0.5,
            device_id: 0,
        }
    }
}

fn check_format(s: &str) -> std::result::Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}
