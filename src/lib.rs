pub mod annotate;
pub mod config;
pub mod detection;
pub mod errors;
pub mod hand;
pub mod imageops_ai;
pub mod loader;
pub mod model;
pub mod output;
pub mod rect;
pub mod report;
pub mod traits;

pub mod mocks;

use std::io::Write;
use std::path::{Path, PathBuf};

use image::RgbImage;
use indicatif::ProgressBar;

pub use annotate::Annotator;
pub use config::{Config, DetectorOptions};
pub use errors::{HandLandmarkError, Result};
pub use hand::{HandLabel, HandRecord, Handedness, LandmarkIdx, NormalizedLandmark};
pub use model::MediapipeHands;
pub use traits::*;

#[cfg(test)]
pub use mocks::*;

/// What a pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of images that went through the detector.
    pub processed: usize,
    /// Annotated images written, in input order.
    pub annotated: Vec<PathBuf>,
    /// Inputs that could not be read and were skipped.
    pub skipped: Vec<PathBuf>,
}

/// Runs the hand landmarker over a list of images and writes annotated copies.
pub struct HandAnnotationPipeline<M: HandLandmarker> {
    model: M,
    config: Config,
    annotator: Annotator,
    progress: ProgressBar,
}

impl<M: HandLandmarker> HandAnnotationPipeline<M> {
    pub fn new(model: M, config: Config) -> Self {
        Self {
            model,
            config,
            annotator: Annotator::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports progress on `progress`. Console lines are printed with the bar suspended.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The files this pipeline will process, in index order.
    pub fn input_files(&self) -> Vec<PathBuf> {
        loader::collect_inputs(&self.config.images)
    }

    /// Processes every input in order, writing console lines to `out`.
    ///
    /// Inputs that cannot be read abort the run unless `skip_unreadable` is set. Detector and
    /// output errors always abort. The progress bar is finished either way, and left in place
    /// when the run fails.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        let files = self.input_files();
        self.progress.set_length(files.len() as u64);

        let result = self.run_files(&files, out);
        match result {
            Ok(_) => self.progress.finish_and_clear(),
            Err(_) => self.progress.abandon(),
        }
        result
    }

    fn run_files<W: Write>(&self, files: &[PathBuf], out: &mut W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for (index, path) in files.iter().enumerate() {
            let image = match loader::load_mirrored(path) {
                Ok(image) => image,
                Err(e) if self.config.skip_unreadable => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    summary.skipped.push(path.clone());
                    self.progress.inc(1);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let saved = self.annotate_image(index, path, &image, out)?;
            summary.processed += 1;
            summary.annotated.extend(saved);
            self.progress.inc(1);
        }

        Ok(summary)
    }

    /// Detects, reports and annotates a single image.
    ///
    /// Returns the path of the written file, or `None` if no hand was found.
    pub fn process_image<W: Write>(
        &self,
        index: usize,
        path: &Path,
        out: &mut W,
    ) -> Result<Option<PathBuf>> {
        let image = loader::load_mirrored(path)?;
        self.annotate_image(index, path, &image, out)
    }

    fn annotate_image<W: Write>(
        &self,
        index: usize,
        path: &Path,
        image: &RgbImage,
        out: &mut W,
    ) -> Result<Option<PathBuf>> {
        let hands = self.model.detect(image)?;
        log::debug!("{}: {} hand(s)", path.display(), hands.len());

        self.print(out, &report::handedness_line(&hands))?;
        if hands.is_empty() {
            return Ok(None);
        }

        let (width, height) = image.dimensions();
        let mut annotated = image.clone();
        for hand in &hands {
            let (x, y) = hand.index_finger_tip_px(width, height);
            self.print(out, &report::fingertip_line(x, y))?;
            self.annotator.draw_hand(&mut annotated, hand);
        }

        let output_file = output::output_path(
            &self.config.output_dir,
            &self.config.prefix,
            index,
            &self.config.format,
        );
        output::save_annotated(&annotated, &output_file)?;
        log::info!("wrote {}", output_file.display());

        Ok(Some(output_file))
    }

    fn print<W: Write>(&self, out: &mut W, line: &str) -> Result<()> {
        self.progress
            .suspend(|| writeln!(out, "{}", line))
            .map_err(|e| HandLandmarkError::FileSystem {
                path: PathBuf::from("<console>"),
                operation: "console output".to_string(),
                source: e,
            })
    }
}

// Convenience constructor for the ONNX detector.
impl HandAnnotationPipeline<MediapipeHands> {
    pub fn with_onnx_models(config: Config) -> Result<Self> {
        let model = MediapipeHands::new(
            &config.palm_model,
            &config.landmark_model,
            config.detector_options(),
        )?;
        Ok(Self::new(model, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::DrawingSpec;
    use clap::Parser;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn config_for(dir: &Path, images: Vec<PathBuf>) -> Config {
        let mut config = Config::parse_from(["hand-landmark-rs"]);
        config.images = images;
        config.output_dir = dir.join("out");
        config
    }

    #[test]
    fn test_process_image_without_hand() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("empty.png");
        RgbImage::new(8, 8).save(&input)?;

        let config = config_for(temp_dir.path(), vec![input.clone()]);
        let pipeline = HandAnnotationPipeline::new(create_mock_landmarker(), config);

        let mut out = Vec::new();
        let saved = pipeline.process_image(0, &input, &mut out)?;

        assert_eq!(saved, None);
        assert_eq!(String::from_utf8_lossy(&out), "Handedness: None\n");
        assert!(!temp_dir.path().join("out").join("annotated_image_0.png").exists());
        Ok(())
    }

    #[test]
    fn test_process_image_reports_mirrored_fingertip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("hand.png");
        let mut image = RgbImage::new(10, 6);
        image.put_pixel(2, 3, Rgb([255, 0, 0]));
        image.save(&input)?;

        let config = config_for(temp_dir.path(), vec![input.clone()]);
        let pipeline = HandAnnotationPipeline::new(create_mock_landmarker(), config);

        let mut out = Vec::new();
        let saved = pipeline.process_image(4, &input, &mut out)?;

        // x = 2 becomes 7 after mirroring, the mock reports the pixel center
        assert_eq!(
            String::from_utf8_lossy(&out),
            "Handedness: [Left (0.90)]\nIndex finger tip coordinates: (7.50, 3.50)\n"
        );
        assert_eq!(
            saved,
            Some(temp_dir.path().join("out").join("annotated_image_4.png"))
        );
        Ok(())
    }

    #[test]
    fn test_custom_annotator_colors_saved_image() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("hand.png");
        let mut image = RgbImage::new(10, 6);
        image.put_pixel(2, 3, Rgb([255, 0, 0]));
        image.save(&input)?;

        let green = DrawingSpec {
            color: Rgb([0, 255, 0]),
            ..DrawingSpec::LANDMARKS
        };
        let config = config_for(temp_dir.path(), vec![input.clone()]);
        let pipeline = HandAnnotationPipeline::new(create_mock_landmarker(), config)
            .with_annotator(Annotator::new(green, DrawingSpec::CONNECTIONS));

        let saved = pipeline.process_image(0, &input, &mut Vec::<u8>::new())?;
        let saved = image::open(saved.expect("a hand was found"))?.into_rgb8();
        assert_eq!(saved.get_pixel(2, 3), &Rgb([0, 255, 0]));
        Ok(())
    }

    #[test]
    fn test_progress_finished_on_failure() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("missing.png");

        let progress = ProgressBar::hidden();
        let config = config_for(temp_dir.path(), vec![missing]);
        let pipeline = HandAnnotationPipeline::new(create_mock_landmarker(), config)
            .with_progress(progress.clone());

        assert!(pipeline.run(&mut Vec::<u8>::new()).is_err());
        assert!(progress.is_finished());
        Ok(())
    }

    #[test]
    fn test_progress_finished_on_success() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("empty.png");
        RgbImage::new(4, 4).save(&input)?;

        let progress = ProgressBar::hidden();
        let config = config_for(temp_dir.path(), vec![input]);
        let pipeline = HandAnnotationPipeline::new(create_mock_landmarker(), config)
            .with_progress(progress.clone());

        pipeline.run(&mut Vec::<u8>::new())?;
        assert!(progress.is_finished());
        assert_eq!(progress.position(), 1);
        Ok(())
    }
}
