use std::io;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};

use hand_landmark_rs::{Config, HandAnnotationPipeline};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = Config::parse();
    config.validate()?;

    ensure!(
        config.palm_model.exists(),
        "Palm detection model does not exist: {}",
        config.palm_model.display()
    );
    ensure!(
        config.landmark_model.exists(),
        "Hand landmark model does not exist: {}",
        config.landmark_model.display()
    );

    let pipeline = HandAnnotationPipeline::with_onnx_models(config)
        .context("Failed to load the hand landmark models")?;

    let files = pipeline.input_files();
    let progress_bar = if files.len() > 1 {
        let progress_bar = ProgressBar::new(files.len() as u64);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})",
            )?
            .progress_chars("#>-"),
        );
        progress_bar
    } else {
        ProgressBar::hidden()
    };
    let pipeline = pipeline.with_progress(progress_bar);

    let summary = pipeline.run(&mut io::stdout().lock())?;
    log::info!(
        "{} image(s) processed, {} annotated, {} skipped",
        summary.processed,
        summary.annotated.len(),
        summary.skipped.len()
    );

    Ok(())
}
