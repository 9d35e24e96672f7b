use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use walkdir::WalkDir;

use crate::config::SidecarConfig;
use crate::errors::{PoseBatchError, Result};
use crate::naming::{split_extension, OutputNames};
use crate::sidecar::{install_sidecar, SidecarWatcher};
use crate::traits::PoseEstimator;

/// Per-directory totals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    /// Images that could not be read.
    pub skipped: usize,
    pub failed: usize,
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Processed {
        image: PathBuf,
        /// Final JSON location, if one was found and renamed.
        json: Option<PathBuf>,
    },
    Unreadable,
}

/// Runs every image of a directory through a [`PoseEstimator`].
///
/// Rendered images go to `<output>/images`, keypoint JSON to `<output>/json`.
pub struct BatchProcessor<E: PoseEstimator> {
    engine: E,
    images_dir: PathBuf,
    json_dir: PathBuf,
    sidecar: SidecarConfig,
}

impl<E: PoseEstimator> BatchProcessor<E> {
    pub fn new(engine: E, output_dir: &Path, sidecar: SidecarConfig) -> Self {
        Self {
            engine,
            images_dir: output_dir.join("images"),
            json_dir: output_dir.join("json"),
            sidecar,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Create the output directories if they don't exist.
    pub fn prepare_output(&self) -> Result<()> {
        for dir in [&self.images_dir, &self.json_dir] {
            fs::create_dir_all(dir)
                .map_err(|e| PoseBatchError::fs(dir, "output directory creation", e))?;
        }
        Ok(())
    }

    /// Process every regular file in `input_dir`, one at a time.
    ///
    /// A failing file is logged and counted; it never stops the batch.
    pub fn process_directory(&self, input_dir: &Path) -> Result<BatchReport> {
        self.prepare_output()?;
        let inputs = collect_input_files(input_dir)?;

        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|e| PoseBatchError::Configuration {
                    message: e.to_string(),
                })?
                .progress_chars("#>-"),
        );

        let mut report = BatchReport::default();
        for input in &inputs {
            match self.process_single_image(input) {
                Ok(FileOutcome::Processed { .. }) => report.processed += 1,
                Ok(FileOutcome::Unreadable) => report.skipped += 1,
                Err(e) => {
                    error!("Error processing {}: {}", display_name(input), e);
                    report.failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Batch complete: {} processed, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Estimate poses on one image and store its output pair.
    pub fn process_single_image(&self, input: &Path) -> Result<FileOutcome> {
        let file_name = display_name(input);
        let names = OutputNames::for_input(&file_name);

        // Arm before the engine runs so its JSON shows up as new.
        let watcher = match names.json {
            Some(_) => Some(SidecarWatcher::arm(&self.json_dir, &self.sidecar)?),
            None => None,
        };

        info!("Processing {}...", file_name);
        let img = match read_image(input) {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    "Could not read image {}: {}. Skipping this image.",
                    input.display(),
                    e
                );
                return Ok(FileOutcome::Unreadable);
            }
        };

        let (frame_name, _) = split_extension(&file_name);
        let output = self.engine.estimate(frame_name, &img)?;

        let image_path = self.images_dir.join(&names.image);
        save_rendered(output.rendered, &image_path)?;
        info!("Saved skeletonized image to {}", image_path.display());

        let json = match (names.json, watcher) {
            (Some(target), Some(watcher)) => {
                let generated = match output.keypoints_json {
                    Some(path) => Some(path),
                    None => watcher.resolve()?,
                };
                match generated {
                    Some(generated) => Some(install_sidecar(&generated, &self.json_dir, &target)?),
                    None => {
                        warn!(
                            "No new JSON file detected in '{}' for '{}'. Skipping rename.",
                            self.json_dir.display(),
                            file_name
                        );
                        None
                    }
                }
            }
            _ => {
                info!(
                    "JSON output for '{}' will use OpenPose default naming (not renamed).",
                    file_name
                );
                None
            }
        };

        Ok(FileOutcome::Processed {
            image: image_path,
            json,
        })
    }
}

/// Regular files directly inside `dir`, in name order.
fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            PoseBatchError::fs(dir, "input directory listing", source)
        })?;
        // Symlinks count when they resolve to a regular file.
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Decode by content rather than by extension.
fn read_image(path: &Path) -> image::ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Save in the format implied by the extension; JPEG has no alpha channel.
fn save_rendered(rendered: DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let rendered = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(rendered.into_rgb8()),
        _ => rendered,
    };
    rendered
        .save_with_format(path, format)
        .map_err(|e| PoseBatchError::ImageProcessing {
            path: path.display().to_string(),
            operation: "rendered image save".to_string(),
            source: Box::new(e),
        })
}
