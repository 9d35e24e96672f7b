use crate::errors::Result;
use image::DynamicImage;
use std::path::PathBuf;

/// Result of one engine call.
#[derive(Debug, Clone)]
pub struct PoseOutput {
    /// Input image with the detected skeletons drawn on it.
    pub rendered: DynamicImage,
    /// Keypoint JSON written by the engine, when it can tell where it went.
    /// `None` makes the caller fall back to watching the JSON directory.
    pub keypoints_json: Option<PathBuf>,
}

/// Abstraction over the pose estimation engine.
///
/// The engine writes its keypoint JSON into its configured output directory on its
/// own; callers only see the rendered frame and, optionally, the JSON path.
pub trait PoseEstimator {
    /// Estimate poses on `image`. `frame_name` is the name the engine may use for
    /// the artifacts it writes itself.
    fn estimate(&self, frame_name: &str, image: &DynamicImage) -> Result<PoseOutput>;

    /// Version string reported by the engine.
    fn version(&self) -> Result<String>;
}
