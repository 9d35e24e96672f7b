use crate::errors::{PoseBatchError, Result};
use crate::traits::{PoseEstimator, PoseOutput};
use image::DynamicImage;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

/// How the mock engine treats the JSON directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockJson {
    /// Write `<frame>_keypoints.json` and report its path.
    Reported,
    /// Write `<frame>_keypoints.json` without reporting it.
    Unreported,
    /// Write nothing.
    Missing,
    /// Write two files without reporting either.
    Duplicate,
}

/// Test engine: returns the input unchanged and writes JSON like OpenPose does.
#[derive(Debug)]
pub struct MockPoseEstimator {
    json_dir: PathBuf,
    json: MockJson,
    fail_on: Option<String>,
    calls: Cell<usize>,
}

impl MockPoseEstimator {
    pub fn new(json_dir: &Path, json: MockJson) -> Self {
        Self {
            json_dir: json_dir.to_path_buf(),
            json,
            fail_on: None,
            calls: Cell::new(0),
        }
    }

    /// Fail every call whose frame name equals `frame_name`.
    pub fn failing_on(mut self, frame_name: &str) -> Self {
        self.fail_on = Some(frame_name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn write_json(&self, name: &str) -> Result<PathBuf> {
        let path = self.json_dir.join(name);
        fs::write(&path, br#"{"version":1.3,"people":[]}"#)
            .map_err(|e| PoseBatchError::fs(&path, "mock JSON write", e))?;
        Ok(path)
    }
}

impl PoseEstimator for MockPoseEstimator {
    fn estimate(&self, frame_name: &str, image: &DynamicImage) -> Result<PoseOutput> {
        self.calls.set(self.calls.get() + 1);

        if self.fail_on.as_deref() == Some(frame_name) {
            return Err(PoseBatchError::engine("pose estimation", "mock failure"));
        }

        let keypoints = format!("{}_keypoints.json", frame_name);
        let keypoints_json = match self.json {
            MockJson::Reported => Some(self.write_json(&keypoints)?),
            MockJson::Unreported => {
                self.write_json(&keypoints)?;
                None
            }
            MockJson::Missing => None,
            MockJson::Duplicate => {
                self.write_json(&keypoints)?;
                self.write_json(&format!("{}_extra.json", frame_name))?;
                None
            }
        };

        Ok(PoseOutput {
            rendered: image.clone(),
            keypoints_json,
        })
    }

    fn version(&self) -> Result<String> {
        Ok("mock 1.7.0".to_string())
    }
}
