use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{DynamicImage, ImageFormat};
use log::debug;
use tempfile::TempDir;

use crate::config::EngineParams;
use crate::errors::{PoseBatchError, Result};
use crate::traits::{PoseEstimator, PoseOutput};

/// OpenPose driven through its demo executable, one frame per invocation.
pub struct OpenPoseEngine {
    binary: PathBuf,
    model_folder: PathBuf,
    json_dir: PathBuf,
    params: EngineParams,
}

impl OpenPoseEngine {
    /// Engine that writes keypoint JSON into `json_dir`.
    pub fn new(binary: &Path, model_folder: &Path, json_dir: &Path, params: EngineParams) -> Self {
        Self {
            binary: binary.to_path_buf(),
            model_folder: model_folder.to_path_buf(),
            json_dir: json_dir.to_path_buf(),
            params,
        }
    }

    /// Engine used only to query the executable, e.g. for `check`.
    pub fn probe(binary: &Path) -> Self {
        Self::new(binary, Path::new(""), Path::new(""), EngineParams::default())
    }

    /// Command line for one run over the frames in `image_dir`.
    pub fn command_args(&self, image_dir: &Path, rendered_dir: &Path) -> Vec<OsString> {
        let p = &self.params;
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |flag: &str, value: OsString| {
            args.push(format!("--{}", flag).into());
            args.push(value);
        };

        push("image_dir", image_dir.into());
        push("model_folder", self.model_folder.as_os_str().to_owned());
        push("write_json", self.json_dir.as_os_str().to_owned());
        push("write_images", rendered_dir.into());
        push("write_images_format", "png".into());
        push("model_pose", p.model_pose.as_str().into());
        push("net_resolution", p.net_resolution.as_str().into());
        push("render_pose", p.render_pose.to_string().into());
        push("render_threshold", p.render_threshold.to_string().into());
        push("alpha_pose", p.alpha_pose.to_string().into());
        push("scale_number", p.scale_number.to_string().into());
        push("scale_gap", p.scale_gap.to_string().into());
        push("display", "0".into());

        // gflags booleans only take a value in `--flag=value` form.
        for (flag, on) in [
            ("face", p.face),
            ("hand", p.hand),
            ("maximize_positives", p.maximize_positives),
        ] {
            args.push(format!("--{}={}", flag, on).into());
        }

        args
    }

    fn run(&self, args: &[OsString], operation: &str) -> Result<Output> {
        debug!("Running {} {:?}", self.binary.display(), args);
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| {
                PoseBatchError::engine(operation, format!("{}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PoseBatchError::engine(
                operation,
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }
        Ok(output)
    }
}

impl PoseEstimator for OpenPoseEngine {
    fn estimate(&self, frame_name: &str, image: &DynamicImage) -> Result<PoseOutput> {
        let staging = TempDir::new()
            .map_err(|e| PoseBatchError::fs(std::env::temp_dir(), "staging directory", e))?;
        let image_dir = staging.path().join("frames");
        let rendered_dir = staging.path().join("rendered");
        for dir in [&image_dir, &rendered_dir] {
            fs::create_dir(dir).map_err(|e| PoseBatchError::fs(dir, "staging directory", e))?;
        }

        let staged = image_dir.join(format!("{}.png", frame_name));
        image
            .save_with_format(&staged, ImageFormat::Png)
            .map_err(|e| PoseBatchError::ImageProcessing {
                path: staged.display().to_string(),
                operation: "frame staging".to_string(),
                source: Box::new(e),
            })?;

        self.run(&self.command_args(&image_dir, &rendered_dir), "pose estimation")?;

        let rendered_path = rendered_dir.join(format!("{}_rendered.png", frame_name));
        let rendered = image::open(&rendered_path).map_err(|e| PoseBatchError::ImageProcessing {
            path: rendered_path.display().to_string(),
            operation: "rendered frame read".to_string(),
            source: Box::new(e),
        })?;

        let keypoints = self.json_dir.join(format!("{}_keypoints.json", frame_name));
        Ok(PoseOutput {
            rendered,
            keypoints_json: keypoints.is_file().then_some(keypoints),
        })
    }

    fn version(&self) -> Result<String> {
        let output = self.run(&["--version".into()], "version query")?;
        let text = String::from_utf8_lossy(&output.stdout);
        let version = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| PoseBatchError::engine("version query", "empty version output"))?;
        Ok(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> OpenPoseEngine {
        OpenPoseEngine::new(
            Path::new("openpose.bin"),
            Path::new("models"),
            Path::new("output/json"),
            EngineParams::default(),
        )
    }

    fn flag_value<'a>(args: &'a [OsString], flag: &str) -> Option<&'a OsString> {
        let flag = format!("--{}", flag);
        args.iter()
            .position(|a| a.to_str() == Some(flag.as_str()))
            .and_then(|i| args.get(i + 1))
    }

    #[test]
    fn test_command_args_carry_params() {
        let args = engine().command_args(Path::new("/tmp/frames"), Path::new("/tmp/rendered"));

        let expected = vec![
            ("image_dir", "/tmp/frames"),
            ("write_images", "/tmp/rendered"),
            ("write_json", "output/json"),
            ("model_folder", "models"),
            ("model_pose", "BODY_25"),
            ("net_resolution", "656x368"),
            ("render_pose", "1"),
            ("render_threshold", "0.05"),
            ("alpha_pose", "0.6"),
            ("scale_number", "4"),
            ("scale_gap", "0.25"),
            ("display", "0"),
        ];
        for (flag, value) in expected {
            assert_eq!(
                flag_value(&args, flag).and_then(|v| v.to_str()),
                Some(value),
                "flag {}",
                flag
            );
        }
        for flag in ["--face=true", "--hand=true", "--maximize_positives=true"] {
            assert!(args.iter().any(|a| a.to_str() == Some(flag)), "{}", flag);
        }
    }

    #[test]
    fn test_disabled_booleans_use_joined_form() {
        let params = EngineParams {
            face: false,
            hand: false,
            maximize_positives: false,
            ..EngineParams::default()
        };
        let engine = OpenPoseEngine::new(
            Path::new("openpose.bin"),
            Path::new("models"),
            Path::new("output/json"),
            params,
        );
        let args = engine.command_args(Path::new("/tmp/frames"), Path::new("/tmp/rendered"));
        let args: Vec<_> = args.iter().filter_map(|a| a.to_str()).collect();

        for flag in ["--face=false", "--hand=false", "--maximize_positives=false"] {
            assert!(args.contains(&flag), "missing {}", flag);
        }
        assert!(!args.contains(&"false"));
        assert!(!args.contains(&"--face"));
    }

    #[test]
    fn test_missing_binary_is_engine_error() {
        let engine = OpenPoseEngine::probe(Path::new("/nonexistent/openpose.bin"));
        assert!(matches!(
            engine.version(),
            Err(PoseBatchError::Engine { .. })
        ));
    }
}
