use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{PoseBatchError, Result};

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Rename images to inputImage0.<ext>, inputImage1.<ext>, ...
    Normalize(NormalizeConfig),
    /// Run every image through OpenPose and pair the outputs by index
    Process(ProcessConfig),
    /// Check that the OpenPose executable can be started
    Check(CheckConfig),
}

#[derive(Args, Clone, Debug)]
pub struct NormalizeConfig {
    #[arg(short, long, default_value = "input")]
    pub input_dir: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct CheckConfig {
    #[arg(long, env = "OPENPOSE_BIN", default_value = "openpose.bin")]
    pub openpose_bin: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct ProcessConfig {
    #[arg(short, long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Folder holding the OpenPose model data
    #[arg(short, long, env = "OPENPOSE_MODELS", default_value = "models/")]
    pub model_folder: PathBuf,

    /// Tried when --model-folder is missing or empty
    #[arg(long, default_value = r"C:\openpose\models")]
    pub fallback_model_folder: PathBuf,

    #[arg(long, env = "OPENPOSE_BIN", default_value = "openpose.bin")]
    pub openpose_bin: PathBuf,

    #[command(flatten)]
    pub engine: EngineParams,

    #[command(flatten)]
    pub sidecar: SidecarConfig,
}

/// Detection and rendering parameters handed to OpenPose.
#[derive(Args, Clone, Debug, PartialEq)]
pub struct EngineParams {
    /// Disable face keypoint detection
    #[arg(long = "no-face", action = ArgAction::SetFalse)]
    pub face: bool,

    /// Disable hand keypoint detection
    #[arg(long = "no-hand", action = ArgAction::SetFalse)]
    pub hand: bool,

    #[arg(long, default_value = "BODY_25")]
    pub model_pose: String,

    /// Network input resolution, `<width>x<height>`; -1 keeps the aspect ratio
    #[arg(long, default_value = "656x368", value_parser = check_net_resolution)]
    pub net_resolution: String,

    /// 0 disables rendering, 1 renders on CPU, 2 on GPU
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub render_pose: u8,

    #[arg(long, default_value_t = 0.05)]
    pub render_threshold: f32,

    /// Blending factor of the rendered skeleton
    #[arg(long, default_value_t = 0.6)]
    pub alpha_pose: f32,

    /// Number of scales averaged per frame
    #[arg(long, default_value_t = 4)]
    pub scale_number: u32,

    #[arg(long, default_value_t = 0.25)]
    pub scale_gap: f32,

    /// Disable OpenPose's maximize_positives mode
    #[arg(long = "no-maximize-positives", action = ArgAction::SetFalse)]
    pub maximize_positives: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            face: true,
            hand: true,
            model_pose: "BODY_25".to_string(),
            net_resolution: "656x368".to_string(),
            render_pose: 1,
            render_threshold: 0.05,
            alpha_pose: 0.6,
            scale_number: 4,
            scale_gap: 0.25,
            maximize_positives: true,
        }
    }
}

/// Timing of the JSON sidecar lookup after each engine call.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct SidecarConfig {
    /// Delay before the JSON directory is first re-read, and between re-reads
    #[arg(long, default_value_t = 200)]
    pub json_settle_ms: u64,

    /// Give up on a missing JSON file after this long
    #[arg(long, default_value_t = 2000)]
    pub json_timeout_ms: u64,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            json_settle_ms: 200,
            json_timeout_ms: 2000,
        }
    }
}

impl SidecarConfig {
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.json_settle_ms)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.json_timeout_ms)
    }
}

impl ProcessConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn json_dir(&self) -> PathBuf {
        self.output_dir.join("json")
    }

    /// First usable model folder: the configured one, then the fallback.
    pub fn resolve_model_folder(&self) -> Result<PathBuf> {
        if is_populated_dir(&self.model_folder) {
            return Ok(self.model_folder.clone());
        }
        log::warn!(
            "Models path '{}' not found or empty. Trying fallback path: '{}'",
            self.model_folder.display(),
            self.fallback_model_folder.display()
        );
        if is_populated_dir(&self.fallback_model_folder) {
            return Ok(self.fallback_model_folder.clone());
        }
        Err(PoseBatchError::ModelFolderNotFound {
            primary: self.model_folder.clone(),
            fallback: self.fallback_model_folder.clone(),
        })
    }
}

fn is_populated_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn check_net_resolution(s: &str) -> std::result::Result<String, String> {
    let message = format!("{} is not a resolution. Expected `<width>x<height>`, e.g. 656x368", s);
    let (width, height) = s.split_once('x').ok_or_else(|| message.clone())?;
    for side in [width, height] {
        let value: i32 = side.parse().map_err(|_| message.clone())?;
        if value == 0 || value < -1 {
            return Err(message);
        }
    }
    Ok(s.to_string())
}
