pub mod check;
pub mod config;
pub mod errors;
pub mod mocks;
pub mod naming;
pub mod normalize;
pub mod openpose;
pub mod processor;
pub mod sidecar;
pub mod traits;

pub use config::{Cli, Command, ProcessConfig};
pub use errors::{PoseBatchError, Result};
pub use normalize::{normalize_directory, NormalizeReport};
pub use openpose::OpenPoseEngine;
pub use processor::{BatchProcessor, BatchReport, FileOutcome};
pub use traits::*;
