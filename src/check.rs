use log::{error, info};

use crate::errors::Result;
use crate::traits::PoseEstimator;

/// Ask the engine for its version and log the outcome.
pub fn check_engine<E: PoseEstimator>(engine: &E) -> Result<String> {
    match engine.version() {
        Ok(version) => {
            info!("OpenPose working. version: {}", version);
            Ok(version)
        }
        Err(e) => {
            error!("FAILED to start OpenPose: {}", e);
            Err(e)
        }
    }
}
