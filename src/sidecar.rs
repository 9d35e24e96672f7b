//! Locating and renaming the keypoint JSON the engine writes next to each frame.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::SidecarConfig;
use crate::errors::{PoseBatchError, Result};

/// `*.json` filenames present in a directory at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonSnapshot(BTreeSet<String>);

impl JsonSnapshot {
    pub fn take(dir: &Path) -> Result<Self> {
        let entries =
            fs::read_dir(dir).map_err(|e| PoseBatchError::fs(dir, "JSON directory listing", e))?;

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| PoseBatchError::fs(dir, "JSON directory listing", e))?;
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".json") {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(Self(names))
    }

    /// Names present in `self` but not in `before`.
    pub fn added_since(&self, before: &JsonSnapshot) -> Vec<String> {
        self.0.difference(&before.0).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for JsonSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Watches a JSON directory for the file produced by one engine call.
pub struct SidecarWatcher<'a> {
    dir: &'a Path,
    config: &'a SidecarConfig,
    before: JsonSnapshot,
}

impl<'a> SidecarWatcher<'a> {
    /// Record the directory contents ahead of the engine call.
    pub fn arm(dir: &'a Path, config: &'a SidecarConfig) -> Result<Self> {
        Ok(Self {
            dir,
            config,
            before: JsonSnapshot::take(dir)?,
        })
    }

    /// Wait for new JSON files to show up.
    ///
    /// Re-reads the directory every settle delay until something new appears or the
    /// timeout passes. Files written by anyone else in the meantime are counted too.
    pub fn wait_for_new(&self) -> Result<Vec<String>> {
        let deadline = Instant::now() + self.config.timeout();
        loop {
            thread::sleep(self.config.settle_delay());
            let added = JsonSnapshot::take(self.dir)?.added_since(&self.before);
            if !added.is_empty() || Instant::now() >= deadline {
                return Ok(added);
            }
            debug!("No new JSON in {} yet", self.dir.display());
        }
    }

    /// The single new JSON file, `None` if nothing appeared.
    pub fn resolve(&self) -> Result<Option<PathBuf>> {
        let mut added = self.wait_for_new()?;
        match added.len() {
            0 => Ok(None),
            1 => Ok(added.pop().map(|name| self.dir.join(name))),
            _ => Err(PoseBatchError::AmbiguousSidecar {
                dir: self.dir.to_path_buf(),
                candidates: added,
            }),
        }
    }
}

/// Move `generated` to `dir/target_name`, replacing any file already there.
///
/// The old target is removed before the rename, so the swap is not atomic.
pub fn install_sidecar(generated: &Path, dir: &Path, target_name: &str) -> Result<PathBuf> {
    let target = dir.join(target_name);
    if generated == target {
        debug!("JSON already named '{}'", target_name);
        return Ok(target);
    }

    if target.exists() {
        warn!("'{}' already exists. Overwriting.", target_name);
        fs::remove_file(&target).map_err(|e| PoseBatchError::fs(&target, "JSON removal", e))?;
    }

    fs::rename(generated, &target).map_err(|e| PoseBatchError::fs(generated, "JSON rename", e))?;
    info!(
        "Renamed JSON: '{}' --> '{}'",
        generated
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        target_name
    );
    Ok(target)
}
