use std::fs;
use std::path::Path;

use log::{error, info, warn};
use walkdir::WalkDir;

use crate::errors::{PoseBatchError, Result};
use crate::naming::{has_allowed_extension, normalized_name};

/// Counts from one normalization run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Files with a recognized image extension.
    pub found: usize,
    pub renamed: usize,
    pub already_named: usize,
    /// Skipped because the target name was taken by another file.
    pub collisions: usize,
    pub failed: usize,
}

/// Rename every recognized image in `input_dir` to `inputImage<N>.<ext>`.
///
/// Indices follow the lexicographic order of the original names. Renames are not
/// transactional: a failure is logged and the run moves on to the next file.
pub fn normalize_directory(input_dir: &Path) -> Result<NormalizeReport> {
    info!("Normalizing filenames in directory: {}", input_dir.display());

    if !input_dir.is_dir() {
        return Err(PoseBatchError::fs(
            input_dir,
            "input directory lookup",
            std::io::Error::new(std::io::ErrorKind::NotFound, "input directory not found"),
        ));
    }

    let image_files = collect_image_names(input_dir)?;
    let mut report = NormalizeReport {
        found: image_files.len(),
        ..Default::default()
    };

    for (index, old_name) in image_files.iter().enumerate() {
        let new_name = normalized_name(index, old_name);

        if *old_name == new_name {
            info!("Skipping '{}', already correctly named.", old_name);
            report.already_named += 1;
            continue;
        }

        let old_path = input_dir.join(old_name);
        let new_path = input_dir.join(&new_name);

        if new_path.exists() {
            warn!(
                "'{}' already exists. Skipping renaming of '{}'.",
                new_name, old_name
            );
            report.collisions += 1;
            continue;
        }

        match fs::rename(&old_path, &new_path) {
            Ok(()) => {
                info!("Renamed: '{}' -> '{}'", old_name, new_name);
                report.renamed += 1;
            }
            Err(e) => {
                error!("Error renaming '{}' to '{}': {}", old_name, new_name, e);
                report.failed += 1;
            }
        }
    }

    if report.found == 0 {
        info!("No files found.");
    } else {
        info!("Normalization complete. {} files renamed.", report.renamed);
    }

    Ok(report)
}

/// Recognized image filenames directly inside `dir`, sorted by codepoint.
fn collect_image_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            PoseBatchError::fs(dir, "directory listing", source)
        })?;

        // Symlinks count when they resolve to a regular file.
        if !entry.path().is_file() {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) if has_allowed_extension(name) => names.push(name.to_string()),
            Some(_) => {}
            None => warn!("Skipping non UTF-8 filename {:?}", entry.file_name()),
        }
    }

    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_collect_sorts_and_filters() -> Result<()> {
        let temp_dir = TempDir::new()?;
        for name in ["b.png", "A.JPG", "notes.txt", "a.gif"] {
            touch(temp_dir.path(), name);
        }
        fs::create_dir(temp_dir.path().join("dir.png"))?;

        let names = collect_image_names(temp_dir.path())?;
        assert_eq!(names, vec!["A.JPG", "a.gif", "b.png"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_image_is_renamed() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let source_dir = temp_dir.path().join("source");
        let input_dir = temp_dir.path().join("input");
        fs::create_dir(&source_dir)?;
        fs::create_dir(&input_dir)?;
        touch(&source_dir, "real.png");
        std::os::unix::fs::symlink(source_dir.join("real.png"), input_dir.join("photo.png"))?;

        let report = normalize_directory(&input_dir)?;
        assert_eq!(report.found, 1);
        assert_eq!(report.renamed, 1);
        assert_eq!(listing(&input_dir), vec!["inputImage0.png"]);
        assert_eq!(fs::read_to_string(input_dir.join("inputImage0.png"))?, "real.png");
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = normalize_directory(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(PoseBatchError::FileSystem { .. })));
    }

    #[test]
    fn test_contents_follow_renames() -> Result<()> {
        let temp_dir = TempDir::new()?;
        touch(temp_dir.path(), "zebra.png");
        touch(temp_dir.path(), "apple.jpeg");

        let report = normalize_directory(temp_dir.path())?;
        assert_eq!(report.renamed, 2);
        assert_eq!(
            listing(temp_dir.path()),
            vec!["inputImage0.jpeg", "inputImage1.png"]
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("inputImage0.jpeg"))?,
            "apple.jpeg"
        );
        Ok(())
    }

    #[test]
    fn test_empty_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        touch(temp_dir.path(), "readme.md");

        let report = normalize_directory(temp_dir.path())?;
        assert_eq!(report, NormalizeReport::default());
        Ok(())
    }
}
