//! Filename conventions shared by the normalizer and the batch processor.
//!
//! Normalized inputs are named `inputImage<N>.<ext>`; the processor pairs each
//! of them with `outputImage<N>.<ext>` and `outputJSON<N>.json`.

use log::warn;

pub const INPUT_PREFIX: &str = "inputImage";
pub const OUTPUT_IMAGE_PREFIX: &str = "outputImage";
pub const OUTPUT_JSON_PREFIX: &str = "outputJSON";

/// Extensions (with the dot, lower case) the normalizer will rename.
pub const ALLOWED_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".bmp", ".tiff", ".gif"];

/// Split a filename into `(base, ext)` where `ext` keeps its leading dot.
///
/// Leading dots belong to the base, so `.png` has no extension and
/// `archive.tar.gz` splits at the last dot.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(dot) if file_name[..dot].chars().any(|c| c != '.') => {
            (&file_name[..dot], &file_name[dot..])
        }
        _ => (file_name, ""),
    }
}

/// Case-insensitive match against [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Target name for the file at `index` in the sorted listing.
pub fn normalized_name(index: usize, original: &str) -> String {
    let (_, ext) = split_extension(original);
    format!("{}{}{}", INPUT_PREFIX, index, ext.to_lowercase())
}

/// Sequence index of a normalized name as written, e.g. `inputImage03.jpg` -> `"03"`.
///
/// Only plain ASCII digits after the prefix are accepted. The text is kept verbatim
/// so `inputImage3` and `inputImage03` never share output names.
pub fn sequence_index(file_name: &str) -> Option<&str> {
    let (base, _) = split_extension(file_name);
    let digits = base.strip_prefix(INPUT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

/// Output names for one processed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub image: String,
    /// `None` when the input carried no sequence index; the engine's own JSON
    /// name is then left untouched.
    pub json: Option<String>,
}

impl OutputNames {
    pub fn for_input(file_name: &str) -> Self {
        if let Some(index) = sequence_index(file_name) {
            let (_, ext) = split_extension(file_name);
            return Self {
                image: format!("{}{}{}", OUTPUT_IMAGE_PREFIX, index, ext),
                json: Some(format!("{}{}.json", OUTPUT_JSON_PREFIX, index)),
            };
        }

        if split_extension(file_name).0.starts_with(INPUT_PREFIX) {
            warn!(
                "File '{}' seems to follow the {} pattern but its index is not a number. \
                 Using original name for output.",
                file_name, INPUT_PREFIX
            );
        }
        Self {
            image: file_name.to_string(),
            json: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        let cases = vec![
            ("photo.PNG", ("photo", ".PNG")),
            ("archive.tar.gz", ("archive.tar", ".gz")),
            ("noext", ("noext", "")),
            (".png", (".png", "")),
            ("..hidden.jpg", ("..hidden", ".jpg")),
        ];
        for (name, expected) in cases {
            assert_eq!(split_extension(name), expected, "split of {}", name);
        }
    }

    #[test]
    fn test_allowed_extensions() {
        let cases = vec![
            ("a.png", true),
            ("a.JPG", true),
            ("a.jpeg", true),
            ("a.Bmp", true),
            ("a.tiff", true),
            ("a.gif", true),
            ("a.tif", false),
            ("a.webp", false),
            ("a.txt", false),
            ("png", false),
        ];
        for (name, expected) in cases {
            assert_eq!(has_allowed_extension(name), expected, "{}", name);
        }
    }

    #[test]
    fn test_normalized_name_lowercases_extension() {
        assert_eq!(normalized_name(0, "Holiday.JPG"), "inputImage0.jpg");
        assert_eq!(normalized_name(12, "scan.tiff"), "inputImage12.tiff");
    }

    #[test]
    fn test_sequence_index() {
        assert_eq!(sequence_index("inputImage3.jpg"), Some("3"));
        assert_eq!(sequence_index("inputImage0.png"), Some("0"));
        assert_eq!(sequence_index("inputImage03.png"), Some("03"));
        assert_eq!(sequence_index("inputImage42"), Some("42"));
        assert_eq!(
            sequence_index("inputImage123456789012345678901234567890.png"),
            Some("123456789012345678901234567890")
        );
        assert_eq!(sequence_index("inputImage.png"), None);
        assert_eq!(sequence_index("inputImageX.png"), None);
        assert_eq!(sequence_index("inputImage-1.png"), None);
        assert_eq!(sequence_index("photo.png"), None);
    }

    #[test]
    fn test_padded_index_keeps_distinct_names() {
        let plain = OutputNames::for_input("inputImage3.png");
        let padded = OutputNames::for_input("inputImage03.png");
        assert_eq!(padded.image, "outputImage03.png");
        assert_eq!(padded.json.as_deref(), Some("outputJSON03.json"));
        assert_ne!(plain.image, padded.image);
        assert_ne!(plain.json, padded.json);
    }

    #[test]
    fn test_non_numeric_index_falls_back() {
        let names = OutputNames::for_input("inputImageX.png");
        assert_eq!(names.image, "inputImageX.png");
        assert_eq!(names.json, None);
    }

    #[test]
    fn test_output_names_with_index() {
        let names = OutputNames::for_input("inputImage3.jpg");
        assert_eq!(names.image, "outputImage3.jpg");
        assert_eq!(names.json.as_deref(), Some("outputJSON3.json"));
    }

    #[test]
    fn test_output_names_fallback() {
        let names = OutputNames::for_input("photo.png");
        assert_eq!(names.image, "photo.png");
        assert_eq!(names.json, None);
    }
}
