// src/input/candidate.rs
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a candidate live. File candidates are only read when
/// a conversion actually needs them.
#[derive(Clone, Debug)]
pub enum ImageSource {
    Bytes(Arc<[u8]>),
    File(PathBuf),
}

/// A file-like input from any channel (picker, drop, paste) with a declared
/// media type. Nothing about it has been validated yet.
#[derive(Clone, Debug)]
pub struct ImageCandidate {
    pub name: String,
    pub media_type: String,
    pub source: ImageSource,
}

impl ImageCandidate {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_path(&path).to_string();
        debug!("Candidate from path {} ({})", path.display(), media_type);
        Self {
            name,
            media_type,
            source: ImageSource::File(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            source: ImageSource::Bytes(bytes.into()),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// A candidate that passed validation. Immutable once built; the controller
/// replaces it wholesale rather than editing it.
#[derive(Clone, Debug)]
pub struct SelectedImage {
    name: String,
    media_type: String,
    source: ImageSource,
}

impl SelectedImage {
    pub(crate) fn from_candidate(candidate: ImageCandidate) -> Self {
        Self {
            name: candidate.name,
            media_type: candidate.media_type,
            source: candidate.source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Get the raw bytes, hitting the disk for file-backed images.
    pub fn read_bytes(&self) -> io::Result<Arc<[u8]>> {
        match &self.source {
            ImageSource::Bytes(bytes) => Ok(Arc::clone(bytes)),
            ImageSource::File(path) => Ok(std::fs::read(path)?.into()),
        }
    }
}

/// Declared media type for a file, going by its extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "svg" => "image/svg+xml",
        "txt" | "md" | "tex" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(media_type_for_path(Path::new("eq.PNG")), "image/png");
        assert_eq!(media_type_for_path(Path::new("/tmp/eq.jpeg")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(media_type_for_path(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn test_candidate_from_path_uses_file_name() {
        let candidate = ImageCandidate::from_path("/some/dir/integral.webp");
        assert_eq!(candidate.name, "integral.webp");
        assert_eq!(candidate.media_type, "image/webp");
        assert!(candidate.is_image());
    }

    #[test]
    fn test_is_image_checks_prefix_only() {
        let image = ImageCandidate::from_bytes("a", "image/whatever", vec![1u8]);
        let text = ImageCandidate::from_bytes("b", "text/plain", vec![1u8]);
        let empty = ImageCandidate::from_bytes("c", "", vec![1u8]);
        assert!(image.is_image());
        assert!(!text.is_image());
        assert!(!empty.is_image());
    }

    #[test]
    fn test_read_bytes_from_file() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"not really a png").unwrap();
        let selected = SelectedImage::from_candidate(ImageCandidate::from_path(file.path()));
        assert_eq!(&*selected.read_bytes().unwrap(), b"not really a png");
    }

    #[test]
    fn test_read_bytes_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.png");
        let selected = SelectedImage::from_candidate(ImageCandidate::from_path(missing));
        assert!(selected.read_bytes().is_err());
    }
}
