// src/input/clipboard.rs
use std::path::PathBuf;
use url::Url;

use super::candidate::ImageCandidate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardItemKind {
    File,
    Text,
}

/// One entry on the clipboard as the paste channel sees it.
#[derive(Clone, Debug)]
pub struct ClipboardItem {
    pub kind: ClipboardItemKind,
    pub media_type: String,
    pub candidate: Option<ImageCandidate>,
}

impl ClipboardItem {
    pub fn file(candidate: ImageCandidate) -> Self {
        Self {
            kind: ClipboardItemKind::File,
            media_type: candidate.media_type.clone(),
            candidate: Some(candidate),
        }
    }

    pub fn text() -> Self {
        Self {
            kind: ClipboardItemKind::Text,
            media_type: "text/plain".to_string(),
            candidate: None,
        }
    }
}

/// First file item whose type is `image/*`. Anything else on the clipboard
/// is ignored without complaint.
pub fn pick_pasted_image(items: &[ClipboardItem]) -> Option<ImageCandidate> {
    items
        .iter()
        .filter(|item| item.kind == ClipboardItemKind::File)
        .filter(|item| item.media_type.to_ascii_lowercase().starts_with("image/"))
        .find_map(|item| item.candidate.clone())
}

/// File managers put copied files on the clipboard as text: one path or
/// `file://` URI per line. Lines naming existing files become file items,
/// everything else is plain text.
pub fn items_from_text(text: &str) -> Vec<ClipboardItem> {
    let mut items = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match path_from_line(line) {
            Some(path) if path.is_file() => items.push(ClipboardItem::file(ImageCandidate::from_path(path))),
            _ => items.push(ClipboardItem::text()),
        }
    }
    items
}

fn path_from_line(line: &str) -> Option<PathBuf> {
    match Url::parse(line) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        _ => Some(PathBuf::from(line)),
    }
}

/// Read whatever is on the system clipboard right now.
#[cfg(feature = "clipboard")]
pub fn read_system_clipboard() -> Vec<ClipboardItem> {
    use arboard::Clipboard;
    use log::{debug, warn};

    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            warn!("Failed to access clipboard: {}", e);
            return Vec::new();
        }
    };

    let mut items = Vec::new();
    if let Ok(bitmap) = clipboard.get_image() {
        match encode_bitmap_as_png(bitmap.width as u32, bitmap.height as u32, bitmap.bytes.into_owned()) {
            Ok(png) => items.push(ClipboardItem::file(ImageCandidate::from_bytes("pasted.png", "image/png", png))),
            Err(e) => warn!("Clipboard image could not be encoded: {}", e),
        }
    }
    if let Ok(text) = clipboard.get_text() {
        items.extend(items_from_text(&text));
    }
    debug!("Clipboard holds {} item(s)", items.len());
    items
}

#[cfg(not(feature = "clipboard"))]
pub fn read_system_clipboard() -> Vec<ClipboardItem> {
    Vec::new()
}

/// Put text on the system clipboard.
pub fn write_system_clipboard_text(text: &str) -> anyhow::Result<()> {
    #[cfg(feature = "clipboard")]
    {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
        Ok(())
    }
    #[cfg(not(feature = "clipboard"))]
    {
        let _ = text;
        Err(anyhow::anyhow!(
            "Clipboard feature not enabled. Enable the 'clipboard' feature in Cargo.toml"
        ))
    }
}

#[cfg(feature = "clipboard")]
fn encode_bitmap_as_png(width: u32, height: u32, rgba: Vec<u8>) -> anyhow::Result<Vec<u8>> {
    let buffer = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow::anyhow!("Failed to create image from raw data"))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(buffer)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_item(name: &str) -> ClipboardItem {
        ClipboardItem::file(ImageCandidate::from_bytes(name, "image/png", vec![0u8; 4]))
    }

    #[test]
    fn test_pick_first_image_file() {
        let items = vec![ClipboardItem::text(), image_item("first"), image_item("second")];
        let picked = pick_pasted_image(&items).unwrap();
        assert_eq!(picked.name, "first");
    }

    #[test]
    fn test_non_image_file_is_skipped() {
        let pdf = ClipboardItem::file(ImageCandidate::from_bytes("doc.pdf", "application/pdf", vec![1u8]));
        let items = vec![pdf, image_item("eq")];
        assert_eq!(pick_pasted_image(&items).unwrap().name, "eq");
    }

    #[test]
    fn test_nothing_qualifies() {
        let pdf = ClipboardItem::file(ImageCandidate::from_bytes("doc.pdf", "application/pdf", vec![1u8]));
        assert!(pick_pasted_image(&[ClipboardItem::text(), pdf]).is_none());
        assert!(pick_pasted_image(&[]).is_none());
    }

    #[test]
    fn test_text_lines_naming_files_become_file_items() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("my eq.png");
        std::fs::write(&png, b"png").unwrap();
        let uri = format!("file://{}", png.display().to_string().replace(' ', "%20"));

        let items = items_from_text(&format!("hello world\n{}\n", uri));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ClipboardItemKind::Text);
        assert_eq!(items[1].kind, ClipboardItemKind::File);
        assert_eq!(items[1].media_type, "image/png");

        let picked = pick_pasted_image(&items).unwrap();
        assert_eq!(picked.name, "my eq.png");
    }

    #[test]
    fn test_missing_paths_stay_text() {
        let items = items_from_text("/definitely/not/here.png");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ClipboardItemKind::Text);
    }

    #[test]
    #[cfg(unix)]
    fn test_localhost_file_uri_is_absolute() {
        assert_eq!(path_from_line("file://localhost/tmp/eq.png"), Some(PathBuf::from("/tmp/eq.png")));
        assert_eq!(path_from_line("file:///tmp/my%20eq.png"), Some(PathBuf::from("/tmp/my eq.png")));
    }

    #[test]
    #[cfg(unix)]
    fn test_malformed_escapes_are_kept_verbatim() {
        assert_eq!(path_from_line("file:///tmp/a%+1b.png"), Some(PathBuf::from("/tmp/a%+1b.png")));
        assert_eq!(path_from_line("file:///tmp/100%zz.png"), Some(PathBuf::from("/tmp/100%zz.png")));
    }

    #[test]
    fn test_plain_lines_are_taken_as_paths() {
        assert_eq!(path_from_line("notes about x^2"), Some(PathBuf::from("notes about x^2")));
        assert_eq!(
            path_from_line("https://example.com/eq.png"),
            Some(PathBuf::from("https://example.com/eq.png"))
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_pasted_localhost_uri_picks_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("eq.png");
        std::fs::write(&png, b"png").unwrap();

        let items = items_from_text(&format!("file://localhost{}", png.display()));
        assert_eq!(pick_pasted_image(&items).unwrap().name, "eq.png");
    }
}
