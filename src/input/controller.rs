// src/input/controller.rs
use log::{debug, info, warn};

use super::candidate::{ImageCandidate, SelectedImage};
use super::clipboard::{pick_pasted_image, ClipboardItem};
use super::preview::{PreviewHandle, PreviewHost};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("'{name}' is not an image (declared type: {media_type})")]
    NotAnImage { name: String, media_type: String },
}

struct Selection {
    image: SelectedImage,
    preview: PreviewHandle,
}

/// Owns the one currently selected image and its preview. Every input
/// channel funnels into [`InputController::submit_candidate`].
pub struct InputController<P: PreviewHost> {
    host: P,
    current: Option<Selection>,
    dragging: bool,
}

impl<P: PreviewHost> InputController<P> {
    pub fn new(host: P) -> Self {
        Self {
            host,
            current: None,
            dragging: false,
        }
    }

    /// Validate and take a candidate. On rejection the current selection is
    /// left exactly as it was.
    pub fn submit_candidate(&mut self, candidate: ImageCandidate) -> Result<(), InputError> {
        if !candidate.is_image() {
            warn!("Rejected '{}' ({})", candidate.name, candidate.media_type);
            return Err(InputError::NotAnImage {
                name: candidate.name,
                media_type: candidate.media_type,
            });
        }

        let image = SelectedImage::from_candidate(candidate);
        let preview = self.host.create_preview(&image);
        info!("Selected '{}' ({})", image.name(), image.media_type());

        if let Some(previous) = self.current.replace(Selection { image, preview }) {
            debug!("Revoking preview {:?} of '{}'", previous.preview, previous.image.name());
            self.host.revoke_preview(previous.preview);
        }
        Ok(())
    }

    /// Drop the selection. Calling it with nothing selected does nothing.
    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            debug!("Revoking preview {:?} of '{}'", previous.preview, previous.image.name());
            self.host.revoke_preview(previous.preview);
            info!("Selection cleared");
        }
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.current.as_ref().map(|s| &s.image)
    }

    pub fn preview(&self) -> Option<PreviewHandle> {
        self.current.as_ref().map(|s| s.preview)
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        if self.dragging != dragging {
            debug!("Drag hover: {}", dragging);
            self.dragging = dragging;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// A drop ends the hover and submits the first dropped file, if any.
    pub fn handle_drop(&mut self, mut files: Vec<ImageCandidate>) -> Option<Result<(), InputError>> {
        self.dragging = false;
        if files.is_empty() {
            return None;
        }
        Some(self.submit_candidate(files.swap_remove(0)))
    }

    /// Paste is left alone while a text field has focus. Otherwise the first
    /// image file on the clipboard is submitted; returns whether one was.
    pub fn handle_paste(&mut self, text_field_focused: bool, items: &[ClipboardItem]) -> bool {
        if text_field_focused {
            return false;
        }
        match pick_pasted_image(items) {
            // The pick guarantees an image/* type, so this cannot be rejected.
            Some(candidate) => self.submit_candidate(candidate).is_ok(),
            None => {
                debug!("Paste ignored: no image on the clipboard");
                false
            }
        }
    }

    pub fn host(&self) -> &P {
        &self.host
    }
}

impl<P: PreviewHost> Drop for InputController<P> {
    fn drop(&mut self) {
        self.clear();
    }
}
