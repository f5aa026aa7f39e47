// src/input/preview.rs
use super::candidate::SelectedImage;

/// Opaque id for a preview created by a [`PreviewHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle(pub u64);

/// Something that can render a selected image without re-reading it.
/// Every handle returned by `create_preview` gets passed to
/// `revoke_preview` exactly once by the controller.
pub trait PreviewHost {
    fn create_preview(&mut self, image: &SelectedImage) -> PreviewHandle;
    fn revoke_preview(&mut self, handle: PreviewHandle);
}

/// Preview host for runs without a window.
#[derive(Default)]
pub struct HeadlessPreview {
    next_id: u64,
}

impl PreviewHost for HeadlessPreview {
    fn create_preview(&mut self, _image: &SelectedImage) -> PreviewHandle {
        self.next_id += 1;
        PreviewHandle(self.next_id)
    }

    fn revoke_preview(&mut self, _handle: PreviewHandle) {}
}
