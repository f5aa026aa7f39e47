pub mod candidate;
pub mod clipboard;
pub mod controller;
pub mod preview;

pub use candidate::{ImageCandidate, SelectedImage};
pub use controller::InputController;
pub use preview::{HeadlessPreview, PreviewHandle, PreviewHost};
