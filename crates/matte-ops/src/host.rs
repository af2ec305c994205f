//! Host capability contracts.
//!
//! The scene graph, image codecs, and data-block management belong to the
//! host; operators reach them only through these traits, so the whole
//! operator surface runs against fakes in tests.

use std::path::Path;

use glam::Vec2;

use matte_core::CoreError;
use matte_image::{ImageHandle, PixelBuffer, SourceKind};
use matte_layers::PlaneCard;

/// An image the host has already decoded for us.
#[derive(Debug)]
pub struct LoadedImage {
    pub name: String,
    pub pixels: PixelBuffer,
    pub source: SourceKind,
}

/// Image loading and saving. Codecs and file browsers stay host-side.
pub trait ImageIo {
    fn load_file(&mut self, path: &Path) -> Result<LoadedImage, CoreError>;

    fn load_clipboard(&mut self) -> Result<LoadedImage, CoreError>;

    /// Persist a modified image back to wherever the host keeps it.
    fn save(&mut self, handle: ImageHandle, pixels: &PixelBuffer) -> Result<(), CoreError>;
}

/// Creation of camera-aligned card meshes.
///
/// The host owns plane primitives, subdivision, and transform-apply; the
/// returned card must already have the aspect scale baked into its vertices.
pub trait PlaneFactory {
    fn create_card(&mut self, name: &str, scale: Vec2) -> Result<PlaneCard, CoreError>;
}

/// Purge of unlinked host data-blocks (the "clear unused" button).
pub trait HostPurge {
    /// Returns how many blocks were removed.
    fn purge_orphans(&mut self) -> Result<usize, CoreError>;
}
