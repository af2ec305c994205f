//! The session: one store, one layer stack, one brush, one modal tool.

use std::path::Path;

use glam::Vec2;
use tracing::warn;

use matte_core::{BrushConfig, CoreError, Rgba};
use matte_graph::{build_material, mutate, StableName};
use matte_image::{ImageStore, SourceKind};
use matte_layers::{aspect_scale, Layer, LayerRegistry};
use matte_screen::{project_corners, MarqueeFill, ModalStatus, Projector};

use crate::host::{HostPurge, ImageIo, LoadedImage, PlaneFactory};

/// Outcome of a user-facing operator. Mirrors the host's operator return
/// contract: finished, or cancelled with a warning already reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Finished,
    Cancelled,
}

/// Everything one editing session owns. Constructed by the host integration
/// and passed into operators explicitly; there is no global registry.
#[derive(Debug)]
pub struct Session {
    pub store: ImageStore,
    pub layers: LayerRegistry,
    pub brush: BrushConfig,
    /// Principled shading for newly imported layers.
    pub use_pbr: bool,
    marquee: MarqueeFill,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(BrushConfig::default())
    }
}

impl Session {
    pub fn new(brush: BrushConfig) -> Self {
        Self {
            store: ImageStore::new(),
            layers: LayerRegistry::new(),
            brush,
            use_pbr: false,
            marquee: MarqueeFill::new(),
        }
    }

    /// Warning + cancelled, never a propagated error.
    fn cancelled(op: &'static str, err: &CoreError) -> OpStatus {
        warn!(op, error = %err, "operator cancelled");
        OpStatus::Cancelled
    }

    // ---- Layer creation ----

    /// Import an image file as a new masked layer.
    pub fn import_file(
        &mut self,
        io: &mut impl ImageIo,
        planes: &mut impl PlaneFactory,
        path: &Path,
    ) -> OpStatus {
        let loaded = match io.load_file(path) {
            Ok(img) => img,
            Err(e) => return Self::cancelled("import_file", &e),
        };
        match self.add_layer(planes, loaded) {
            Ok(()) => OpStatus::Finished,
            Err(e) => Self::cancelled("import_file", &e),
        }
    }

    /// Paste the host clipboard as a new masked layer.
    pub fn paste_image(
        &mut self,
        io: &mut impl ImageIo,
        planes: &mut impl PlaneFactory,
    ) -> OpStatus {
        let loaded = match io.load_clipboard() {
            Ok(img) => img,
            Err(e) => return Self::cancelled("paste_image", &e),
        };
        match self.add_layer(planes, loaded) {
            Ok(()) => OpStatus::Finished,
            Err(e) => Self::cancelled("paste_image", &e),
        }
    }

    /// Create an empty paint layer: transparent black source, opaque mask.
    pub fn new_empty_layer(
        &mut self,
        planes: &mut impl PlaneFactory,
        width: u32,
        height: u32,
    ) -> OpStatus {
        let result = (|| {
            let pixels = matte_image::PixelBuffer::new(width, height, Rgba::TRANSPARENT_BLACK)?;
            self.add_layer(
                planes,
                LoadedImage {
                    name: format!("paint_{width}x{height}"),
                    pixels,
                    source: SourceKind::Generated,
                },
            )
        })();
        match result {
            Ok(()) => OpStatus::Finished,
            Err(e) => Self::cancelled("new_empty_layer", &e),
        }
    }

    fn add_layer(
        &mut self,
        planes: &mut impl PlaneFactory,
        loaded: LoadedImage,
    ) -> Result<(), CoreError> {
        let width = loaded.pixels.width();
        let height = loaded.pixels.height();

        let image = self.store.insert(loaded.pixels, loaded.source);
        let mask = self
            .store
            .alloc(width, height, Rgba::OPAQUE_WHITE, SourceKind::Generated)?;

        let material = build_material(image, Some(mask), self.use_pbr)?;
        let card = planes.create_card(&loaded.name, aspect_scale(width, height))?;
        self.layers.push(Layer::new(loaded.name, card, material));
        Ok(())
    }

    // ---- Stack operators ----

    pub fn layer_select(&mut self, index: usize) -> OpStatus {
        self.layers.select(index);
        OpStatus::Finished
    }

    pub fn layer_visibility(&mut self, index: usize) -> OpStatus {
        self.layers.toggle_visibility(index);
        OpStatus::Finished
    }

    pub fn layer_lock(&mut self, index: usize) -> OpStatus {
        self.layers.toggle_lock(index);
        OpStatus::Finished
    }

    fn with_layer_graph(
        &mut self,
        index: usize,
        op: &'static str,
        f: impl FnOnce(&mut matte_graph::Graph) -> Result<(), CoreError>,
    ) -> OpStatus {
        let Some(layer) = self.layers.list().get(index) else {
            return Self::cancelled(op, &CoreError::other("layer index out of range"));
        };
        let mut material = layer.material.borrow_mut();
        match f(&mut material.graph) {
            Ok(()) => OpStatus::Finished,
            Err(e) => Self::cancelled(op, &e),
        }
    }

    pub fn layer_invert_mask(&mut self, index: usize) -> OpStatus {
        self.with_layer_graph(index, "layer_invert_mask", |g| {
            mutate::toggle_mask_invert(g).map(|_| ())
        })
    }

    /// Route the mask signal straight to the material output (and back).
    pub fn layer_show_mask(&mut self, index: usize) -> OpStatus {
        self.with_layer_graph(index, "layer_show_mask", |g| {
            mutate::toggle_show_mask(g).map(|_| ())
        })
    }

    /// Multiply the source image's own alpha into the mask signal (and back).
    pub fn layer_blend_alpha(&mut self, index: usize) -> OpStatus {
        self.with_layer_graph(index, "layer_blend_alpha", |g| {
            mutate::toggle_blend_original_alpha(g).map(|_| ())
        })
    }

    // ---- Active-layer mutations (what the grade panel drives) ----

    fn with_active_graph(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut matte_graph::Graph) -> Result<(), CoreError>,
    ) -> OpStatus {
        let Some(layer) = self.layers.active() else {
            return Self::cancelled(op, &CoreError::other("no active layer"));
        };
        let mut material = layer.material.borrow_mut();
        match f(&mut material.graph) {
            Ok(()) => OpStatus::Finished,
            Err(e) => Self::cancelled(op, &e),
        }
    }

    pub fn toggle_curves(&mut self) -> OpStatus {
        self.with_active_graph("toggle_curves", |g| mutate::toggle_curves(g).map(|_| ()))
    }

    pub fn toggle_hue_sat(&mut self) -> OpStatus {
        self.with_active_graph("toggle_hue_sat", |g| mutate::toggle_hue_sat(g).map(|_| ()))
    }

    pub fn set_opacity(&mut self, value: f32) -> OpStatus {
        self.with_active_graph("set_opacity", |g| mutate::set_opacity(g, value))
    }

    pub fn set_blur(&mut self, value: f32) -> OpStatus {
        self.with_active_graph("set_blur", |g| mutate::set_blur(g, value))
    }

    pub fn set_hue(&mut self, value: f32) -> OpStatus {
        self.with_active_graph("set_hue", |g| mutate::set_hue(g, value))
    }

    pub fn set_saturation(&mut self, value: f32) -> OpStatus {
        self.with_active_graph("set_saturation", |g| mutate::set_saturation(g, value))
    }

    pub fn set_value(&mut self, value: f32) -> OpStatus {
        self.with_active_graph("set_value", |g| mutate::set_value(g, value))
    }

    /// Split the active layer off a shared material (post-duplication).
    pub fn make_unique(&mut self) -> OpStatus {
        let Some(index) = self.layers.active_index() else {
            return Self::cancelled("make_unique", &CoreError::other("no active layer"));
        };
        match self.layers.make_unique(index, &mut self.store) {
            Ok(_copied) => OpStatus::Finished,
            Err(e) => Self::cancelled("make_unique", &e),
        }
    }

    // ---- File management ----

    /// Save every image mutated since its last save. Nothing dirty, or any
    /// underlying save failure, is a warning + cancelled, never fatal.
    pub fn save_all_images(&mut self, io: &mut impl ImageIo) -> OpStatus {
        let dirty = self.store.dirty_handles();
        if dirty.is_empty() {
            return Self::cancelled("save_all_images", &CoreError::other("no modified images"));
        }

        for handle in dirty {
            let result = (|| {
                let pixels = self.store.get(handle)?;
                io.save(handle, pixels)?;
                self.store.mark_saved(handle)
            })();
            if let Err(e) = result {
                return Self::cancelled("save_all_images", &e);
            }
        }
        OpStatus::Finished
    }

    pub fn clear_unused(&mut self, purge: &mut impl HostPurge) -> OpStatus {
        match purge.purge_orphans() {
            Ok(_removed) => OpStatus::Finished,
            Err(e) => Self::cancelled("clear_unused", &e),
        }
    }

    // ---- Marquee fill (modal) ----

    /// Begin a marquee gesture over the active layer's mask.
    ///
    /// Preconditions (warning + cancelled): an active layer exists and its
    /// material carries a `transparency_mask` node.
    pub fn marquee_press(&mut self, projector: &impl Projector, at: Vec2) -> ModalStatus {
        let snapshot = (|| {
            let layer = self
                .layers
                .active()
                .ok_or_else(|| CoreError::other("no active layer"))?;
            let material = layer.material.borrow();
            let mask = material.mask_image().ok_or(CoreError::MaskRequired)?;
            let size = self.store.size(mask)?;
            let bounds = project_corners(&layer.card, projector);
            Ok::<_, CoreError>((bounds, mask, size))
        })();

        match snapshot {
            Ok((bounds, mask, size)) => self.marquee.on_press(bounds, mask, size, at),
            Err(e) => {
                Self::cancelled("marquee_fill", &e);
                ModalStatus::Cancelled
            }
        }
    }

    pub fn marquee_move(&mut self, at: Vec2) -> ModalStatus {
        self.marquee.on_move(at)
    }

    /// The live rectangle for the host's overlay drawing.
    pub fn marquee_preview(&self) -> Option<[Vec2; 4]> {
        self.marquee.preview_rect()
    }

    pub fn marquee_release(&mut self, at: Vec2, use_secondary: bool) -> ModalStatus {
        let Session {
            store,
            brush,
            marquee,
            ..
        } = self;
        match marquee.on_release(at, store, brush, use_secondary) {
            Ok(status) => status,
            Err(e) => {
                Self::cancelled("marquee_fill", &e);
                ModalStatus::Cancelled
            }
        }
    }

    pub fn marquee_cancel(&mut self) -> ModalStatus {
        self.marquee.on_cancel()
    }

    /// Mask-invert state of a layer, as the layers panel displays it.
    pub fn invert_muted(&self, index: usize) -> Option<bool> {
        let layer = self.layers.list().get(index)?;
        let material = layer.material.borrow();
        let invert = material.graph.find_named(StableName::Invert)?;
        material.graph.is_muted(invert).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use matte_image::{ImageHandle, PixelBuffer};
    use matte_layers::PlaneCard;
    use std::path::PathBuf;

    /// Fake host: hands out fixed-size images and counts saves.
    #[derive(Default)]
    struct FakeIo {
        saved: Vec<ImageHandle>,
        fail_saves: bool,
        clipboard_empty: bool,
    }

    impl ImageIo for FakeIo {
        fn load_file(&mut self, path: &Path) -> Result<LoadedImage, CoreError> {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            Ok(LoadedImage {
                name,
                pixels: PixelBuffer::new(200, 100, Rgba::new(0.5, 0.5, 0.5, 1.0))?,
                source: SourceKind::File,
            })
        }

        fn load_clipboard(&mut self) -> Result<LoadedImage, CoreError> {
            if self.clipboard_empty {
                return Err(CoreError::other("clipboard holds no image"));
            }
            Ok(LoadedImage {
                name: "pasted".to_string(),
                pixels: PixelBuffer::new(64, 64, Rgba::new(0.1, 0.2, 0.3, 1.0))?,
                source: SourceKind::Generated,
            })
        }

        fn save(
            &mut self,
            handle: ImageHandle,
            _pixels: &PixelBuffer,
        ) -> Result<(), CoreError> {
            if self.fail_saves {
                return Err(CoreError::other("disk full"));
            }
            self.saved.push(handle);
            Ok(())
        }
    }

    struct FakePlanes;

    impl PlaneFactory for FakePlanes {
        fn create_card(&mut self, _name: &str, scale: Vec2) -> Result<PlaneCard, CoreError> {
            Ok(PlaneCard::camera_aligned(Vec3::ZERO, Vec3::X, Vec3::Y, scale))
        }
    }

    fn import(session: &mut Session) {
        let mut io = FakeIo::default();
        let status = session.import_file(&mut io, &mut FakePlanes, &PathBuf::from("bg.png"));
        assert_eq!(status, OpStatus::Finished);
    }

    #[test]
    fn import_builds_a_selected_masked_layer() {
        let mut session = Session::default();
        import(&mut session);

        assert_eq!(session.layers.len(), 1);
        let layer = session.layers.active().expect("import selects the layer");
        assert_eq!(layer.name, "bg");
        assert!(layer.selected);

        let material = layer.material.borrow();
        assert!(material.has_mask());
        let mask = material.mask_image().unwrap();
        let buf = session.store.get(mask).unwrap();
        assert_eq!((buf.width(), buf.height()), (200, 100));
        assert!(buf.read_all().iter().all(|&c| c == 1.0));
    }

    #[test]
    fn paste_failure_is_cancelled_not_fatal() {
        let mut session = Session::default();
        let mut io = FakeIo {
            clipboard_empty: true,
            ..FakeIo::default()
        };
        let status = session.paste_image(&mut io, &mut FakePlanes);
        assert_eq!(status, OpStatus::Cancelled);
        assert!(session.layers.is_empty());
    }

    #[test]
    fn new_empty_layer_rejects_zero_size() {
        let mut session = Session::default();
        assert_eq!(
            session.new_empty_layer(&mut FakePlanes, 0, 32),
            OpStatus::Cancelled
        );
        assert_eq!(
            session.new_empty_layer(&mut FakePlanes, 32, 32),
            OpStatus::Finished
        );
    }

    #[test]
    fn grade_operators_need_an_active_layer() {
        let mut session = Session::default();
        assert_eq!(session.set_opacity(0.5), OpStatus::Cancelled);

        import(&mut session);
        assert_eq!(session.set_opacity(0.5), OpStatus::Finished);
        assert_eq!(session.toggle_curves(), OpStatus::Finished);
        assert_eq!(session.layer_show_mask(0), OpStatus::Finished);
        assert_eq!(session.layer_blend_alpha(0), OpStatus::Finished);
        assert_eq!(session.layer_show_mask(3), OpStatus::Cancelled);
    }

    #[test]
    fn invert_state_is_visible_to_the_panel() {
        let mut session = Session::default();
        import(&mut session);

        assert_eq!(session.invert_muted(0), Some(true));
        assert_eq!(session.layer_invert_mask(0), OpStatus::Finished);
        assert_eq!(session.invert_muted(0), Some(false));
        assert_eq!(session.invert_muted(5), None);
    }

    #[test]
    fn save_all_reports_nothing_to_save() {
        let mut session = Session::default();
        import(&mut session);

        let mut io = FakeIo::default();
        // Freshly imported images are clean; the all-white mask too.
        assert_eq!(session.save_all_images(&mut io), OpStatus::Cancelled);
        assert!(io.saved.is_empty());
    }

    #[test]
    fn save_all_saves_dirty_then_marks_clean() {
        let mut session = Session::default();
        import(&mut session);

        let mask = session
            .layers
            .active()
            .unwrap()
            .material
            .borrow()
            .mask_image()
            .unwrap();
        session
            .store
            .get_mut(mask)
            .unwrap()
            .write_rect(0, 0, 10, 10, Rgba::TRANSPARENT_BLACK)
            .unwrap();

        let mut io = FakeIo::default();
        assert_eq!(session.save_all_images(&mut io), OpStatus::Finished);
        assert_eq!(io.saved, vec![mask]);

        // Second save has nothing left to do.
        assert_eq!(session.save_all_images(&mut io), OpStatus::Cancelled);
    }

    #[test]
    fn save_failure_is_a_warning_not_a_panic() {
        let mut session = Session::default();
        import(&mut session);
        let mask = session
            .layers
            .active()
            .unwrap()
            .material
            .borrow()
            .mask_image()
            .unwrap();
        session
            .store
            .get_mut(mask)
            .unwrap()
            .write_rect(0, 0, 1, 1, Rgba::TRANSPARENT_BLACK)
            .unwrap();

        let mut io = FakeIo {
            fail_saves: true,
            ..FakeIo::default()
        };
        assert_eq!(session.save_all_images(&mut io), OpStatus::Cancelled);
    }

    #[test]
    fn marquee_press_requires_active_layer() {
        let mut session = Session::default();
        let project = |w: Vec3| Vec2::new(w.x, w.y);
        assert_eq!(
            session.marquee_press(&project, Vec2::new(0.0, 0.0)),
            ModalStatus::Cancelled
        );
    }

    #[test]
    fn marquee_gesture_end_to_end() {
        let mut session = Session::default();
        import(&mut session); // 200x100 source, card scale (1, 0.5)

        // Screen occupies x:[0,200], y:[50,150] for the scaled card.
        let project = |w: Vec3| Vec2::new(w.x * 100.0 + 100.0, w.y * 100.0 + 100.0);

        let status = session.marquee_press(&project, Vec2::new(50.0, 75.0));
        assert_eq!(status, ModalStatus::Running);
        session.marquee_move(Vec2::new(150.0, 125.0));
        assert!(session.marquee_preview().is_some());

        session.brush.primary = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let status = session.marquee_release(Vec2::new(150.0, 125.0), false);
        assert_eq!(status, ModalStatus::Finished);

        let mask = session
            .layers
            .active()
            .unwrap()
            .material
            .borrow()
            .mask_image()
            .unwrap();
        let buf = session.store.get(mask).unwrap();
        let black = Rgba::new(0.0, 0.0, 0.0, 1.0);
        // Drag covered the middle half of the card in both axes.
        assert_eq!(buf.pixel(100, 50), Some(black));
        assert_eq!(buf.pixel(40, 20), Some(Rgba::OPAQUE_WHITE));
    }
}
