#![forbid(unsafe_code)]

//! Layer stack: ordered scene objects that carry exactly one material each.
//!
//! The registry is an explicit, injected object — operators receive it rather
//! than re-fetching a collection from global scene state, which keeps every
//! operation testable without a host.
//!
//! Single-threaded host model: materials shared after host-level duplication
//! are represented by `Rc` sharing, and `make_unique` is the escape hatch.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use matte_core::{CoreError, Rgba};
use matte_graph::{Material, StableName};
use matte_image::{ImageStore, SourceKind};

/// A camera-aligned quad with the fixed vertex layout of a once-subdivided
/// plane: four corners first (bottom-left, bottom-right, top-left, top-right),
/// then edge midpoints and center. The screen mapper depends on corner
/// indices 1 and 2.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneCard {
    vertices: Vec<Vec3>,
}

/// Non-uniform scale that matches a card to an image's aspect ratio. The
/// longer image side keeps unit size.
pub fn aspect_scale(width: u32, height: u32) -> Vec2 {
    if width > height {
        Vec2::new(1.0, height as f32 / width as f32)
    } else {
        Vec2::new(width as f32 / height as f32, 1.0)
    }
}

impl PlaneCard {
    /// Build the card in world space. `right`/`up` are the camera's basis
    /// vectors; `scale` is typically [`aspect_scale`] of the source image.
    /// The scale is baked straight into the vertices ("apply scale").
    pub fn camera_aligned(center: Vec3, right: Vec3, up: Vec3, scale: Vec2) -> Self {
        let r = right * scale.x;
        let u = up * scale.y;

        let corner = |sx: f32, sy: f32| center + r * sx + u * sy;
        let vertices = vec![
            corner(-1.0, -1.0), // 0: bottom-left
            corner(1.0, -1.0),  // 1: bottom-right
            corner(-1.0, 1.0),  // 2: top-left
            corner(1.0, 1.0),   // 3: top-right
            corner(0.0, -1.0),  // 4: bottom edge midpoint
            corner(-1.0, 0.0),  // 5: left edge midpoint
            corner(1.0, 0.0),   // 6: right edge midpoint
            corner(0.0, 1.0),   // 7: top edge midpoint
            corner(0.0, 0.0),   // 8: center
        ];
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Corner vertex 2 of the subdivision layout.
    pub fn top_left(&self) -> Vec3 {
        self.vertices[2]
    }

    /// Corner vertex 1 of the subdivision layout.
    pub fn bottom_right(&self) -> Vec3 {
        self.vertices[1]
    }
}

/// One compositing layer: a card, one material, and the host object flags.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub card: PlaneCard,
    pub material: Rc<RefCell<Material>>,
    pub hide_render: bool,
    pub hide_viewport: bool,
    /// Select-protection ("lock" in the panel).
    pub hide_select: bool,
    pub selected: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>, card: PlaneCard, material: Material) -> Self {
        Self {
            name: name.into(),
            card,
            material: Rc::new(RefCell::new(material)),
            hide_render: false,
            hide_viewport: false,
            hide_select: false,
            selected: false,
        }
    }
}

/// Ordered stack of layers. Stack order is push order; the host may reorder
/// between interactions, never during one.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    active: Option<usize>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Push a new layer, select it, make it active. Returns its index.
    pub fn push(&mut self, layer: Layer) -> usize {
        let index = self.layers.len();
        self.layers.push(layer);
        self.select(index);
        index
    }

    /// Clear every selection, select `index`, make it active. Out-of-range
    /// indices (and an empty stack) are a silent no-op.
    pub fn select(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        for layer in &mut self.layers {
            layer.selected = false;
        }
        self.layers[index].selected = true;
        self.active = Some(index);
    }

    /// The last-operated layer; independent of multi-selection.
    pub fn active(&self) -> Option<&Layer> {
        self.active.and_then(|i| self.layers.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Layer> {
        self.active.and_then(|i| self.layers.get_mut(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Render and viewport visibility move together, keyed off the render
    /// flag (a half-toggled layer becomes fully visible again).
    pub fn toggle_visibility(&mut self, index: usize) {
        if let Some(layer) = self.layers.get_mut(index) {
            let show = layer.hide_render;
            layer.hide_render = !show;
            layer.hide_viewport = !show;
        }
    }

    pub fn toggle_lock(&mut self, index: usize) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.hide_select = !layer.hide_select;
        }
    }

    /// Give the layer at `index` its own material and mask after host-level
    /// duplication left it sharing both with a sibling.
    ///
    /// No-ops (returning `false`): the material is not actually shared, or it
    /// lacks a recognizable mask node. On success the copied material gets a
    /// fresh all-white mask sized to its albedo image.
    pub fn make_unique(
        &mut self,
        index: usize,
        store: &mut ImageStore,
    ) -> Result<bool, CoreError> {
        let layer = self
            .layers
            .get_mut(index)
            .ok_or_else(|| CoreError::other("make_unique: layer index out of range"))?;

        if Rc::strong_count(&layer.material) == 1 {
            return Ok(false);
        }

        let mut copy = layer.material.borrow().clone();
        let Some(mask_node) = copy.graph.find_named(StableName::TransparencyMask) else {
            return Ok(false);
        };

        let albedo = copy.albedo_image()?;
        let (width, height) = store.size(albedo)?;
        let fresh_mask = store.alloc(width, height, Rgba::OPAQUE_WHITE, SourceKind::Generated)?;
        copy.graph.bind_image(mask_node, fresh_mask)?;

        layer.material = Rc::new(RefCell::new(copy));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matte_graph::{build_material, mutate};

    fn card() -> PlaneCard {
        PlaneCard::camera_aligned(Vec3::ZERO, Vec3::X, Vec3::Y, Vec2::ONE)
    }

    fn masked_layer(store: &mut ImageStore, name: &str) -> Layer {
        let img = store
            .alloc(4, 4, Rgba::OPAQUE_WHITE, SourceKind::File)
            .unwrap();
        let mask = store
            .alloc(4, 4, Rgba::OPAQUE_WHITE, SourceKind::Generated)
            .unwrap();
        let material = build_material(img, Some(mask), false).unwrap();
        Layer::new(name, card(), material)
    }

    #[test]
    fn aspect_scale_matches_image_shape() {
        assert_eq!(aspect_scale(200, 100), Vec2::new(1.0, 0.5));
        assert_eq!(aspect_scale(100, 200), Vec2::new(0.5, 1.0));
        assert_eq!(aspect_scale(128, 128), Vec2::ONE);
    }

    #[test]
    fn card_corner_indices_follow_subdivision_layout() {
        let c = card();
        assert_eq!(c.vertices().len(), 9);
        assert_eq!(c.top_left(), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(c.bottom_right(), Vec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn select_is_exclusive_and_silent_out_of_range() {
        let mut store = ImageStore::new();
        let mut reg = LayerRegistry::new();
        reg.push(masked_layer(&mut store, "a"));
        reg.push(masked_layer(&mut store, "b"));

        reg.select(0);
        assert!(reg.list()[0].selected);
        assert!(!reg.list()[1].selected);
        assert_eq!(reg.active_index(), Some(0));

        reg.select(7); // no-op
        assert_eq!(reg.active_index(), Some(0));
        assert!(reg.list()[0].selected);
    }

    #[test]
    fn visibility_flags_move_together() {
        let mut store = ImageStore::new();
        let mut reg = LayerRegistry::new();
        reg.push(masked_layer(&mut store, "a"));

        reg.toggle_visibility(0);
        assert!(reg.list()[0].hide_render);
        assert!(reg.list()[0].hide_viewport);

        reg.toggle_visibility(0);
        assert!(!reg.list()[0].hide_render);
        assert!(!reg.list()[0].hide_viewport);
    }

    #[test]
    fn lock_toggles_select_protection() {
        let mut store = ImageStore::new();
        let mut reg = LayerRegistry::new();
        reg.push(masked_layer(&mut store, "a"));

        reg.toggle_lock(0);
        assert!(reg.list()[0].hide_select);
        reg.toggle_lock(0);
        assert!(!reg.list()[0].hide_select);
    }

    #[test]
    fn make_unique_splits_shared_material() {
        let mut store = ImageStore::new();
        let mut reg = LayerRegistry::new();
        let a = masked_layer(&mut store, "a");

        // Host-level duplication: same Rc, independent object flags.
        let mut b = a.clone();
        b.name = "a.001".to_string();
        let ia = reg.push(a);
        let ib = reg.push(b);

        assert!(reg.make_unique(ib, &mut store).unwrap());

        // Mutating A's opacity must leave B untouched.
        {
            let layer_a = &reg.list()[ia];
            mutate::set_opacity(&mut layer_a.material.borrow_mut().graph, 0.3).unwrap();
        }
        let mat_b = reg.list()[ib].material.borrow();
        let opacity_b = mat_b.graph.named(StableName::Opacity).unwrap();
        assert_eq!(mat_b.graph.default_of(opacity_b, "b"), Some(1.0));
        drop(mat_b);

        // And the copy received its own fresh mask.
        let mask_a = reg.list()[ia].material.borrow().mask_image().unwrap();
        let mask_b = reg.list()[ib].material.borrow().mask_image().unwrap();
        assert_ne!(mask_a, mask_b);
        let (w, h) = store.size(mask_b).unwrap();
        assert_eq!((w, h), (4, 4));
    }

    #[test]
    fn make_unique_is_a_noop_on_unshared_material() {
        let mut store = ImageStore::new();
        let mut reg = LayerRegistry::new();
        let i = reg.push(masked_layer(&mut store, "solo"));
        assert!(!reg.make_unique(i, &mut store).unwrap());
    }

    #[test]
    fn make_unique_is_a_noop_without_mask_node() {
        let mut store = ImageStore::new();
        let img = store
            .alloc(4, 4, Rgba::OPAQUE_WHITE, SourceKind::File)
            .unwrap();
        let material = build_material(img, None, false).unwrap();
        let a = Layer::new("plain", card(), material);
        let b = a.clone();

        let mut reg = LayerRegistry::new();
        reg.push(a);
        let ib = reg.push(b);
        assert!(!reg.make_unique(ib, &mut store).unwrap());
    }
}
