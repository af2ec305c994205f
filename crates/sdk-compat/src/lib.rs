//! Compile-only compatibility crate.
//!
//! This crate exists to ensure the public SDK surface remains usable by third-party
//! consumers. It is not shipped or run; it must only build.

use glam::{Vec2, Vec3};
use matte_core::{BrushConfig, Rgba};
use matte_graph::{build_material, mutate, Graph, NodeKind, StableName};
use matte_image::{ImageHandle, ImageStore, PixelBuffer, SourceKind};
use matte_layers::{aspect_scale, Layer, LayerRegistry, PlaneCard};
use matte_ops::{OpStatus, Session};
use matte_screen::{project_corners, screen_to_uv, uv_to_pixel, MarqueeFill, ModalStatus};

#[allow(dead_code)]
pub fn _compile_witness() {
    // Graph wiring stays usable through public APIs alone.
    let mut g = Graph::new();
    let coord = g.add_node(NodeKind::TexCoord);
    let tex = g.add_node(NodeKind::TexImage);
    let _ = g.connect_named(coord, "uv", tex, "uv");
    let _ = g.find_named(StableName::Albedo);

    // Canonical material construction and mutation must remain callable.
    let image = ImageHandle(0);
    if let Ok(mut material) = build_material(image, None, false) {
        let _ = mutate::set_opacity(&mut material.graph, 0.5);
        let _ = material.has_mask();
    }

    // Store, buffers, and the pixel contract.
    let mut store = ImageStore::new();
    if let Ok(buf) = PixelBuffer::new(4, 4, Rgba::OPAQUE_WHITE) {
        let handle = store.insert(buf, SourceKind::Generated);
        let _ = store.size(handle);
    }

    // Layer stack and screen mapping remain constructible without a host.
    let card = PlaneCard::camera_aligned(Vec3::ZERO, Vec3::X, Vec3::Y, aspect_scale(16, 9));
    let project = |w: Vec3| Vec2::new(w.x, w.y);
    let bounds = project_corners(&card, &project);
    let _ = uv_to_pixel(screen_to_uv(Vec2::ZERO, &bounds), 16, 9);

    let mut layers = LayerRegistry::new();
    if let Ok(material) = build_material(image, None, false) {
        layers.push(Layer::new("witness", card, material));
    }

    // Session and modal surfaces. Avoid `Default` here: the SDK surface may
    // prefer explicit constructors.
    let session = Session::new(BrushConfig::default());
    let _ = (session, MarqueeFill::new(), ModalStatus::Running, OpStatus::Finished);
}
