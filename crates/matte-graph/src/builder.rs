//! Construction of the fixed per-layer material topology.
//!
//! One builder, one canonical topology. Historical variants of the mask path
//! (plain invert-to-opacity, mask-through-invert, mask-multiplied-with-
//! original-alpha) collapsed into the most complete one:
//!
//! ```text
//! coord ─┬──────────────► overlay.a
//!        └► noise ──────► overlay.b      overlay.out ─► albedo.uv (+ mask.uv)
//!
//! albedo ─► curves ─► HSV ─► {emission | principled} ─► mix.b
//! transparent ───────────────────────────────────────► mix.a
//! mask ─► invert(muted) ─► combineoriginalalpha(muted) ─► opacity ─► mix.fac
//! mix ─► material_output
//! ```
//!
//! Without a mask image the albedo's own alpha feeds the invert node and the
//! `transparency_mask`/`combineoriginalalpha` nodes are not created.

use matte_core::CoreError;
use matte_image::ImageHandle;

use crate::{BlendMode, Graph, MathOp, NodeKind, StableName};

/// UV-jitter noise scale; effectively invisible until blur is raised.
const NOISE_SCALE: f32 = 1_000_000.0;

/// A layer's material: exactly one shader graph, owned exclusively by one
/// layer (until host-level duplication shares it; see the registry's
/// `make_unique`).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub graph: Graph,
}

impl Material {
    /// The source image bound to the `albedo` node.
    pub fn albedo_image(&self) -> Result<ImageHandle, CoreError> {
        let albedo = self.graph.named(StableName::Albedo)?;
        self.graph
            .image_of(albedo)
            .ok_or_else(|| CoreError::other("albedo node has no image bound"))
    }

    /// The mask image, if this material was built with one.
    pub fn mask_image(&self) -> Option<ImageHandle> {
        let mask = self.graph.find_named(StableName::TransparencyMask)?;
        self.graph.image_of(mask)
    }

    pub fn has_mask(&self) -> bool {
        self.graph.find_named(StableName::TransparencyMask).is_some()
    }
}

/// Build the complete material graph for one layer.
///
/// `mask` selects the mask-path variant; `use_pbr` substitutes a principled
/// shading stage for the emission stage. Mutation operators work unchanged
/// regardless of `use_pbr`.
pub fn build_material(
    image: ImageHandle,
    mask: Option<ImageHandle>,
    use_pbr: bool,
) -> Result<Material, CoreError> {
    let mut g = Graph::new();

    // UV jitter path. These stay anonymous: the only consumer is the blur
    // setter, which reaches them through the albedo's uv input.
    let coord = g.add_node(NodeKind::TexCoord);
    let noise = g.add_node(NodeKind::NoiseTex);
    let overlay = g.add_node(NodeKind::MixColor(BlendMode::Overlay));
    g.set_default(noise, "scale", NOISE_SCALE)?;
    g.set_default(overlay, "fac", 0.0)?;
    g.connect_named(coord, "uv", noise, "vector")?;
    g.connect_named(coord, "uv", overlay, "a")?;
    g.connect_named(noise, "fac", overlay, "b")?;

    // Color-grade chain.
    let albedo = g.add_node(NodeKind::TexImage);
    g.label(albedo, StableName::Albedo)?;
    g.bind_image(albedo, image)?;
    g.connect_named(overlay, "out", albedo, "uv")?;

    let curves = g.add_node(NodeKind::RgbCurves);
    g.label(curves, StableName::Curves)?;
    let hsv = g.add_node(NodeKind::HueSat);
    g.label(hsv, StableName::Hsv)?;
    g.set_default(hsv, "hue", 0.5)?;
    g.set_default(hsv, "saturation", 1.0)?;
    g.set_default(hsv, "value", 1.0)?;
    g.connect_named(albedo, "color", curves, "color")?;
    g.connect_named(curves, "out", hsv, "color")?;

    // Shading stage: emission by default, principled on request. The stage is
    // a pure substitution; everything upstream and downstream is identical.
    let color_stage = if use_pbr {
        let principled = g.add_node(NodeKind::Principled);
        let bump = g.add_node(NodeKind::Bump);
        g.connect_named(hsv, "out", principled, "base_color")?;
        g.connect_named(hsv, "out", principled, "roughness")?;
        g.connect_named(hsv, "out", principled, "specular")?;
        g.connect_named(hsv, "out", bump, "height")?;
        g.connect_named(bump, "normal", principled, "normal")?;
        principled
    } else {
        let emission = g.add_node(NodeKind::Emission);
        g.set_default(emission, "strength", 1.0)?;
        g.connect_named(hsv, "out", emission, "color")?;
        emission
    };

    let transparent = g.add_node(NodeKind::TransparentBsdf);
    let mix = g.add_node(NodeKind::MixShader);
    g.label(mix, StableName::Mix)?;
    g.connect_named(transparent, "out", mix, "a")?;
    g.connect_named(color_stage, "out", mix, "b")?;

    let output = g.add_node(NodeKind::MaterialOutput);
    g.label(output, StableName::MaterialOutput)?;
    g.connect_named(mix, "out", output, "surface")?;

    // Opacity/alpha path. Multiplying by the opacity scalar keeps the mask
    // signal and the layer opacity independent.
    let invert = g.add_node(NodeKind::Invert);
    g.label(invert, StableName::Invert)?;
    g.set_mute(invert, true)?;

    let opacity = g.add_node(NodeKind::Math(MathOp::Multiply));
    g.label(opacity, StableName::Opacity)?;
    g.set_default(opacity, "b", 1.0)?;
    g.connect_named(opacity, "out", mix, "fac")?;

    match mask {
        Some(mask_image) => {
            let mask_tex = g.add_node(NodeKind::TexImage);
            g.label(mask_tex, StableName::TransparencyMask)?;
            g.bind_image(mask_tex, mask_image)?;
            g.connect_named(overlay, "out", mask_tex, "uv")?;
            g.connect_named(mask_tex, "color", invert, "color")?;

            let combine = g.add_node(NodeKind::Math(MathOp::Multiply));
            g.label(combine, StableName::CombineOriginalAlpha)?;
            g.set_mute(combine, true)?;
            g.set_default(combine, "b", 1.0)?;
            g.connect_named(invert, "out", combine, "a")?;
            g.connect_named(combine, "out", opacity, "a")?;
        }
        None => {
            // No separate mask: the image's own alpha channel governs
            // transparency, and the alpha-blend stage has nothing to combine.
            g.connect_named(albedo, "alpha", invert, "color")?;
            g.connect_named(invert, "out", opacity, "a")?;
        }
    }

    g.validate()?;
    Ok(Material { graph: g })
}
