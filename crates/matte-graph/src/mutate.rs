//! Idempotent, named mutations against a built material graph.
//!
//! Every operation locates its nodes through [`StableName`] lookup and either
//! flips a mute flag, writes an input default, or performs a small fixed
//! rewire. A missing stable name means the builder and this module drifted
//! apart; that surfaces as [`CoreError::NodeNotFound`] rather than being
//! papered over.
//!
//! The three mask-path toggles require a `transparency_mask` node and return
//! [`CoreError::MaskRequired`] on materials built without one. The operator
//! layer downgrades that to a user-visible warning.

use matte_core::CoreError;

use crate::{Graph, StableName};

/// Which target the opacity signal currently feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowMaskState {
    /// Normal compositing: `opacity → mix.fac`, `mix → material_output`.
    Normal,
    /// Debug visualization: `opacity → material_output` directly.
    MaskVisible,
}

fn require_mask(graph: &Graph) -> Result<(), CoreError> {
    if graph.find_named(StableName::TransparencyMask).is_none() {
        return Err(CoreError::MaskRequired);
    }
    Ok(())
}

/// Flip the invert node's mute flag. Self-inverse.
pub fn toggle_mask_invert(graph: &mut Graph) -> Result<bool, CoreError> {
    require_mask(graph)?;
    let invert = graph.named(StableName::Invert)?;
    let muted = graph.is_muted(invert)?;
    graph.set_mute(invert, !muted)?;
    Ok(!muted)
}

/// Read the current show-mask wiring without changing it.
pub fn show_mask_state(graph: &Graph) -> Result<ShowMaskState, CoreError> {
    let output = graph.named(StableName::MaterialOutput)?;
    let mix = graph.named(StableName::Mix)?;
    match graph.input_source(output, "surface") {
        Some(src) if src.node == mix => Ok(ShowMaskState::Normal),
        Some(_) => Ok(ShowMaskState::MaskVisible),
        None => Err(CoreError::other("material output has no driver")),
    }
}

/// Two-state topology switch between normal compositing and routing the
/// opacity signal straight to the material output. Toggling twice restores
/// the exact prior edge set.
pub fn toggle_show_mask(graph: &mut Graph) -> Result<ShowMaskState, CoreError> {
    require_mask(graph)?;
    let output = graph.named(StableName::MaterialOutput)?;
    let mix = graph.named(StableName::Mix)?;
    let opacity = graph.named(StableName::Opacity)?;

    match show_mask_state(graph)? {
        ShowMaskState::Normal => {
            graph.disconnect_input(output, "surface")?;
            graph.disconnect_input(mix, "fac")?;
            graph.connect_named(opacity, "out", output, "surface")?;
            Ok(ShowMaskState::MaskVisible)
        }
        ShowMaskState::MaskVisible => {
            graph.disconnect_input(output, "surface")?;
            graph.connect_named(opacity, "out", mix, "fac")?;
            graph.connect_named(mix, "out", output, "surface")?;
            Ok(ShowMaskState::Normal)
        }
    }
}

/// Flip the original-alpha blend stage. While active, the albedo's alpha
/// output multiplies into the mask signal; the wire only exists while the
/// stage is unmuted.
pub fn toggle_blend_original_alpha(graph: &mut Graph) -> Result<bool, CoreError> {
    require_mask(graph)?;
    let combine = graph.named(StableName::CombineOriginalAlpha)?;
    let albedo = graph.named(StableName::Albedo)?;

    if graph.is_muted(combine)? {
        graph.set_mute(combine, false)?;
        graph.connect_named(albedo, "alpha", combine, "b")?;
        Ok(true)
    } else {
        graph.set_mute(combine, true)?;
        graph.disconnect_input(combine, "b")?;
        Ok(false)
    }
}

/// Enable/disable the curves stage. No topology change.
pub fn toggle_curves(graph: &mut Graph) -> Result<bool, CoreError> {
    let curves = graph.named(StableName::Curves)?;
    let muted = graph.is_muted(curves)?;
    graph.set_mute(curves, !muted)?;
    Ok(!muted)
}

/// Enable/disable the hue/saturation stage. No topology change.
pub fn toggle_hue_sat(graph: &mut Graph) -> Result<bool, CoreError> {
    let hsv = graph.named(StableName::Hsv)?;
    let muted = graph.is_muted(hsv)?;
    graph.set_mute(hsv, !muted)?;
    Ok(!muted)
}

// Parameter writes. Values are taken as-is: the renderer clamps, matching the
// host's own permissive numeric widgets.

pub fn set_opacity(graph: &mut Graph, value: f32) -> Result<(), CoreError> {
    let opacity = graph.named(StableName::Opacity)?;
    graph.set_default(opacity, "b", value)
}

/// Blur strength is the factor of the anonymous UV-jitter blend feeding the
/// albedo's uv input; it is reached by walking that edge, not by name.
pub fn set_blur(graph: &mut Graph, value: f32) -> Result<(), CoreError> {
    let albedo = graph.named(StableName::Albedo)?;
    let overlay = graph
        .input_source(albedo, "uv")
        .ok_or_else(|| CoreError::other("albedo uv input has no driver"))?
        .node;
    graph.set_default(overlay, "fac", value)
}

pub fn set_hue(graph: &mut Graph, value: f32) -> Result<(), CoreError> {
    let hsv = graph.named(StableName::Hsv)?;
    graph.set_default(hsv, "hue", value)
}

pub fn set_saturation(graph: &mut Graph, value: f32) -> Result<(), CoreError> {
    let hsv = graph.named(StableName::Hsv)?;
    graph.set_default(hsv, "saturation", value)
}

pub fn set_value(graph: &mut Graph, value: f32) -> Result<(), CoreError> {
    let hsv = graph.named(StableName::Hsv)?;
    graph.set_default(hsv, "value", value)
}
