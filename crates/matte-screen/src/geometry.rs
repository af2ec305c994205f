//! 3D card corners → 2D viewport coordinates → normalized offsets → pixels.

use glam::{Vec2, Vec3};

use matte_layers::PlaneCard;

/// Host capability: project a world position into 2D viewport coordinates
/// for the active camera and region.
pub trait Projector {
    fn project(&self, world: Vec3) -> Vec2;
}

impl<F: Fn(Vec3) -> Vec2> Projector for F {
    fn project(&self, world: Vec3) -> Vec2 {
        self(world)
    }
}

/// Screen-space extent of a layer's card, captured at gesture start.
///
/// Viewport convention: y grows upward, so `top_left.y > bottom_right.y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBounds {
    pub top_left: Vec2,
    pub bottom_right: Vec2,
}

impl CardBounds {
    pub fn width_2d(&self) -> f32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height_2d(&self) -> f32 {
        self.top_left.y - self.bottom_right.y
    }
}

/// Project the two opposite corner vertices of the card (indices fixed by
/// the subdivision layout) into viewport space.
pub fn project_corners(card: &PlaneCard, projector: &impl Projector) -> CardBounds {
    CardBounds {
        top_left: projector.project(card.top_left()),
        bottom_right: projector.project(card.bottom_right()),
    }
}

/// Normalized offset of a screen point within the card: (0,0) at the card's
/// bottom-left, (1,1) at its top-right. Points outside the card map outside
/// `[0,1]`; callers clamp in pixel space.
pub fn screen_to_uv(point: Vec2, bounds: &CardBounds) -> Vec2 {
    Vec2::new(
        (point.x - bounds.top_left.x) / bounds.width_2d(),
        (point.y - bounds.bottom_right.y) / bounds.height_2d(),
    )
}

/// Integer truncation of a normalized offset against the image dimensions.
/// Returns signed coordinates so out-of-card offsets survive to the clamping
/// step instead of wrapping.
pub fn uv_to_pixel(uv: Vec2, width: u32, height: u32) -> (i64, i64) {
    ((uv.x * width as f32) as i64, (uv.y * height as f32) as i64)
}

/// A drag misses the card when both endpoints sit outside the same edge.
/// Straddling drags are kept and clamped later.
pub fn drag_misses(bounds: &CardBounds, a: Vec2, b: Vec2) -> bool {
    if a.x < bounds.top_left.x && b.x < bounds.top_left.x {
        return true;
    }
    if a.x > bounds.bottom_right.x && b.x > bounds.bottom_right.x {
        return true;
    }
    if a.y < bounds.bottom_right.y && b.y < bounds.bottom_right.y {
        return true;
    }
    if a.y > bounds.top_left.y && b.y > bounds.top_left.y {
        return true;
    }
    false
}
