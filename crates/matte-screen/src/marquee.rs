//! The marquee fill tool as an explicit finite state machine.
//!
//! The host's modal loop feeds pointer events in; the machine answers with a
//! [`ModalStatus`] telling the loop whether to keep capturing. All geometry
//! and orientation logic lives here so it tests without an event loop.
//!
//! Single-pointer assumption: a second press while dragging is not a defined
//! input and is ignored.

use glam::Vec2;

use matte_core::{BrushConfig, CoreError};
use matte_image::{ImageHandle, ImageStore};

use crate::geometry::{drag_misses, screen_to_uv, uv_to_pixel, CardBounds};

/// What the modal loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStatus {
    /// Keep capturing pointer events.
    Running,
    /// Gesture complete, fill applied.
    Finished,
    /// Gesture discarded: missed the card, degenerate rect, or cancelled.
    Cancelled,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Dragging {
        bounds: CardBounds,
        mask: ImageHandle,
        mask_size: (u32, u32),
        start: Vec2,
        end: Vec2,
    },
}

/// Marquee fill over the active layer's mask image.
#[derive(Debug)]
pub struct MarqueeFill {
    state: State,
}

impl Default for MarqueeFill {
    fn default() -> Self {
        Self::new()
    }
}

impl MarqueeFill {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging { .. })
    }

    /// Begin a gesture: snapshot the card's projected bounds and the target
    /// mask, and record the press point as both ends of the rectangle.
    pub fn on_press(
        &mut self,
        bounds: CardBounds,
        mask: ImageHandle,
        mask_size: (u32, u32),
        at: Vec2,
    ) -> ModalStatus {
        if self.is_dragging() {
            return ModalStatus::Running;
        }
        self.state = State::Dragging {
            bounds,
            mask,
            mask_size,
            start: at,
            end: at,
        };
        ModalStatus::Running
    }

    /// Track the live end point. Feeds the on-screen preview only; pixel
    /// writes happen at release.
    pub fn on_move(&mut self, at: Vec2) -> ModalStatus {
        if let State::Dragging { end, .. } = &mut self.state {
            *end = at;
        }
        ModalStatus::Running
    }

    /// The live rectangle for overlay drawing: start, the two mixed corners,
    /// end. `None` while idle.
    pub fn preview_rect(&self) -> Option<[Vec2; 4]> {
        match &self.state {
            State::Idle => None,
            State::Dragging { start, end, .. } => Some([
                *start,
                Vec2::new(start.x, end.y),
                Vec2::new(end.x, start.y),
                *end,
            ]),
        }
    }

    /// Abort with no mutation.
    pub fn on_cancel(&mut self) -> ModalStatus {
        self.state = State::Idle;
        ModalStatus::Cancelled
    }

    /// Finish the gesture: reject misses, map both corners into mask pixels,
    /// orient/clamp, and fill through the store.
    ///
    /// The fill color is the brush primary unless `use_secondary` (the
    /// modifier key at release time) is set; alpha is the brush strength.
    pub fn on_release(
        &mut self,
        at: Vec2,
        store: &mut ImageStore,
        brush: &BrushConfig,
        use_secondary: bool,
    ) -> Result<ModalStatus, CoreError> {
        let State::Dragging {
            bounds,
            mask,
            mask_size,
            start,
            ..
        } = self.state
        else {
            return Ok(ModalStatus::Cancelled);
        };
        self.state = State::Idle;

        if drag_misses(&bounds, start, at) {
            return Ok(ModalStatus::Cancelled);
        }

        let (width, height) = mask_size;
        let (x1, y1) = uv_to_pixel(screen_to_uv(start, &bounds), width, height);
        let (x2, y2) = uv_to_pixel(screen_to_uv(at, &bounds), width, height);

        let (x0, x1) = orient_axis(x1, x2, width);
        let (y0, y1) = orient_axis(y1, y2, height);
        if x0 >= x1 || y0 >= y1 {
            // Zero-area after clamping: nothing to paint.
            return Ok(ModalStatus::Cancelled);
        }

        let color = brush.fill_color(use_secondary);
        store
            .get_mut(mask)?
            .write_rect(x0 as u32, y0 as u32, x1 as u32, y1 as u32, color)?;
        Ok(ModalStatus::Finished)
    }
}

/// Clamp one axis of the drag to `[0, dim-1]`, direction-aware, then order
/// the pair. Identical fills for all four drag directions.
fn orient_axis(a: i64, b: i64, dim: u32) -> (i64, i64) {
    let hi = dim as i64 - 1;
    let (a, b) = if a < b {
        (a.max(0), b.min(hi))
    } else {
        (a.min(hi), b.max(0))
    };
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matte_core::Rgba;
    use matte_image::SourceKind;

    fn setup() -> (ImageStore, ImageHandle, CardBounds) {
        let mut store = ImageStore::new();
        let mask = store
            .alloc(100, 100, Rgba::OPAQUE_WHITE, SourceKind::Generated)
            .unwrap();
        let bounds = CardBounds {
            top_left: Vec2::new(0.0, 100.0),
            bottom_right: Vec2::new(100.0, 0.0),
        };
        (store, mask, bounds)
    }

    fn drag(
        store: &mut ImageStore,
        mask: ImageHandle,
        bounds: CardBounds,
        from: Vec2,
        to: Vec2,
    ) -> ModalStatus {
        let mut tool = MarqueeFill::new();
        assert_eq!(
            tool.on_press(bounds, mask, (100, 100), from),
            ModalStatus::Running
        );
        assert_eq!(tool.on_move(to), ModalStatus::Running);
        tool.on_release(to, store, &BrushConfig::default(), false)
            .unwrap()
    }

    fn filled_pixels(store: &ImageStore, mask: ImageHandle, color: Rgba) -> Vec<(u32, u32)> {
        let buf = store.get(mask).unwrap();
        let mut out = Vec::new();
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                if buf.pixel(x, y) == Some(color) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn all_four_drag_directions_fill_the_same_rect() {
        let black = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let corners = [
            (Vec2::new(20.0, 20.0), Vec2::new(80.0, 80.0)),
            (Vec2::new(80.0, 80.0), Vec2::new(20.0, 20.0)),
            (Vec2::new(20.0, 80.0), Vec2::new(80.0, 20.0)),
            (Vec2::new(80.0, 20.0), Vec2::new(20.0, 80.0)),
        ];

        let mut reference: Option<Vec<(u32, u32)>> = None;
        for (from, to) in corners {
            let (mut store, mask, bounds) = setup();
            let brush = BrushConfig {
                primary: black,
                ..BrushConfig::default()
            };
            let mut tool = MarqueeFill::new();
            tool.on_press(bounds, mask, (100, 100), from);
            let status = tool.on_release(to, &mut store, &brush, false).unwrap();
            assert_eq!(status, ModalStatus::Finished);

            let filled = filled_pixels(&store, mask, black);
            assert!(
                filled
                    .iter()
                    .all(|&(x, y)| (20..80).contains(&x) && (20..80).contains(&y)),
                "fill must stay inside [20,80)x[20,80)"
            );
            assert_eq!(filled.len(), 60 * 60);

            match &reference {
                None => reference = Some(filled),
                Some(r) => assert_eq!(&filled, r, "direction {from:?}->{to:?} differs"),
            }
        }
    }

    #[test]
    fn out_of_bounds_drag_mutates_nothing() {
        let (mut store, mask, bounds) = setup();
        // Both endpoints left of the card.
        let status = drag(
            &mut store,
            mask,
            bounds,
            Vec2::new(-30.0, 10.0),
            Vec2::new(-5.0, 90.0),
        );
        assert_eq!(status, ModalStatus::Cancelled);
        let buf = store.get(mask).unwrap();
        assert!(buf.read_all().iter().all(|&c| c == 1.0));
    }

    #[test]
    fn straddling_drag_is_clamped_not_rejected() {
        let (mut store, mask, bounds) = setup();
        let brush = BrushConfig {
            primary: Rgba::new(0.0, 0.0, 0.0, 1.0),
            ..BrushConfig::default()
        };
        let mut tool = MarqueeFill::new();
        tool.on_press(bounds, mask, (100, 100), Vec2::new(-20.0, 50.0));
        let status = tool
            .on_release(Vec2::new(50.0, 90.0), &mut store, &brush, false)
            .unwrap();
        assert_eq!(status, ModalStatus::Finished);

        let filled = filled_pixels(&store, mask, brush.fill_color(false));
        assert!(!filled.is_empty());
        assert!(filled.iter().all(|&(x, _)| x < 50));
    }

    #[test]
    fn cancel_discards_without_mutation() {
        let (mut store, mask, bounds) = setup();
        let mut tool = MarqueeFill::new();
        tool.on_press(bounds, mask, (100, 100), Vec2::new(10.0, 10.0));
        tool.on_move(Vec2::new(60.0, 60.0));
        assert_eq!(tool.on_cancel(), ModalStatus::Cancelled);
        assert!(!tool.is_dragging());

        let buf = store.get(mask).unwrap();
        assert!(buf.read_all().iter().all(|&c| c == 1.0));
    }

    #[test]
    fn release_without_press_is_cancelled() {
        let (mut store, _mask, _bounds) = setup();
        let mut tool = MarqueeFill::new();
        let status = tool
            .on_release(
                Vec2::new(10.0, 10.0),
                &mut store,
                &BrushConfig::default(),
                false,
            )
            .unwrap();
        assert_eq!(status, ModalStatus::Cancelled);
    }

    #[test]
    fn second_press_while_dragging_is_ignored() {
        let (_store, mask, bounds) = setup();
        let mut tool = MarqueeFill::new();
        tool.on_press(bounds, mask, (100, 100), Vec2::new(10.0, 10.0));
        tool.on_move(Vec2::new(30.0, 30.0));
        tool.on_press(bounds, mask, (100, 100), Vec2::new(90.0, 90.0));

        // The original gesture is still the live one.
        let rect = tool.preview_rect().unwrap();
        assert_eq!(rect[0], Vec2::new(10.0, 10.0));
        assert_eq!(rect[3], Vec2::new(30.0, 30.0));
    }

    #[test]
    fn preview_mixes_start_and_end_corners() {
        let (_store, mask, bounds) = setup();
        let mut tool = MarqueeFill::new();
        assert!(tool.preview_rect().is_none());

        tool.on_press(bounds, mask, (100, 100), Vec2::new(10.0, 20.0));
        tool.on_move(Vec2::new(70.0, 60.0));
        let rect = tool.preview_rect().unwrap();
        assert_eq!(
            rect,
            [
                Vec2::new(10.0, 20.0),
                Vec2::new(10.0, 60.0),
                Vec2::new(70.0, 20.0),
                Vec2::new(70.0, 60.0),
            ]
        );
    }

    #[test]
    fn secondary_color_fills_on_modifier() {
        let (mut store, mask, bounds) = setup();
        let brush = BrushConfig {
            primary: Rgba::new(1.0, 0.0, 0.0, 1.0),
            secondary: Rgba::new(0.0, 1.0, 0.0, 1.0),
            strength: 0.5,
        };
        let mut tool = MarqueeFill::new();
        tool.on_press(bounds, mask, (100, 100), Vec2::new(40.0, 40.0));
        tool.on_release(Vec2::new(60.0, 60.0), &mut store, &brush, true)
            .unwrap();

        let expect = Rgba::new(0.0, 1.0, 0.0, 0.5);
        assert_eq!(store.get(mask).unwrap().pixel(50, 50), Some(expect));
    }
}
