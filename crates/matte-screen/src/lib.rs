#![forbid(unsafe_code)]

//! Screen-space geometry mapping and the marquee fill tool.
//!
//! Everything here is ephemeral per-interaction state: card corners are
//! projected once at the start of a gesture and the whole pipeline
//! (screen point → normalized card offset → pixel coordinate → rect fill)
//! runs without touching the host again.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod geometry;
pub mod marquee;

pub use geometry::{project_corners, screen_to_uv, uv_to_pixel, CardBounds, Projector};
pub use marquee::{MarqueeFill, ModalStatus};
