#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod color;
pub mod config;
pub mod error;

// ---- Stable re-exports (only items confirmed to exist) ----
pub use error::CoreError;

pub use color::Rgba;

// Config / JSON utilities: re-export the functions, not guesses about them.
pub use config::{load_brush_config_from, parse_brush_config, BrushConfig};
