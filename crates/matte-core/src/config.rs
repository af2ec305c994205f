//! Brush configuration loaded from JSON.
//!
//! The marquee fill tool reads its fill color from here: primary unless the
//! modifier key selects secondary, alpha taken from `strength`. Defaults match
//! a fresh paint brush (white foreground, black background, full strength).

use std::path::Path;

use serde::Deserialize;

use crate::color::Rgba;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushConfig {
    pub primary: Rgba,
    pub secondary: Rgba,
    /// Written into the alpha channel of every filled pixel.
    pub strength: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            primary: Rgba::new(1.0, 1.0, 1.0, 1.0),
            secondary: Rgba::new(0.0, 0.0, 0.0, 1.0),
            strength: 1.0,
        }
    }
}

impl BrushConfig {
    /// The fill color the marquee writes: RGB from the selected brush color,
    /// alpha from the brush strength.
    pub fn fill_color(&self, use_secondary: bool) -> Rgba {
        let c = if use_secondary {
            self.secondary
        } else {
            self.primary
        };
        Rgba::new(c.r, c.g, c.b, self.strength)
    }
}

// JSON shape is kept local so `Rgba` does not have to commit to a serde form.
#[derive(Deserialize)]
struct JsonBrush {
    primary: [f32; 3],
    secondary: [f32; 3],
    strength: f32,
}

/// Parse a brush config from JSON text. `path` is only used for error context.
pub fn parse_brush_config(path: &Path, text: &str) -> Result<BrushConfig, CoreError> {
    let raw: JsonBrush = serde_json::from_str(text).map_err(|source| CoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    for (name, chans) in [("primary", raw.primary), ("secondary", raw.secondary)] {
        if chans.iter().any(|c| !c.is_finite()) {
            return Err(CoreError::InvalidConfig {
                path: path.to_path_buf(),
                msg: format!("brush color '{name}' has a non-finite channel"),
            });
        }
    }
    if !raw.strength.is_finite() {
        return Err(CoreError::InvalidConfig {
            path: path.to_path_buf(),
            msg: "brush strength must be finite".to_string(),
        });
    }

    Ok(BrushConfig {
        primary: Rgba::new(raw.primary[0], raw.primary[1], raw.primary[2], 1.0),
        secondary: Rgba::new(raw.secondary[0], raw.secondary[1], raw.secondary[2], 1.0),
        strength: raw.strength,
    })
}

pub fn load_brush_config_from(path: impl AsRef<Path>) -> Result<BrushConfig, CoreError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_brush_config(path, &text)
}
