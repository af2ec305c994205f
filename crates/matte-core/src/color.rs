/// A normalized RGBA color, the only pixel format the store understands.
///
/// Channels are plain scene-referred floats; nothing here applies a transfer
/// function. Color-space handling stays in the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Default mask fill: fully visible.
    pub const OPAQUE_WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    /// Default fill for an empty paint layer.
    pub const TRANSPARENT_BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn from_array(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(v: [f32; 4]) -> Self {
        Self::from_array(v)
    }
}

impl From<Rgba> for [f32; 4] {
    fn from(c: Rgba) -> Self {
        c.to_array()
    }
}
