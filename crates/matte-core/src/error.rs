use std::fmt;
use std::path::PathBuf;

/// Core errors used across the matte SDK crates.
///
/// Contract rule: this type lives in `matte-core` and can be re-exported by
/// the operator layer.
#[derive(Debug)]
pub enum CoreError {
    // ---- Image store ----
    InvalidSize {
        width: u32,
        height: u32,
    },

    BufferLength {
        expected: usize,
        got: usize,
    },

    /// `write_rect` received a rectangle that is not pre-ordered/pre-clamped.
    BadRect {
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        width: u32,
        height: u32,
    },

    ImageNotFound {
        handle: u32,
    },

    // ---- Graph contract ----
    /// A stable-named node is missing: the builder and mutator drifted apart.
    NodeNotFound {
        name: &'static str,
    },

    /// A mask-path mutation was requested on a layer built without a mask.
    MaskRequired,

    // ---- Config / JSON (SDK-level) ----
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    InvalidConfig {
        path: PathBuf,
        msg: String,
    },

    // ---- Fallback ----
    Other(String),
}

impl CoreError {
    pub fn other<T: Into<String>>(s: T) -> Self {
        CoreError::Other(s.into())
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidSize { width, height } => {
                write!(f, "invalid image size {width}x{height}")
            }
            CoreError::BufferLength { expected, got } => {
                write!(f, "pixel buffer length mismatch: expected {expected}, got {got}")
            }
            CoreError::BadRect {
                x0,
                y0,
                x1,
                y1,
                width,
                height,
            } => {
                write!(
                    f,
                    "rect ({x0},{y0})..({x1},{y1}) is not ordered/clamped for a {width}x{height} image"
                )
            }
            CoreError::ImageNotFound { handle } => {
                write!(f, "image handle {handle} not found in store")
            }
            CoreError::NodeNotFound { name } => {
                write!(f, "stable node '{name}' not found in graph")
            }
            CoreError::MaskRequired => {
                write!(f, "layer has no transparency mask node")
            }
            CoreError::Io { path, source } => {
                write!(f, "io error at {}: {}", path.display(), source)
            }
            CoreError::Json { path, source } => {
                write!(f, "json parse error at {}: {}", path.display(), source)
            }
            CoreError::InvalidConfig { path, msg } => {
                write!(f, "invalid config at {}: {}", path.display(), msg)
            }
            CoreError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Io { source, .. } => Some(source),
            CoreError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
