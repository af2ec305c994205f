#![forbid(unsafe_code)]

//! Mask and paint image store.
//!
//! This crate is **contract-only**: no GPU textures, no codecs, no host image
//! datablocks. It owns flat `f32` RGBA buffers and the one place where the
//! `(height, width, 4)` view of a flat buffer is computed.
//!
//! Buffer convention: row-major, 4 channels per pixel, row 0 at the bottom
//! (matches the host's image pixel layout).
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

use std::collections::HashMap;

use matte_core::{CoreError, Rgba};

pub const CHANNELS: usize = 4;

/// Stable handle to an image owned by an [`ImageStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u32);

/// Where an image came from. Mirrors the host's source tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    File,
    Movie,
    Sequence,
    Generated,
}

/// A `width*height*4` normalized float pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidSize { width, height });
        }
        let npix = width as usize * height as usize;
        let mut data = Vec::with_capacity(npix * CHANNELS);
        for _ in 0..npix {
            data.extend_from_slice(&fill.to_array());
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bulk read of the whole flat buffer.
    pub fn read_all(&self) -> &[f32] {
        &self.data
    }

    /// Bulk replace of the whole flat buffer. The length must match exactly.
    pub fn write_all(&mut self, pixels: &[f32]) -> Result<(), CoreError> {
        if pixels.len() != self.data.len() {
            return Err(CoreError::BufferLength {
                expected: self.data.len(),
                got: pixels.len(),
            });
        }
        self.data.copy_from_slice(pixels);
        Ok(())
    }

    /// Read one pixel. Row 0 is the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index_of(x, y);
        Some(Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ))
    }

    /// Fill every pixel in `[x0,x1) x [y0,y1)` with `color`.
    ///
    /// Contract: the rectangle arrives already ordered (`x0 < x1`, `y0 < y1`)
    /// and clamped to the image; callers (the marquee engine) do that work.
    /// Violations are an error, not a silent clamp.
    pub fn write_rect(
        &mut self,
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        color: Rgba,
    ) -> Result<(), CoreError> {
        if x0 >= x1 || y0 >= y1 || x1 > self.width || y1 > self.height {
            return Err(CoreError::BadRect {
                x0,
                y0,
                x1,
                y1,
                width: self.width,
                height: self.height,
            });
        }

        let fill = color.to_array();
        for y in y0..y1 {
            let row = self.index_of(x0, y);
            let row_end = self.index_of(x1 - 1, y) + CHANNELS;
            for px in self.data[row..row_end].chunks_exact_mut(CHANNELS) {
                px.copy_from_slice(&fill);
            }
        }
        Ok(())
    }

    // The single place the flat-buffer reshape math lives.
    fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

#[derive(Debug)]
struct StoredImage {
    pixels: PixelBuffer,
    source: SourceKind,
    /// Set by any buffer mutation; consumed by save-all.
    dirty: bool,
}

/// Owner of every mask and paint buffer in the session.
///
/// Handles are never reused within one store's lifetime.
#[derive(Debug, Default)]
pub struct ImageStore {
    next: u32,
    images: HashMap<ImageHandle, StoredImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a blank image filled with `fill`.
    pub fn alloc(
        &mut self,
        width: u32,
        height: u32,
        fill: Rgba,
        source: SourceKind,
    ) -> Result<ImageHandle, CoreError> {
        let pixels = PixelBuffer::new(width, height, fill)?;
        Ok(self.insert(pixels, source))
    }

    /// Adopt an already-decoded buffer (an import or clipboard paste).
    pub fn insert(&mut self, pixels: PixelBuffer, source: SourceKind) -> ImageHandle {
        let handle = ImageHandle(self.next);
        self.next += 1;
        self.images.insert(
            handle,
            StoredImage {
                pixels,
                source,
                dirty: false,
            },
        );
        handle
    }

    pub fn get(&self, handle: ImageHandle) -> Result<&PixelBuffer, CoreError> {
        self.images
            .get(&handle)
            .map(|img| &img.pixels)
            .ok_or(CoreError::ImageNotFound { handle: handle.0 })
    }

    /// Mutable access marks the image dirty.
    pub fn get_mut(&mut self, handle: ImageHandle) -> Result<&mut PixelBuffer, CoreError> {
        let img = self
            .images
            .get_mut(&handle)
            .ok_or(CoreError::ImageNotFound { handle: handle.0 })?;
        img.dirty = true;
        Ok(&mut img.pixels)
    }

    pub fn source(&self, handle: ImageHandle) -> Result<SourceKind, CoreError> {
        self.images
            .get(&handle)
            .map(|img| img.source)
            .ok_or(CoreError::ImageNotFound { handle: handle.0 })
    }

    pub fn size(&self, handle: ImageHandle) -> Result<(u32, u32), CoreError> {
        let px = self.get(handle)?;
        Ok((px.width(), px.height()))
    }

    /// Handles of every image mutated since its last save.
    pub fn dirty_handles(&self) -> Vec<ImageHandle> {
        let mut out: Vec<ImageHandle> = self
            .images
            .iter()
            .filter(|(_, img)| img.dirty)
            .map(|(h, _)| *h)
            .collect();
        out.sort_by_key(|h| h.0);
        out
    }

    pub fn mark_saved(&mut self, handle: ImageHandle) -> Result<(), CoreError> {
        let img = self
            .images
            .get_mut(&handle)
            .ok_or(CoreError::ImageNotFound { handle: handle.0 })?;
        img.dirty = false;
        Ok(())
    }
}
