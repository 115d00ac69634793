// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The atlas bitmap and its division into per-glyph regions.

use core::fmt::Debug;

use crate::error::RegionError;

/// A rectangle in atlas pixels, measured from the bottom-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Bottom edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Creates a rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the rightmost column.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the topmost row.
    pub const fn top(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the two rectangles share a pixel.
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

/// A sample storage type.
pub trait Sample: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    /// Converts a normalized distance, where `0.5` lies on the outline.
    fn from_normalized(value: f32) -> Self;

    /// Converts back to a normalized value.
    fn to_normalized(self) -> f32;
}

impl Sample for u8 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value is clamped to the u8 range first"
    )]
    fn from_normalized(value: f32) -> Self {
        (256.0 * value).clamp(0.0, 255.0) as Self
    }

    fn to_normalized(self) -> f32 {
        f32::from(self) / 255.0
    }
}

impl Sample for f32 {
    fn from_normalized(value: f32) -> Self {
        value
    }

    fn to_normalized(self) -> f32 {
        self
    }
}

/// An owned bitmap of `width * height * channels` samples.
///
/// Rows are stored bottom-up: row `0` is the bottom of the atlas.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasBitmap<T> {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<T>,
}

impl<T: Sample> AtlasBitmap<T> {
    /// Creates a bitmap filled with the default sample.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        let len = width as usize * height as usize * channels;
        Self {
            width,
            height,
            channels,
            data: vec![T::default(); len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// All samples, bottom row first.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the bitmap, returning its samples.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// The samples of one row, counted from the bottom.
    pub fn row(&self, y: u32) -> &[T] {
        let len = self.width as usize * self.channels;
        let start = y as usize * len;
        &self.data[start..start + len]
    }

    /// The samples of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        let start = x as usize * self.channels;
        &self.row(y)[start..start + self.channels]
    }

    /// Splits the bitmap into one exclusive region per rectangle.
    ///
    /// Regions are returned in the order of `rects`. Empty rectangles get
    /// empty regions. Fails if a rectangle leaves the bitmap or two rectangles
    /// overlap, since generation tasks write their regions concurrently.
    pub fn glyph_regions(
        &mut self,
        rects: &[PixelRect],
    ) -> Result<Vec<GlyphRegion<'_, T>>, RegionError> {
        let channels = self.channels;
        let mut order = Vec::with_capacity(rects.len());
        for (glyph, rect) in rects.iter().enumerate() {
            if rect.is_empty() {
                continue;
            }
            if rect.right() > self.width || rect.top() > self.height {
                return Err(RegionError::OutOfBounds { glyph });
            }
            order.push(glyph);
        }
        order.sort_by_key(|&glyph| rects[glyph].x);

        let mut regions: Vec<GlyphRegion<'_, T>> = rects
            .iter()
            .map(|&rect| GlyphRegion {
                rect,
                channels,
                rows: Vec::with_capacity(rect.height as usize),
            })
            .collect();
        let row_len = self.width as usize * channels;
        if order.is_empty() || row_len == 0 {
            return Ok(regions);
        }

        for (y, mut row) in (0_u32..).zip(self.data.chunks_mut(row_len)) {
            let mut consumed = 0;
            let mut previous: Option<usize> = None;
            for &glyph in &order {
                let rect = rects[glyph];
                if y < rect.y || y >= rect.top() {
                    continue;
                }
                let start = rect.x as usize * channels;
                if start < consumed {
                    return Err(RegionError::Overlap {
                        first: previous.unwrap_or(glyph),
                        second: glyph,
                    });
                }
                let len = rect.width as usize * channels;
                let rest = core::mem::take(&mut row);
                let (_, rest) = rest.split_at_mut(start - consumed);
                let (span, rest) = rest.split_at_mut(len);
                row = rest;
                consumed = start + len;
                previous = Some(glyph);
                regions[glyph].rows.push(span);
            }
        }
        Ok(regions)
    }
}

/// The exclusive part of the bitmap belonging to one glyph.
#[derive(Debug)]
pub struct GlyphRegion<'a, T> {
    rect: PixelRect,
    channels: usize,
    rows: Vec<&'a mut [T]>,
}

impl<T: Sample> GlyphRegion<'_, T> {
    /// The glyph's rectangle in the atlas.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the samples of one pixel, in region-local coordinates from the
    /// bottom-left corner.
    pub fn set_pixel(&mut self, x: u32, y: u32, samples: &[T]) {
        let start = x as usize * self.channels;
        self.rows[y as usize][start..start + self.channels].copy_from_slice(samples);
    }

    /// The samples of one region-local row.
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        &mut self.rows[y as usize]
    }
}

/// A finished atlas bitmap of either storage type.
#[derive(Clone, Debug, PartialEq)]
pub enum AtlasImage {
    /// 8-bit normalized samples.
    Byte(AtlasBitmap<u8>),
    /// 32-bit floating point samples.
    Float(AtlasBitmap<f32>),
}

impl AtlasImage {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Byte(bitmap) => bitmap.width(),
            Self::Float(bitmap) => bitmap.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Byte(bitmap) => bitmap.height(),
            Self::Float(bitmap) => bitmap.height(),
        }
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Byte(bitmap) => bitmap.channels(),
            Self::Float(bitmap) => bitmap.channels(),
        }
    }

    /// All samples quantized to bytes, bottom row first.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Byte(bitmap) => bitmap.data().to_vec(),
            Self::Float(bitmap) => bitmap
                .data()
                .iter()
                .map(|&value| u8::from_normalized(value))
                .collect(),
        }
    }
}

impl From<AtlasBitmap<u8>> for AtlasImage {
    fn from(bitmap: AtlasBitmap<u8>) -> Self {
        Self::Byte(bitmap)
    }
}

impl From<AtlasBitmap<f32>> for AtlasImage {
    fn from(bitmap: AtlasBitmap<f32>) -> Self {
        Self::Float(bitmap)
    }
}
