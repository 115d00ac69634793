// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sinks for finished atlases.
//!
//! Sinks run after generation and never change the atlas. Coordinates follow
//! the layout's [`YDirection`]; images are always written upright.

use core::fmt;

use kurbo::Rect;

use crate::atlas::AtlasLayout;
use crate::glyph::GlyphGeometry;

mod csv;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "png")]
mod png;
mod raw;

pub use csv::write_csv;
#[cfg(feature = "json")]
pub use json::write_json;
#[cfg(feature = "png")]
pub use png::write_png;
pub use raw::{write_raw, Endianness};

/// Which way the y axis of exported coordinates points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum YDirection {
    /// Y grows upwards from the bottom of the atlas and from the baseline.
    #[default]
    BottomUp,
    /// Y grows downwards from the top of the atlas and from the baseline.
    TopDown,
}

impl YDirection {
    /// The name used in metrics files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BottomUp => "bottom",
            Self::TopDown => "top",
        }
    }
}

/// Failure to write an atlas.
#[derive(Debug)]
pub enum ExportError {
    /// The writer failed.
    Io(std::io::Error),
    /// PNG encoding failed.
    #[cfg(feature = "png")]
    Png(::png::EncodingError),
    /// JSON encoding failed.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
    /// The image has a channel count the format cannot store.
    UnsupportedChannels(usize),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "failed to write atlas: {error}"),
            #[cfg(feature = "png")]
            Self::Png(error) => write!(f, "failed to encode PNG: {error}"),
            #[cfg(feature = "json")]
            Self::Json(error) => write!(f, "failed to encode JSON: {error}"),
            Self::UnsupportedChannels(channels) => {
                write!(f, "cannot store images with {channels} channels")
            }
        }
    }
}

impl core::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            #[cfg(feature = "png")]
            Self::Png(error) => Some(error),
            #[cfg(feature = "json")]
            Self::Json(error) => Some(error),
            Self::UnsupportedChannels(_) => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

#[cfg(feature = "png")]
impl From<::png::EncodingError> for ExportError {
    fn from(error: ::png::EncodingError) -> Self {
        Self::Png(error)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for ExportError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

/// A glyph's quad bounds in exported coordinates: the plane quad in shape
/// units and the atlas quad in pixels.
///
/// Whitespace glyphs get empty rectangles.
pub(crate) fn glyph_quads(layout: &AtlasLayout, glyph: &GlyphGeometry) -> (Rect, Rect) {
    let plane = glyph.quad_plane_bounds().unwrap_or(Rect::ZERO);
    let atlas = glyph.quad_atlas_bounds().unwrap_or(Rect::ZERO);
    match layout.y_direction {
        YDirection::BottomUp => (plane, atlas),
        YDirection::TopDown if glyph.is_whitespace() => (plane, atlas),
        YDirection::TopDown => {
            let height = f64::from(layout.height);
            (
                Rect::new(plane.x0, -plane.y1, plane.x1, -plane.y0),
                Rect::new(atlas.x0, height - atlas.y1, atlas.x1, height - atlas.y0),
            )
        }
    }
}
