// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sdf Atlas lays out glyph outlines into a single packed bitmap encoding
//! per-glyph signed distance information.
//!
//! The pipeline has four stages:
//!
//! 1. Glyphs are loaded from a [`FontSource`] into a [`GlyphSet`].
//! 2. A packer ([`TightPacker`] or [`GridPacker`]) resolves one global scale and
//!    distance range and assigns every glyph a rectangle in the atlas.
//! 3. For multi-channel image types, each glyph's edges are colored with a
//!    deterministic per-glyph seed (see [`seed`]).
//! 4. The generation dispatcher fans glyph generation out over a bounded
//!    [`Workload`], each task writing only its own rectangle of the bitmap.
//!
//! [`AtlasGenerator`] drives all four stages from one immutable [`Configuration`].
//! The results can be written out with the sinks in [`export`].
//!
//! ## Features
//!
//! - `multithreading` (enabled by default): Run glyph generation on a rayon thread pool.
//!   Without it, every workload runs on the calling thread.
//! - `png` (enabled by default): Write atlas bitmaps as PNG images.
//! - `json` (enabled by default): Write atlas layout metrics as JSON.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use kurbo;
pub use skrifa;

mod atlas;
mod bitmap;
mod coloring;
mod config;
mod dispatch;
mod error;
mod font;
mod generator;
mod glyph;
mod math;
mod outline;
mod units;
mod workload;

pub mod export;
pub mod packer;
pub mod seed;

#[cfg(test)]
mod tests;

pub use atlas::{Atlas, AtlasGenerator, AtlasLayout};
pub use bitmap::{AtlasBitmap, AtlasImage, GlyphRegion, PixelRect, Sample};
pub use coloring::{ColoringCost, EdgeColoring, SimpleColoring};
pub use config::{
    Configuration, ConfigurationBuilder, GridOptions, ImageType, PackingStyle, SampleStorage,
    DEFAULT_ANGLE_THRESHOLD, DEFAULT_MITER_LIMIT, DEFAULT_PIXEL_RANGE, DEFAULT_SIZE,
};
pub use dispatch::{ErrorCorrectionDowngrade, GenerationOutcome, GenerationPlan};
pub use error::{AtlasError, ConfigError, GenerateError, LoadError, RegionError};
pub use font::{
    Charset, FontCollection, FontMetrics, FontSource, GlyphSet, LoadReport, SkrifaFontSource,
};
pub use generator::{
    scanline_sign_correction, DistanceCheckMode, DistanceGenerator, ErrorCorrectionConfig,
    ErrorCorrectionMode, ErrorCorrectionPreset, GeneratorAttributes, GeneratorKind, Projection,
    ReferenceGenerator, SampleTile,
};
pub use glyph::{GlyphAttributes, GlyphBox, GlyphGeometry, GlyphIdentifier};
pub use outline::{Contour, Edge, EdgeColor, Outline};
pub use packer::{
    AtlasPacker, DimensionsConstraint, GridLayout, GridPacker, PackError, PackerSettings, Packing,
    ScaleConstraint, TightPacker,
};
pub use units::{DistanceRange, Padding, PaddingSet, Quantity};
pub use workload::Workload;
