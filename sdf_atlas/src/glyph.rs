// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-glyph geometry and its placement in the atlas.

use kurbo::{BezPath, Rect, Vec2};

use crate::bitmap::PixelRect;
use crate::coloring::EdgeColoring;
use crate::generator::Projection;
use crate::math::{to_coordinate, to_pixels};
use crate::outline::Outline;
use crate::units::{DistanceRange, Padding};

/// How a glyph was requested from its font.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlyphIdentifier {
    /// A Unicode codepoint, mapped through the font's character map.
    Codepoint(u32),
    /// A glyph index within the font.
    Index(u32),
}

/// Resolved per-scale parameters used to size glyph boxes.
///
/// All lengths are in shape units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphAttributes {
    /// Pixels per shape unit.
    pub scale: f64,
    /// Distance range in shape units.
    pub range: DistanceRange,
    /// Padding that is part of the distance field.
    pub inner_padding: Padding,
    /// Padding that only reserves space in the atlas.
    pub outer_padding: Padding,
    /// Snap the glyph origin to the pixel grid horizontally.
    pub align_origin_x: bool,
    /// Snap the glyph origin to the pixel grid vertically.
    pub align_origin_y: bool,
    /// Convex corners grow the box by up to this many times the outer range
    /// along their bisector. Zero disables miter bounds.
    pub miter_limit: f64,
}

/// Location and sampling parameters of a glyph within the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphBox {
    /// The rectangle in atlas pixels, measured from the bottom-left corner.
    pub rect: PixelRect,
    /// Pixels per shape unit.
    pub scale: f64,
    /// Distance range in shape units.
    pub range: DistanceRange,
    /// Offset from the glyph origin to the bottom-left corner of the box, in shape units.
    pub translate: Vec2,
    /// Outer padding in pixels.
    pub outer_padding: Padding,
}

/// A glyph's outline together with its assigned atlas box.
///
/// Created during font loading, finalized by packing and read by generation.
#[derive(Clone, Debug)]
pub struct GlyphGeometry {
    identifier: GlyphIdentifier,
    index: u32,
    codepoint: Option<u32>,
    outline: Outline,
    bounds: Option<Rect>,
    advance: f64,
    glyph_box: GlyphBox,
}

impl GlyphGeometry {
    /// Creates a glyph from an outline in shape units.
    pub fn new(identifier: GlyphIdentifier, index: u32, outline: Outline, advance: f64) -> Self {
        let codepoint = match identifier {
            GlyphIdentifier::Codepoint(codepoint) => Some(codepoint),
            GlyphIdentifier::Index(_) => None,
        };
        let bounds = outline.bounds();
        Self {
            identifier,
            index,
            codepoint,
            outline,
            bounds,
            advance,
            glyph_box: GlyphBox::default(),
        }
    }

    /// Creates a glyph from a path in shape units.
    pub fn from_path(
        identifier: GlyphIdentifier,
        index: u32,
        path: &BezPath,
        advance: f64,
    ) -> Self {
        Self::new(identifier, index, Outline::from_path(path), advance)
    }

    /// How the glyph was requested.
    pub fn identifier(&self) -> GlyphIdentifier {
        self.identifier
    }

    /// The glyph index within its font.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The codepoint the glyph was loaded for, if any.
    pub fn codepoint(&self) -> Option<u32> {
        self.codepoint
    }

    /// The glyph outline.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Horizontal advance in shape units.
    pub fn advance(&self) -> f64 {
        self.advance
    }

    /// Tight outline bounds, or `None` for glyphs without ink.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Whether the glyph has no ink. Such glyphs get an empty box.
    pub fn is_whitespace(&self) -> bool {
        self.bounds.is_none()
    }

    /// The assigned atlas box.
    pub fn glyph_box(&self) -> &GlyphBox {
        &self.glyph_box
    }

    /// The assigned atlas rectangle.
    pub fn rect(&self) -> PixelRect {
        self.glyph_box.rect
    }

    /// Outline bounds grown by the distance range and all padding, in shape units.
    pub(crate) fn padded_bounds(&self, attributes: &GlyphAttributes) -> Option<Rect> {
        let bounds = self.bounds?;
        let padding = attributes.inner_padding + attributes.outer_padding;
        let lower = attributes.range.lower;
        let mut grown = bounds.inflate(-lower, -lower);
        if attributes.miter_limit > 0.0 {
            grown = self.outline.bound_miters(grown, -lower, attributes.miter_limit);
        }
        Some(Rect::new(
            grown.x0 - padding.left,
            grown.y0 - padding.bottom,
            grown.x1 + padding.right,
            grown.y1 + padding.top,
        ))
    }

    /// The size [`Self::wrap_box`] would assign, or `None` for whitespace.
    pub(crate) fn wrapped_size(&self, attributes: &GlyphAttributes) -> Option<(u32, u32)> {
        let padded = self.padded_bounds(attributes)?;
        let scale = attributes.scale;
        let (width, _) = wrap_axis(padded.x0, padded.x1, scale, attributes.align_origin_x);
        let (height, _) = wrap_axis(padded.y0, padded.y1, scale, attributes.align_origin_y);
        Some((width, height))
    }

    fn reset_box(&mut self, attributes: &GlyphAttributes) {
        self.glyph_box.scale = attributes.scale;
        self.glyph_box.range = attributes.range;
        self.glyph_box.outer_padding = attributes.outer_padding * attributes.scale;
        self.glyph_box.rect.width = 0;
        self.glyph_box.rect.height = 0;
        self.glyph_box.translate = Vec2::ZERO;
    }

    /// Sizes the box to tightly enclose the padded glyph at the given scale.
    ///
    /// The position is left untouched; see [`Self::place_box`].
    pub fn wrap_box(&mut self, attributes: &GlyphAttributes) {
        self.reset_box(attributes);
        let Some(padded) = self.padded_bounds(attributes) else {
            return;
        };
        let scale = attributes.scale;
        let (width, tx) = wrap_axis(padded.x0, padded.x1, scale, attributes.align_origin_x);
        let (height, ty) = wrap_axis(padded.y0, padded.y1, scale, attributes.align_origin_y);
        self.glyph_box.rect.width = width;
        self.glyph_box.rect.height = height;
        self.glyph_box.translate = Vec2::new(tx, ty);
    }

    /// Sizes the box to exactly `width` by `height` pixels, as for a grid cell.
    ///
    /// A fixed origin (in shape units, measured from the bottom-left corner of
    /// the cell) pins the glyph origin on that axis; otherwise the padded glyph is
    /// centered. Glyphs larger than the cell are cut off.
    pub fn frame_box(
        &mut self,
        attributes: &GlyphAttributes,
        width: u32,
        height: u32,
        fixed_x: Option<f64>,
        fixed_y: Option<f64>,
    ) {
        self.reset_box(attributes);
        self.glyph_box.rect.width = width;
        self.glyph_box.rect.height = height;
        let scale = attributes.scale;
        let padded = self.padded_bounds(attributes);
        let tx = fixed_x.unwrap_or_else(|| match padded {
            Some(padded) => {
                frame_axis(padded.x0, padded.x1, width, scale, attributes.align_origin_x)
            }
            None => 0.0,
        });
        let ty = fixed_y.unwrap_or_else(|| match padded {
            Some(padded) => {
                frame_axis(padded.y0, padded.y1, height, scale, attributes.align_origin_y)
            }
            None => 0.0,
        });
        self.glyph_box.translate = Vec2::new(tx, ty);
    }

    /// Moves the box to the given atlas position.
    pub fn place_box(&mut self, x: u32, y: u32) {
        self.glyph_box.rect.x = x;
        self.glyph_box.rect.y = y;
    }

    /// Assigns edge colors for multi-channel generation.
    pub fn color_edges<C: EdgeColoring + ?Sized>(
        &mut self,
        coloring: &C,
        angle_threshold: f64,
        seed: u64,
    ) {
        coloring.color_edges(&mut self.outline, angle_threshold, seed);
    }

    /// The mapping from shape units to box-local pixels.
    pub fn projection(&self) -> Projection {
        Projection {
            scale: self.glyph_box.scale,
            translate: self.glyph_box.translate,
        }
    }

    /// The quad to render relative to the glyph origin, in shape units.
    ///
    /// Excludes outer padding and is inset by half a texel so that bilinear
    /// sampling stays inside the box.
    pub fn quad_plane_bounds(&self) -> Option<Rect> {
        let b = &self.glyph_box;
        if b.rect.is_empty() {
            return None;
        }
        let inverse_scale = 1.0 / b.scale;
        let padding = b.outer_padding;
        Some(Rect::new(
            -b.translate.x + (padding.left + 0.5) * inverse_scale,
            -b.translate.y + (padding.bottom + 0.5) * inverse_scale,
            -b.translate.x + (f64::from(b.rect.width) - padding.right - 0.5) * inverse_scale,
            -b.translate.y + (f64::from(b.rect.height) - padding.top - 0.5) * inverse_scale,
        ))
    }

    /// The quad to sample from, in atlas pixels measured from the bottom-left corner.
    pub fn quad_atlas_bounds(&self) -> Option<Rect> {
        let b = &self.glyph_box;
        if b.rect.is_empty() {
            return None;
        }
        let x = f64::from(b.rect.x);
        let y = f64::from(b.rect.y);
        let padding = b.outer_padding;
        Some(Rect::new(
            x + padding.left + 0.5,
            y + padding.bottom + 0.5,
            x + f64::from(b.rect.width) - padding.right - 0.5,
            y + f64::from(b.rect.height) - padding.top - 0.5,
        ))
    }
}

/// Pixel extent and translation of one axis of a tightly wrapped box.
pub(crate) fn wrap_axis(low: f64, high: f64, scale: f64, align_origin: bool) -> (u32, f64) {
    if align_origin {
        let start = (scale * low - 0.5).floor();
        let end = (scale * high + 0.5).ceil();
        let extent = i64::from(to_coordinate(end)) - i64::from(to_coordinate(start));
        (u32::try_from(extent.max(0)).unwrap_or(u32::MAX), -start / scale)
    } else {
        let span = scale * (high - low);
        let extent = to_pixels(span.ceil()).saturating_add(1);
        (extent, -low + 0.5 * (f64::from(extent) - span) / scale)
    }
}

/// Translation of one axis of a glyph centered in a cell of `extent` pixels.
pub(crate) fn frame_axis(
    low: f64,
    high: f64,
    extent: u32,
    scale: f64,
    align_origin: bool,
) -> f64 {
    let span = scale * (high - low);
    let translate = -low + 0.5 * (f64::from(extent) - span) / scale;
    if align_origin {
        (scale * translate).round() / scale
    } else {
        translate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::tests::rect_path;

    fn attributes(scale: f64) -> GlyphAttributes {
        GlyphAttributes {
            scale,
            range: DistanceRange::symmetric(2.0 / scale),
            inner_padding: Padding::ZERO,
            outer_padding: Padding::ZERO,
            align_origin_x: false,
            align_origin_y: false,
            miter_limit: 0.0,
        }
    }

    fn square_glyph() -> GlyphGeometry {
        GlyphGeometry::from_path(
            GlyphIdentifier::Codepoint('a' as u32),
            3,
            &rect_path(0.0, 0.0, 0.5, 0.5),
            0.6,
        )
    }

    #[test]
    fn wrap_box_covers_glyph_and_range() {
        let mut glyph = square_glyph();
        glyph.wrap_box(&attributes(32.0));
        let rect = glyph.rect();
        // 16 px of ink plus 1 px of range per side, rounded up plus one.
        assert_eq!(rect.width, 19);
        assert_eq!(rect.height, 19);

        // The ink must map inside the box.
        let projection = glyph.projection();
        let lo = projection.project(kurbo::Point::new(0.0, 0.0));
        let hi = projection.project(kurbo::Point::new(0.5, 0.5));
        assert!(lo.x >= 1.0 && lo.y >= 1.0);
        assert!(hi.x <= f64::from(rect.width) - 1.0);
        assert!(hi.y <= f64::from(rect.height) - 1.0);
    }

    #[test]
    fn sharp_corners_grow_by_their_miter() {
        let mut spike = BezPath::new();
        spike.move_to((0.0, 0.0));
        spike.line_to((0.5, 0.4));
        spike.line_to((0.4, 0.5));
        spike.close_path();
        let glyph = GlyphGeometry::from_path(GlyphIdentifier::Index(2), 2, &spike, 0.6);

        let plain = attributes(32.0);
        let (width, height) = glyph.wrapped_size(&plain).unwrap();
        let mitered = GlyphAttributes {
            miter_limit: 4.0,
            ..plain
        };
        let (miter_width, miter_height) = glyph.wrapped_size(&mitered).unwrap();
        assert!(miter_width > width && miter_height > height);
        // The spike at the origin reaches four times the outer range along its bisector.
        let padded = glyph.padded_bounds(&mitered).unwrap();
        let reach = 4.0 / 32.0 * core::f64::consts::FRAC_1_SQRT_2;
        assert!((padded.x0 + reach).abs() < 1e-9);
        assert!((padded.y0 + reach).abs() < 1e-9);
    }

    #[test]
    fn square_corners_stay_within_the_range() {
        let glyph = square_glyph();
        let plain = attributes(32.0);
        let mitered = GlyphAttributes {
            miter_limit: 1.0,
            ..plain
        };
        assert_eq!(glyph.padded_bounds(&mitered), glyph.padded_bounds(&plain));
    }

    #[test]
    fn aligned_origin_lands_on_pixel_boundary() {
        let mut glyph = GlyphGeometry::from_path(
            GlyphIdentifier::Index(7),
            7,
            &rect_path(0.13, -0.21, 0.47, 0.52),
            0.6,
        );
        let mut attrs = attributes(17.3);
        attrs.align_origin_x = true;
        attrs.align_origin_y = true;
        glyph.wrap_box(&attrs);
        let origin = glyph.projection().project(kurbo::Point::ZERO);
        assert!((origin.x - origin.x.round()).abs() < 1e-9);
        assert!((origin.y - origin.y.round()).abs() < 1e-9);
    }

    #[test]
    fn whitespace_has_empty_box() {
        let mut glyph = GlyphGeometry::from_path(
            GlyphIdentifier::Codepoint(' ' as u32),
            1,
            &BezPath::new(),
            0.25,
        );
        glyph.wrap_box(&attributes(32.0));
        assert!(glyph.is_whitespace());
        assert!(glyph.rect().is_empty());
        assert!(glyph.quad_plane_bounds().is_none());
        assert!(glyph.quad_atlas_bounds().is_none());
    }

    #[test]
    fn frame_box_pins_fixed_origin() {
        let mut glyph = square_glyph();
        glyph.frame_box(&attributes(32.0), 24, 24, Some(0.125), None);
        assert_eq!(glyph.rect().width, 24);
        assert_eq!(glyph.glyph_box().translate.x, 0.125);
        // Centered vertically: equal margins around the padded glyph.
        let projection = glyph.projection();
        let bottom = projection.project(kurbo::Point::new(0.0, -1.0 / 32.0)).y;
        let top = projection.project(kurbo::Point::new(0.0, 0.5 + 1.0 / 32.0)).y;
        assert!((bottom - (24.0 - top)).abs() < 1e-9);
    }

    #[test]
    fn quad_bounds_exclude_outer_padding() {
        let mut glyph = square_glyph();
        let mut attrs = attributes(32.0);
        attrs.outer_padding = Padding::uniform(2.0 / 32.0);
        glyph.wrap_box(&attrs);
        glyph.place_box(10, 20);
        let atlas = glyph.quad_atlas_bounds().unwrap();
        assert_eq!(atlas.x0, 10.0 + 2.0 + 0.5);
        assert_eq!(atlas.y0, 20.0 + 2.0 + 0.5);
        let plane = glyph.quad_plane_bounds().unwrap();
        assert!(plane.x0 < 0.0 && plane.x1 > 0.5);
        assert!(((plane.x1 - plane.x0) * 32.0 - (atlas.x1 - atlas.x0)).abs() < 1e-9);
    }
}
