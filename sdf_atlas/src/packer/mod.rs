// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving the glyph scale and placing glyph boxes in the atlas.
//!
//! Two strategies share one set of settings through [`AtlasPacker`]:
//!
//! - [`TightPacker`] bin-packs each glyph's own box.
//! - [`GridPacker`] gives every glyph a cell of the same size.
//!
//! Both take either fixed atlas dimensions or a [`DimensionsConstraint`] to
//! search under, and either a fixed scale or a minimum scale to maximize
//! from.

use core::fmt;

use crate::glyph::{GlyphAttributes, GlyphGeometry};
use crate::units::{DistanceRange, Padding, PaddingSet, Quantity};

mod grid;
mod rect_packer;
mod tight;

pub use grid::{GridLayout, GridPacker};
pub use tight::TightPacker;

/// Largest atlas side the size search will try.
pub(crate) const MAX_SIDE: u32 = 1 << 15;

/// Number of halvings when maximizing the scale.
const BISECTION_STEPS: u32 = 40;

/// Number of doublings before the scale search gives up growing.
const MAX_DOUBLINGS: u32 = 64;

/// Smallest scale considered when no minimum is given.
pub(crate) const MIN_SCALE: f64 = 1.0 / 65536.0;

/// Shape of the atlas (or grid cell) when its dimensions are searched for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DimensionsConstraint {
    /// No constraint; the packers treat this like [`Self::Square`].
    #[default]
    None,
    /// Square.
    Square,
    /// Square with an even side.
    EvenSquare,
    /// Square with a side divisible by four.
    MultipleOfFourSquare,
    /// Square with a power-of-two side.
    PowerOfTwoSquare,
    /// Power-of-two area, either square or twice as wide as high.
    PowerOfTwoRectangle,
}

/// Lower bounds a candidate size must satisfy.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SizeRequest {
    pub(crate) min_width: u32,
    pub(crate) min_height: u32,
    /// Spacing added to both the boxes and the atlas when packing.
    pub(crate) spacing: u32,
    /// Total area of the boxes, each grown by the spacing.
    pub(crate) area: u64,
}

impl SizeRequest {
    fn admits(&self, width: u32, height: u32) -> bool {
        width >= self.min_width
            && height >= self.min_height
            && (u64::from(width) + u64::from(self.spacing))
                * (u64::from(height) + u64::from(self.spacing))
                >= self.area
    }

    fn lower_side(&self) -> u32 {
        let area_side = ceil_sqrt(self.area).saturating_sub(u64::from(self.spacing));
        let area_side = u32::try_from(area_side).unwrap_or(u32::MAX);
        self.min_width.max(self.min_height).max(area_side).max(1)
    }
}

fn ceil_sqrt(value: u64) -> u64 {
    let root = value.isqrt();
    if root * root < value {
        root + 1
    } else {
        root
    }
}

impl DimensionsConstraint {
    /// Candidate sizes satisfying this constraint, in increasing area.
    ///
    /// Among equal areas the squarer size comes first. Sizes with a side above
    /// [`MAX_SIDE`] are never produced.
    pub(crate) fn candidates(self, request: SizeRequest) -> impl Iterator<Item = (u32, u32)> {
        let lower = request.lower_side();
        let steps = |step: u32| {
            let start = lower.div_ceil(step).checked_mul(step);
            core::iter::successors(start, move |side: &u32| side.checked_add(step))
                .map(|side| (side, side))
        };
        let sizes: Box<dyn Iterator<Item = (u32, u32)>> = match self {
            Self::None | Self::Square => Box::new(steps(1)),
            Self::EvenSquare => Box::new(steps(2)),
            Self::MultipleOfFourSquare => Box::new(steps(4)),
            Self::PowerOfTwoSquare => Box::new(
                core::iter::successors(lower.checked_next_power_of_two(), |side: &u32| {
                    side.checked_mul(2)
                })
                .map(|side| (side, side)),
            ),
            Self::PowerOfTwoRectangle => {
                let max_exponent = 2 * MAX_SIDE.ilog2();
                Box::new((0..=max_exponent).map(|k| (1_u32 << k.div_ceil(2), 1_u32 << (k / 2))))
            }
        };
        sizes
            .take_while(|&(width, height)| width.max(height) <= MAX_SIDE)
            .filter(move |&(width, height)| request.admits(width, height))
    }

    /// The smallest size satisfying this constraint that is at least `width` by `height`.
    pub(crate) fn snap(self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self == Self::None {
            return Some((width, height));
        }
        self.candidates(SizeRequest {
            min_width: width,
            min_height: height,
            ..SizeRequest::default()
        })
        .next()
    }
}

/// How the glyph scale is determined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleConstraint {
    /// Use exactly this scale.
    Fixed(f64),
    /// Use the largest scale that fits the fixed atlas dimensions, but no less
    /// than this. Without fixed dimensions this scale is used as is.
    Minimum(f64),
}

impl Default for ScaleConstraint {
    fn default() -> Self {
        Self::Minimum(0.0)
    }
}

/// Settings shared by both packing strategies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackerSettings {
    /// Fixed atlas dimensions. When set, the dimensions constraint is ignored.
    pub dimensions: Option<(u32, u32)>,
    /// Constraint for searching atlas dimensions.
    pub dimensions_constraint: DimensionsConstraint,
    /// How the scale is determined.
    pub scale: ScaleConstraint,
    /// Pixels left empty between neighbouring glyph boxes.
    pub spacing: u32,
    /// Distance range.
    pub range: Quantity<DistanceRange>,
    /// Inner and outer padding.
    pub padding: PaddingSet,
    /// Snap glyph origins to the pixel grid horizontally.
    pub align_origin_x: bool,
    /// Snap glyph origins to the pixel grid vertically.
    pub align_origin_y: bool,
    /// Miter limit for convex corners, relative to the outer range. Zero disables it.
    pub miter_limit: f64,
}

impl Default for PackerSettings {
    fn default() -> Self {
        Self {
            dimensions: None,
            dimensions_constraint: DimensionsConstraint::None,
            scale: ScaleConstraint::default(),
            spacing: 0,
            range: Quantity::Pixels(DistanceRange::symmetric(crate::DEFAULT_PIXEL_RANGE)),
            padding: PaddingSet::default(),
            align_origin_x: false,
            align_origin_y: false,
            miter_limit: 0.0,
        }
    }
}

impl PackerSettings {
    /// Glyph box parameters at the given scale.
    pub fn attributes(&self, scale: f64) -> GlyphAttributes {
        GlyphAttributes {
            scale,
            range: self.range.to_units(scale),
            inner_padding: self.padding.inner(scale),
            outer_padding: self.padding.outer(scale),
            align_origin_x: self.align_origin_x,
            align_origin_y: self.align_origin_y,
            miter_limit: self.miter_limit,
        }
    }
}

/// The resolved layout of a successful pack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Packing {
    /// Atlas width in pixels.
    pub width: u32,
    /// Atlas height in pixels.
    pub height: u32,
    /// Pixels per shape unit, shared by all glyphs.
    pub scale: f64,
    /// Distance range in pixels, shared by all glyphs.
    pub pixel_range: DistanceRange,
}

/// Why glyphs could not be packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackError {
    /// The request cannot be satisfied in principle, such as an empty glyph
    /// set, a zero-area atlas, or no usable scale.
    Infeasible,
    /// The fixed atlas was accepted but this many glyphs did not fit.
    Unplaced(usize),
}

impl PackError {
    /// Integer encoding of the outcome: `-1` for infeasible requests, or the
    /// number of glyphs that could not be placed.
    pub fn code(self) -> i64 {
        match self {
            Self::Infeasible => -1,
            Self::Unplaced(count) => i64::try_from(count).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible => f.write_str("glyphs cannot be packed into an atlas"),
            Self::Unplaced(count) => write!(f, "could not fit {count} glyphs into the atlas"),
        }
    }
}

impl core::error::Error for PackError {}

/// The interface shared by the packing strategies.
///
/// Dimensions and dimension constraints exclude each other, as do fixed and
/// minimum scales; each setter replaces its counterpart.
pub trait AtlasPacker {
    /// The current settings.
    fn settings(&self) -> &PackerSettings;

    /// Mutable access to the settings.
    fn settings_mut(&mut self) -> &mut PackerSettings;

    /// Assigns every glyph a box and a position.
    ///
    /// Whitespace glyphs receive an empty box and no position.
    fn pack(&mut self, glyphs: &mut [GlyphGeometry]) -> Result<Packing, PackError>;

    /// The result of the last successful [`pack`](Self::pack).
    fn packing(&self) -> Option<&Packing>;

    /// Fixes the atlas dimensions.
    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.settings_mut().dimensions = Some((width, height));
    }

    /// Searches for the smallest atlas satisfying `constraint`.
    fn set_dimensions_constraint(&mut self, constraint: DimensionsConstraint) {
        let settings = self.settings_mut();
        settings.dimensions = None;
        settings.dimensions_constraint = constraint;
    }

    /// Fixes the scale in pixels per shape unit.
    fn set_scale(&mut self, scale: f64) {
        self.settings_mut().scale = ScaleConstraint::Fixed(scale);
    }

    /// Sets the minimum scale in pixels per shape unit.
    fn set_minimum_scale(&mut self, scale: f64) {
        self.settings_mut().scale = ScaleConstraint::Minimum(scale);
    }

    /// Sets the spacing between glyph boxes in pixels.
    fn set_spacing(&mut self, spacing: u32) {
        self.settings_mut().spacing = spacing;
    }

    /// Sets the distance range.
    fn set_range(&mut self, range: Quantity<DistanceRange>) {
        self.settings_mut().range = range;
    }

    /// Sets the inner padding in shape units.
    fn set_inner_unit_padding(&mut self, padding: Padding) {
        self.settings_mut().padding.inner_units = padding;
    }

    /// Sets the outer padding in shape units.
    fn set_outer_unit_padding(&mut self, padding: Padding) {
        self.settings_mut().padding.outer_units = padding;
    }

    /// Sets the inner padding in pixels.
    fn set_inner_pixel_padding(&mut self, padding: Padding) {
        self.settings_mut().padding.inner_pixels = padding;
    }

    /// Sets the outer padding in pixels.
    fn set_outer_pixel_padding(&mut self, padding: Padding) {
        self.settings_mut().padding.outer_pixels = padding;
    }

    /// Snaps glyph origins to the pixel grid per axis.
    fn set_origin_pixel_alignment(&mut self, align_x: bool, align_y: bool) {
        let settings = self.settings_mut();
        settings.align_origin_x = align_x;
        settings.align_origin_y = align_y;
    }

    /// Sets how far convex corners may grow the box, relative to the outer range.
    fn set_miter_limit(&mut self, miter_limit: f64) {
        self.settings_mut().miter_limit = miter_limit;
    }

    /// Atlas dimensions of the last successful pack.
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.packing().map(|packing| (packing.width, packing.height))
    }

    /// Scale of the last successful pack.
    fn scale(&self) -> Option<f64> {
        self.packing().map(|packing| packing.scale)
    }

    /// Pixel distance range of the last successful pack.
    fn pixel_range(&self) -> Option<DistanceRange> {
        self.packing().map(|packing| packing.pixel_range)
    }
}

/// Finds the largest scale accepted by `fits`, but no less than `floor`.
///
/// Returns `None` if `floor` itself is rejected. The search bounds do not
/// depend on `floor`, so raising the floor never lowers the result.
pub(crate) fn maximize_scale(floor: f64, mut fits: impl FnMut(f64) -> bool) -> Option<f64> {
    let floor = floor.max(MIN_SCALE);
    if !fits(floor) {
        return None;
    }
    let mut low = 0.0;
    let mut high = 1.0;
    let mut doublings = 0;
    while fits(high) {
        low = high;
        high *= 2.0;
        doublings += 1;
        if doublings == MAX_DOUBLINGS {
            return Some(low.max(floor));
        }
    }
    log::debug!("Bisecting glyph scale between {low} and {high}");
    for _ in 0..BISECTION_STEPS {
        let middle = 0.5 * (low + high);
        if fits(middle) {
            low = middle;
        } else {
            high = middle;
        }
    }
    Some(f64::max(low, floor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides(constraint: DimensionsConstraint, request: SizeRequest) -> Vec<(u32, u32)> {
        constraint.candidates(request).take(4).collect()
    }

    #[test]
    fn square_candidates_respect_step() {
        let request = SizeRequest {
            min_width: 10,
            min_height: 41,
            spacing: 2,
            area: 100,
        };
        assert_eq!(
            sides(DimensionsConstraint::Square, request),
            [(41, 41), (42, 42), (43, 43), (44, 44)]
        );
        assert_eq!(
            sides(DimensionsConstraint::EvenSquare, request),
            [(42, 42), (44, 44), (46, 46), (48, 48)]
        );
        assert_eq!(
            sides(DimensionsConstraint::MultipleOfFourSquare, request),
            [(44, 44), (48, 48), (52, 52), (56, 56)]
        );
        assert_eq!(
            sides(DimensionsConstraint::PowerOfTwoSquare, request),
            [(64, 64), (128, 128), (256, 256), (512, 512)]
        );
    }

    #[test]
    fn power_of_two_rectangles_grow_by_area() {
        let request = SizeRequest {
            min_width: 20,
            min_height: 10,
            spacing: 0,
            area: 600,
        };
        assert_eq!(
            sides(DimensionsConstraint::PowerOfTwoRectangle, request),
            [(32, 32), (64, 32), (64, 64), (128, 64)]
        );
    }

    #[test]
    fn area_bound_accounts_for_spacing() {
        let request = SizeRequest {
            min_width: 1,
            min_height: 1,
            spacing: 4,
            area: 400,
        };
        // (16 + 4)^2 = 400.
        assert_eq!(
            DimensionsConstraint::Square.candidates(request).next(),
            Some((16, 16))
        );
    }

    #[test]
    fn oversized_requests_yield_nothing() {
        let request = SizeRequest {
            min_width: MAX_SIDE + 1,
            ..SizeRequest::default()
        };
        assert!(DimensionsConstraint::Square.candidates(request).next().is_none());
        assert!(DimensionsConstraint::PowerOfTwoRectangle.snap(MAX_SIDE + 1, 1).is_none());
    }

    #[test]
    fn saturated_requests_yield_nothing() {
        let request = SizeRequest {
            min_width: u32::MAX,
            min_height: u32::MAX,
            spacing: u32::MAX,
            area: u64::MAX,
        };
        for constraint in [
            DimensionsConstraint::None,
            DimensionsConstraint::EvenSquare,
            DimensionsConstraint::MultipleOfFourSquare,
            DimensionsConstraint::PowerOfTwoSquare,
            DimensionsConstraint::PowerOfTwoRectangle,
        ] {
            assert!(constraint.candidates(request).next().is_none(), "{constraint:?}");
        }
    }

    #[test]
    fn snapping() {
        assert_eq!(DimensionsConstraint::None.snap(13, 7), Some((13, 7)));
        assert_eq!(
            DimensionsConstraint::MultipleOfFourSquare.snap(13, 7),
            Some((16, 16))
        );
        assert_eq!(
            DimensionsConstraint::PowerOfTwoRectangle.snap(13, 7),
            Some((16, 8))
        );
    }

    #[test]
    fn scale_search_finds_threshold() {
        let found = maximize_scale(1.0, |scale| scale <= 37.25).unwrap();
        assert!(found <= 37.25 && found > 37.2);
        assert_eq!(maximize_scale(40.0, |scale| scale <= 37.25), None);
    }

    #[test]
    fn scale_search_is_monotonic_in_floor() {
        // A non-monotonic feasibility region.
        let fits = |scale: f64| scale <= 10.0 || (20.0..=21.0).contains(&scale);
        let low = maximize_scale(1.0, fits).unwrap();
        let high = maximize_scale(20.5, fits).unwrap();
        assert!(high >= low);
        assert_eq!(high, 20.5);
    }

    #[test]
    fn error_codes() {
        assert_eq!(PackError::Infeasible.code(), -1);
        assert_eq!(PackError::Unplaced(7).code(), 7);
    }
}
