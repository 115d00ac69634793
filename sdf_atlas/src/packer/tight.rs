// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::rect_packer::pack_rectangles;
use super::{
    maximize_scale, AtlasPacker, PackError, PackerSettings, Packing, ScaleConstraint, SizeRequest,
    MAX_SIDE, MIN_SCALE,
};
use crate::glyph::GlyphGeometry;

/// Packs each glyph's own tight box.
///
/// With fixed dimensions and a minimum scale, the largest scale at which every
/// glyph fits is chosen. Otherwise the scale is used as given and the smallest
/// atlas satisfying the dimensions constraint is searched for.
#[derive(Clone, Debug, Default)]
pub struct TightPacker {
    settings: PackerSettings,
    packing: Option<Packing>,
}

impl TightPacker {
    /// Creates a packer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Box sizes at `scale`, grown by the spacing. Whitespace glyphs get `(0, 0)`.
    ///
    /// Fails if a box is larger than any atlas can be.
    fn box_sizes(
        &self,
        glyphs: &[GlyphGeometry],
        scale: f64,
    ) -> Result<Vec<(u32, u32)>, PackError> {
        let attributes = self.settings.attributes(scale);
        let spacing = self.settings.spacing;
        glyphs
            .iter()
            .map(|glyph| match glyph.wrapped_size(&attributes) {
                Some((width, height)) if width.max(height) <= MAX_SIDE => Ok((
                    width.saturating_add(spacing),
                    height.saturating_add(spacing),
                )),
                Some(_) => Err(PackError::Infeasible),
                None => Ok((0, 0)),
            })
            .collect()
    }

    fn count_unplaced(sizes: &[(u32, u32)], placements: &[Option<(u32, u32)>]) -> usize {
        sizes
            .iter()
            .zip(placements)
            .filter(|(&(width, height), placement)| width > 0 && height > 0 && placement.is_none())
            .count()
    }

    /// Whether every glyph fits a `width` by `height` atlas at `scale`.
    fn fits_at(&self, glyphs: &[GlyphGeometry], scale: f64, width: u32, height: u32) -> bool {
        let Ok(sizes) = self.box_sizes(glyphs, scale) else {
            return false;
        };
        let placements = pack_rectangles(self.padded(width), self.padded(height), &sizes);
        Self::count_unplaced(&sizes, &placements) == 0
    }

    /// Wraps and places every glyph, returning the number that did not fit.
    fn place_at(
        &self,
        glyphs: &mut [GlyphGeometry],
        scale: f64,
        width: u32,
        height: u32,
    ) -> Result<usize, PackError> {
        let sizes = self.box_sizes(glyphs, scale)?;
        let attributes = self.settings.attributes(scale);
        for glyph in glyphs.iter_mut() {
            glyph.wrap_box(&attributes);
        }
        let placements = pack_rectangles(self.padded(width), self.padded(height), &sizes);
        for (glyph, placement) in glyphs.iter_mut().zip(&placements) {
            if let Some((x, y)) = *placement {
                glyph.place_box(x, y);
            }
        }
        Ok(Self::count_unplaced(&sizes, &placements))
    }

    /// An atlas side grown by the spacing, which the boxes carry as well.
    fn padded(&self, side: u32) -> u32 {
        side.saturating_add(self.settings.spacing)
    }

    fn finish(&mut self, width: u32, height: u32, scale: f64) -> Packing {
        let packing = Packing {
            width,
            height,
            scale,
            pixel_range: self.settings.range.to_pixels(scale),
        };
        self.packing = Some(packing);
        packing
    }
}

impl AtlasPacker for TightPacker {
    fn settings(&self) -> &PackerSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PackerSettings {
        &mut self.settings
    }

    fn packing(&self) -> Option<&Packing> {
        self.packing.as_ref()
    }

    fn pack(&mut self, glyphs: &mut [GlyphGeometry]) -> Result<Packing, PackError> {
        self.packing = None;
        if glyphs.iter().all(GlyphGeometry::is_whitespace) {
            return Err(PackError::Infeasible);
        }

        if let Some((width, height)) = self.settings.dimensions {
            if width == 0 || height == 0 {
                return Err(PackError::Infeasible);
            }
            let scale = match self.settings.scale {
                ScaleConstraint::Fixed(scale) if scale > 0.0 && scale.is_finite() => scale,
                ScaleConstraint::Fixed(_) => return Err(PackError::Infeasible),
                ScaleConstraint::Minimum(floor) => {
                    let found =
                        maximize_scale(floor, |scale| self.fits_at(glyphs, scale, width, height));
                    match found {
                        Some(scale) => scale,
                        None => {
                            let floor = floor.max(MIN_SCALE);
                            let unplaced = self.place_at(glyphs, floor, width, height)?;
                            return Err(PackError::Unplaced(unplaced.max(1)));
                        }
                    }
                }
            };
            let unplaced = self.place_at(glyphs, scale, width, height)?;
            if unplaced > 0 {
                return Err(PackError::Unplaced(unplaced));
            }
            return Ok(self.finish(width, height, scale));
        }

        let scale = match self.settings.scale {
            ScaleConstraint::Fixed(scale) | ScaleConstraint::Minimum(scale) => scale,
        };
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(PackError::Infeasible);
        }
        let sizes = self.box_sizes(glyphs, scale)?;
        let spacing = self.settings.spacing;
        let request = SizeRequest {
            min_width: sizes.iter().map(|&(w, _)| w.saturating_sub(spacing)).max().unwrap_or(0),
            min_height: sizes.iter().map(|&(_, h)| h.saturating_sub(spacing)).max().unwrap_or(0),
            spacing,
            area: sizes.iter().fold(0_u64, |area, &(w, h)| {
                area.saturating_add(u64::from(w) * u64::from(h))
            }),
        };
        for (width, height) in self.settings.dimensions_constraint.candidates(request) {
            log::debug!("Trying atlas dimensions {width}x{height}");
            let placements = pack_rectangles(self.padded(width), self.padded(height), &sizes);
            if Self::count_unplaced(&sizes, &placements) == 0 {
                let unplaced = self.place_at(glyphs, scale, width, height)?;
                debug_assert_eq!(unplaced, 0, "packing is deterministic");
                return Ok(self.finish(width, height, scale));
            }
        }
        Err(PackError::Infeasible)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::BezPath;

    use super::*;
    use crate::glyph::GlyphIdentifier;
    use crate::outline::tests::rect_path;
    use crate::packer::DimensionsConstraint;
    use crate::units::{DistanceRange, Quantity};

    /// A glyph whose box is `width` by `height` pixels at scale 1 with a 2 px range.
    fn sized_glyph(index: u32, width: u32, height: u32) -> GlyphGeometry {
        let path = rect_path(0.0, 0.0, f64::from(width - 3), f64::from(height - 3));
        GlyphGeometry::from_path(GlyphIdentifier::Index(index), index, &path, 0.0)
    }

    fn unit_packer() -> TightPacker {
        let mut packer = TightPacker::new();
        packer.set_range(Quantity::Pixels(DistanceRange::symmetric(2.0)));
        packer.set_scale(1.0);
        packer
    }

    #[test]
    fn box_sizes_match_construction() {
        let glyphs = [sized_glyph(0, 30, 30), sized_glyph(1, 20, 40)];
        let packer = unit_packer();
        assert_eq!(packer.box_sizes(&glyphs, 1.0).unwrap(), [(30, 30), (20, 40)]);
    }

    #[test]
    fn miter_limit_grows_sharp_boxes() {
        let mut spike = BezPath::new();
        spike.move_to((0.0, 0.0));
        spike.line_to((20.0, 16.0));
        spike.line_to((16.0, 20.0));
        spike.close_path();
        let glyphs = [GlyphGeometry::from_path(GlyphIdentifier::Index(0), 0, &spike, 0.0)];
        let mut packer = unit_packer();
        let (width, height) = packer.box_sizes(&glyphs, 1.0).unwrap()[0];
        packer.set_miter_limit(4.0);
        let (miter_width, miter_height) = packer.box_sizes(&glyphs, 1.0).unwrap()[0];
        assert!(miter_width > width && miter_height > height);
    }

    #[test]
    fn boxes_past_the_largest_atlas_are_infeasible() {
        let glyphs = [sized_glyph(0, 10, 10)];
        let mut packer = unit_packer();
        assert_eq!(packer.box_sizes(&glyphs, 1e10), Err(PackError::Infeasible));
        packer.set_scale(1e10);
        assert_eq!(packer.pack(&mut [sized_glyph(0, 10, 10)]), Err(PackError::Infeasible));
    }

    #[test]
    fn smallest_multiple_of_four_square() {
        let mut glyphs = vec![
            sized_glyph(0, 30, 30),
            sized_glyph(1, 20, 40),
            sized_glyph(2, 25, 25),
            sized_glyph(3, 10, 10),
        ];
        let mut packer = unit_packer();
        packer.set_spacing(2);
        packer.set_dimensions_constraint(DimensionsConstraint::MultipleOfFourSquare);
        let packing = packer.pack(&mut glyphs).unwrap();
        // 56 cannot hold the 30x30 and 25x25 boxes side by side or stacked
        // next to the 20x40 box with 2 px gaps.
        assert_eq!((packing.width, packing.height), (60, 60));
        assert_eq!(packer.dimensions(), Some((60, 60)));
        assert_eq!(packer.scale(), Some(1.0));
    }

    #[test]
    fn oversubscribed_fixed_atlas_reports_unplaced_glyphs() {
        let mut glyphs: Vec<_> = (0..50)
            .map(|index| {
                GlyphGeometry::from_path(
                    GlyphIdentifier::Index(index),
                    index,
                    &rect_path(0.0, 0.0, 1.0, 1.0),
                    1.0,
                )
            })
            .collect();
        let mut packer = TightPacker::new();
        packer.set_dimensions(64, 64);
        packer.set_minimum_scale(10.0);
        let error = packer.pack(&mut glyphs).unwrap_err();
        assert!(matches!(error, PackError::Unplaced(count) if count > 0));
        assert!(error.code() > 0);
        assert!(packer.packing().is_none());
    }

    #[test]
    fn minimum_scale_is_maximized_in_fixed_atlas() {
        let mut glyphs = vec![sized_glyph(0, 10, 10)];
        let mut packer = TightPacker::new();
        packer.set_range(Quantity::Units(DistanceRange::symmetric(0.0)));
        packer.set_dimensions(64, 64);
        packer.set_minimum_scale(1.0);
        let packing = packer.pack(&mut glyphs).unwrap();
        // A 7x7 square needs ceil(7s) + 1 <= 64 pixels.
        assert!(packing.scale > 8.9 && packing.scale <= 9.0);
        let rect = glyphs[0].rect();
        assert!(rect.width <= 64 && rect.height <= 64);
    }

    #[test]
    fn empty_and_whitespace_sets_are_infeasible() {
        let mut packer = unit_packer();
        packer.set_dimensions_constraint(DimensionsConstraint::Square);
        assert_eq!(packer.pack(&mut []), Err(PackError::Infeasible));

        let mut blank = vec![GlyphGeometry::from_path(
            GlyphIdentifier::Codepoint(' ' as u32),
            3,
            &BezPath::new(),
            0.25,
        )];
        assert_eq!(packer.pack(&mut blank), Err(PackError::Infeasible));
    }

    #[test]
    fn zero_area_atlas_is_infeasible() {
        let mut glyphs = vec![sized_glyph(0, 10, 10)];
        let mut packer = unit_packer();
        packer.set_dimensions(0, 64);
        assert_eq!(packer.pack(&mut glyphs), Err(PackError::Infeasible));
    }

    #[test]
    fn whitespace_is_not_placed() {
        let mut glyphs = vec![
            sized_glyph(0, 10, 10),
            GlyphGeometry::from_path(GlyphIdentifier::Index(1), 1, &BezPath::new(), 0.25),
        ];
        let mut packer = unit_packer();
        packer.set_dimensions_constraint(DimensionsConstraint::Square);
        let packing = packer.pack(&mut glyphs).unwrap();
        assert_eq!((packing.width, packing.height), (10, 10));
        assert!(glyphs[1].rect().is_empty());
    }

    #[test]
    fn repacking_is_idempotent() {
        let mut glyphs = vec![
            sized_glyph(0, 17, 12),
            sized_glyph(1, 9, 21),
            sized_glyph(2, 14, 14),
        ];
        let mut packer = unit_packer();
        packer.set_spacing(1);
        packer.set_dimensions(48, 48);
        let first = packer.pack(&mut glyphs).unwrap();
        let rects: Vec<_> = glyphs.iter().map(GlyphGeometry::rect).collect();
        let second = packer.pack(&mut glyphs).unwrap();
        assert_eq!(first, second);
        assert_eq!(rects, glyphs.iter().map(GlyphGeometry::rect).collect::<Vec<_>>());
    }
}
