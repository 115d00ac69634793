// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quantities expressed either in shape units or in output pixels.

use core::ops::{Add, Mul};

/// A value expressed in exactly one of two unit systems.
///
/// Shape units (such as ems) grow proportionally with the atlas scale, while
/// pixel quantities stay constant. Every quantity must be resolved to pixels
/// (or to shape units) for a concrete scale before packing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quantity<T> {
    /// A value in shape units.
    Units(T),
    /// A value in output pixels.
    Pixels(T),
}

impl<T> Quantity<T>
where
    T: Mul<f64, Output = T> + Copy,
{
    /// Resolves the quantity to pixels for the given scale (pixels per shape unit).
    pub fn to_pixels(self, scale: f64) -> T {
        match self {
            Self::Units(value) => value * scale,
            Self::Pixels(value) => value,
        }
    }

    /// Resolves the quantity to shape units for the given scale (pixels per shape unit).
    pub fn to_units(self, scale: f64) -> T {
        match self {
            Self::Units(value) => value,
            Self::Pixels(value) => value * (1.0 / scale),
        }
    }
}

/// The band around an outline over which distances are encoded.
///
/// `lower` is the outermost representable (negative) distance and `upper`
/// the innermost one. The default range is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistanceRange {
    /// Outermost representable distance, usually negative.
    pub lower: f64,
    /// Innermost representable distance, usually positive.
    pub upper: f64,
}

impl DistanceRange {
    /// A range of the given total width centered on the outline.
    pub const fn symmetric(width: f64) -> Self {
        Self {
            lower: -0.5 * width,
            upper: 0.5 * width,
        }
    }

    /// A range with explicit outermost and innermost distances.
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Total width of the range.
    pub fn width(self) -> f64 {
        self.upper - self.lower
    }

    /// Whether the range encodes nothing.
    pub fn is_empty(self) -> bool {
        self.lower == self.upper
    }
}

impl Mul<f64> for DistanceRange {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }
}

/// Extra space around a glyph, per side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    /// Padding on the left side.
    pub left: f64,
    /// Padding on the bottom side.
    pub bottom: f64,
    /// Padding on the right side.
    pub right: f64,
    /// Padding on the top side.
    pub top: f64,
}

impl Padding {
    /// No padding.
    pub const ZERO: Self = Self::uniform(0.0);

    /// The same padding on every side.
    pub const fn uniform(value: f64) -> Self {
        Self {
            left: value,
            bottom: value,
            right: value,
            top: value,
        }
    }

    /// Asymmetric padding, in the order left, bottom, right, top.
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }
}

impl Add for Padding {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            bottom: self.bottom + other.bottom,
            right: self.right + other.right,
            top: self.top + other.top,
        }
    }
}

impl Mul<f64> for Padding {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            bottom: self.bottom * factor,
            right: self.right * factor,
            top: self.top * factor,
        }
    }
}

/// The four independent glyph paddings.
///
/// Inner padding is part of the distance field, outer padding only reserves
/// space in the atlas. Each can be given in shape units and in pixels at the
/// same time; the two contributions add up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaddingSet {
    /// Inner padding in shape units.
    pub inner_units: Padding,
    /// Inner padding in pixels.
    pub inner_pixels: Padding,
    /// Outer padding in shape units.
    pub outer_units: Padding,
    /// Outer padding in pixels.
    pub outer_pixels: Padding,
}

impl PaddingSet {
    /// Total inner padding in shape units at the given scale.
    pub fn inner(&self, scale: f64) -> Padding {
        Quantity::Units(self.inner_units).to_units(scale)
            + Quantity::Pixels(self.inner_pixels).to_units(scale)
    }

    /// Total outer padding in shape units at the given scale.
    pub fn outer(&self, scale: f64) -> Padding {
        Quantity::Units(self.outer_units).to_units(scale)
            + Quantity::Pixels(self.outer_pixels).to_units(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_quantities_scale_and_pixel_quantities_do_not() {
        let units = Quantity::Units(DistanceRange::symmetric(0.125));
        let pixels = Quantity::Pixels(DistanceRange::symmetric(4.0));
        assert_eq!(units.to_pixels(32.0).width(), 4.0);
        assert_eq!(units.to_pixels(64.0).width(), 8.0);
        assert_eq!(pixels.to_pixels(32.0).width(), 4.0);
        assert_eq!(pixels.to_pixels(64.0).width(), 4.0);
        assert_eq!(pixels.to_units(32.0).width(), 0.125);
    }

    #[test]
    fn padding_contributions_add_up() {
        let set = PaddingSet {
            inner_units: Padding::uniform(0.25),
            inner_pixels: Padding::uniform(2.0),
            ..PaddingSet::default()
        };
        let inner = set.inner(8.0);
        assert_eq!(inner, Padding::uniform(0.5));
        assert_eq!(set.outer(8.0), Padding::ZERO);
    }

    #[test]
    fn asymmetric_range() {
        let range = DistanceRange::new(-3.0, 1.0);
        assert_eq!(range.width(), 4.0);
        assert!(!range.is_empty());
        assert!(DistanceRange::symmetric(0.0).is_empty());
    }
}
