// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable run configuration and its builder.

use crate::error::ConfigError;
use crate::export::YDirection;
use crate::generator::{ErrorCorrectionConfig, GeneratorAttributes, GeneratorKind};
use crate::packer::{DimensionsConstraint, PackerSettings, ScaleConstraint};
use crate::units::{DistanceRange, Padding, PaddingSet, Quantity};

/// Minimum scale, in pixels per shape unit, used when neither a scale nor the
/// atlas dimensions are given.
pub const DEFAULT_SIZE: f64 = 32.0;

/// Largest angle between adjacent edges, in radians, still considered smooth
/// by edge coloring.
pub const DEFAULT_ANGLE_THRESHOLD: f64 = 3.0;

/// Width of the distance range in pixels when none is given.
pub const DEFAULT_PIXEL_RANGE: f64 = 2.0;

/// Miter limit of the pseudo and multi-channel distance fields when none is given.
pub const DEFAULT_MITER_LIMIT: f64 = 1.0;

/// The kind of image stored in the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Binary coverage.
    HardMask,
    /// Anti-aliased coverage.
    SoftMask,
    /// True signed distance field.
    Sdf,
    /// Signed pseudo-distance field.
    Psdf,
    /// Multi-channel signed distance field.
    Msdf,
    /// Multi-channel signed distance field with true distance in alpha.
    #[default]
    Mtsdf,
}

impl ImageType {
    /// The generator that produces this image type.
    pub const fn generator_kind(self) -> GeneratorKind {
        match self {
            Self::HardMask => GeneratorKind::Scanline,
            Self::SoftMask | Self::Sdf => GeneratorKind::Sdf,
            Self::Psdf => GeneratorKind::Psdf,
            Self::Msdf => GeneratorKind::Msdf,
            Self::Mtsdf => GeneratorKind::Mtsdf,
        }
    }

    /// Samples per pixel.
    pub const fn channels(self) -> usize {
        self.generator_kind().channels()
    }

    /// Whether this is a coverage mask rather than a distance field.
    pub const fn is_mask(self) -> bool {
        matches!(self, Self::HardMask | Self::SoftMask)
    }

    /// The lowercase name of this type, such as `mtsdf`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::HardMask => "hardmask",
            Self::SoftMask => "softmask",
            Self::Sdf => "sdf",
            Self::Psdf => "psdf",
            Self::Msdf => "msdf",
            Self::Mtsdf => "mtsdf",
        }
    }
}

/// How samples are stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleStorage {
    /// 8-bit normalized.
    #[default]
    Byte,
    /// 32-bit floating point.
    Float,
}

/// Grid-specific packing options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridOptions {
    /// Fixed cell dimensions in pixels, spacing included.
    pub cell: Option<(u32, u32)>,
    /// Constraint the derived cell is snapped to when no cell is fixed.
    pub cell_constraint: DimensionsConstraint,
    /// Fixed number of columns.
    pub columns: Option<u32>,
    /// Pin the glyph origin horizontally.
    pub fixed_origin_x: bool,
    /// Pin the glyph origin vertically.
    pub fixed_origin_y: bool,
}

/// The packing strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PackingStyle {
    /// Bin-pack every glyph's own box.
    #[default]
    Tight,
    /// Give every glyph a cell of the same size.
    Grid(GridOptions),
}

/// Everything a run needs, resolved once before packing.
///
/// Created by [`ConfigurationBuilder::build`] and never changed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    image_type: ImageType,
    storage: SampleStorage,
    packing: PackingStyle,
    packer: PackerSettings,
    angle_threshold: f64,
    seed: u64,
    threads: usize,
    generator: GeneratorAttributes,
    error_correction_explicit: bool,
    y_direction: YDirection,
}

impl Configuration {
    /// Starts a builder with default settings.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// The atlas image type.
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// The sample storage type.
    pub fn storage(&self) -> SampleStorage {
        self.storage
    }

    /// The packing strategy.
    pub fn packing(&self) -> &PackingStyle {
        &self.packing
    }

    /// Settings handed to the packer.
    pub fn packer_settings(&self) -> &PackerSettings {
        &self.packer
    }

    /// Corner angle threshold for edge coloring, in radians.
    pub fn angle_threshold(&self) -> f64 {
        self.angle_threshold
    }

    /// Global edge coloring seed. `0` disables randomization.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Requested worker thread count; `0` means all hardware threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Generator settings as requested.
    pub fn generator_attributes(&self) -> &GeneratorAttributes {
        &self.generator
    }

    /// Whether the error correction settings were chosen explicitly.
    pub fn is_error_correction_explicit(&self) -> bool {
        self.error_correction_explicit
    }

    /// Vertical orientation used by the sinks.
    pub fn y_direction(&self) -> YDirection {
        self.y_direction
    }
}

/// Assembles a [`Configuration`].
///
/// Setters consume and return the builder. Conflicting choices replace each
/// other: fixed dimensions replace a dimensions constraint and a fixed scale
/// replaces a minimum scale, and vice versa.
#[derive(Clone, Debug)]
#[must_use]
pub struct ConfigurationBuilder {
    image_type: ImageType,
    storage: SampleStorage,
    packing: PackingStyle,
    dimensions: Option<(u32, u32)>,
    dimensions_constraint: DimensionsConstraint,
    scale: Option<ScaleConstraint>,
    spacing: u32,
    range: Option<Quantity<DistanceRange>>,
    padding: PaddingSet,
    align_origin_x: bool,
    align_origin_y: bool,
    miter_limit: Option<f64>,
    angle_threshold: f64,
    seed: u64,
    threads: usize,
    overlap_support: bool,
    scanline_pass: bool,
    error_correction: Option<ErrorCorrectionConfig>,
    y_direction: YDirection,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            image_type: ImageType::default(),
            storage: SampleStorage::default(),
            packing: PackingStyle::default(),
            dimensions: None,
            dimensions_constraint: DimensionsConstraint::None,
            scale: None,
            spacing: 0,
            range: None,
            padding: PaddingSet::default(),
            align_origin_x: false,
            align_origin_y: false,
            miter_limit: None,
            angle_threshold: DEFAULT_ANGLE_THRESHOLD,
            seed: 0,
            threads: 0,
            overlap_support: true,
            scanline_pass: false,
            error_correction: None,
            y_direction: YDirection::default(),
        }
    }
}

impl ConfigurationBuilder {
    /// Sets the image type.
    pub fn image_type(mut self, image_type: ImageType) -> Self {
        self.image_type = image_type;
        self
    }

    /// Sets the sample storage type.
    pub fn storage(mut self, storage: SampleStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Sets the packing strategy.
    pub fn packing(mut self, packing: PackingStyle) -> Self {
        self.packing = packing;
        self
    }

    /// Fixes the atlas dimensions.
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    /// Searches for the smallest atlas satisfying `constraint`.
    pub fn dimensions_constraint(mut self, constraint: DimensionsConstraint) -> Self {
        self.dimensions = None;
        self.dimensions_constraint = constraint;
        self
    }

    /// Fixes the scale in pixels per shape unit.
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(ScaleConstraint::Fixed(scale));
        self
    }

    /// Sets the minimum scale in pixels per shape unit.
    pub fn minimum_scale(mut self, scale: f64) -> Self {
        self.scale = Some(ScaleConstraint::Minimum(scale));
        self
    }

    /// Sets the spacing between glyph boxes in pixels.
    pub fn spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the distance range. Ignored for mask image types.
    ///
    /// An empty range, with equal bounds, selects the default range.
    pub fn range(mut self, range: Quantity<DistanceRange>) -> Self {
        self.range = Some(range);
        self
    }

    /// Sets inner padding, part of the distance field.
    pub fn inner_padding(mut self, padding: Quantity<Padding>) -> Self {
        match padding {
            Quantity::Units(padding) => self.padding.inner_units = padding,
            Quantity::Pixels(padding) => self.padding.inner_pixels = padding,
        }
        self
    }

    /// Sets outer padding, which only reserves atlas space.
    pub fn outer_padding(mut self, padding: Quantity<Padding>) -> Self {
        match padding {
            Quantity::Units(padding) => self.padding.outer_units = padding,
            Quantity::Pixels(padding) => self.padding.outer_pixels = padding,
        }
        self
    }

    /// Snaps glyph origins to the pixel grid per axis.
    pub fn origin_pixel_alignment(mut self, align_x: bool, align_y: bool) -> Self {
        self.align_origin_x = align_x;
        self.align_origin_y = align_y;
        self
    }

    /// Sets how far convex corners may grow glyph boxes along their bisector,
    /// relative to the outer range.
    ///
    /// Defaults to 1 for the pseudo and multi-channel distance fields. Masks and
    /// true distance fields never use it.
    pub fn miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = Some(miter_limit);
        self
    }

    /// Sets the corner angle threshold for edge coloring, in radians.
    pub fn angle_threshold(mut self, angle: f64) -> Self {
        self.angle_threshold = angle;
        self
    }

    /// Sets the global edge coloring seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the worker thread count; `0` uses all hardware threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Resolves overlapping contours with the fill rule.
    pub fn overlap_support(mut self, enabled: bool) -> Self {
        self.overlap_support = enabled;
        self
    }

    /// Corrects sample signs from the fill rule after generation.
    pub fn scanline_pass(mut self, enabled: bool) -> Self {
        self.scanline_pass = enabled;
        self
    }

    /// Sets the error correction explicitly.
    pub fn error_correction(mut self, config: ErrorCorrectionConfig) -> Self {
        self.error_correction = Some(config);
        self
    }

    /// Sets the vertical orientation used by the sinks.
    pub fn y_direction(mut self, direction: YDirection) -> Self {
        self.y_direction = direction;
        self
    }

    /// Validates the settings and resolves defaults.
    pub fn build(self) -> Result<Configuration, ConfigError> {
        self.validate()?;

        let fixed_cell = matches!(
            self.packing,
            PackingStyle::Grid(GridOptions { cell: Some(_), .. })
        );
        let mut dimensions_constraint = self.dimensions_constraint;
        if self.packing == PackingStyle::Tight
            && self.dimensions.is_none()
            && dimensions_constraint == DimensionsConstraint::None
        {
            dimensions_constraint = DimensionsConstraint::MultipleOfFourSquare;
        }

        let scale = match self.scale {
            Some(scale) => scale,
            None if self.dimensions.is_none() && !fixed_cell => {
                log::info!("No atlas size or glyph scale given, minimum scale {DEFAULT_SIZE}");
                ScaleConstraint::Minimum(DEFAULT_SIZE)
            }
            None => ScaleConstraint::default(),
        };

        let default_range = Quantity::Pixels(DistanceRange::symmetric(DEFAULT_PIXEL_RANGE));
        let range = match self.range {
            _ if self.image_type.is_mask() => Quantity::Pixels(DistanceRange::symmetric(1.0)),
            Some(Quantity::Units(range) | Quantity::Pixels(range)) if range.width() == 0.0 => {
                log::info!("Empty distance range, using {DEFAULT_PIXEL_RANGE} pixels");
                default_range
            }
            Some(range) => range,
            None => default_range,
        };

        let miter_limit = match self.image_type {
            ImageType::Psdf | ImageType::Msdf | ImageType::Mtsdf => {
                self.miter_limit.unwrap_or(DEFAULT_MITER_LIMIT)
            }
            _ => 0.0,
        };

        let packer = PackerSettings {
            dimensions: self.dimensions,
            dimensions_constraint,
            scale,
            spacing: self.spacing,
            range,
            padding: self.padding,
            align_origin_x: self.align_origin_x,
            align_origin_y: self.align_origin_y,
            miter_limit,
        };

        Ok(Configuration {
            image_type: self.image_type,
            storage: self.storage,
            packing: self.packing,
            packer,
            angle_threshold: self.angle_threshold,
            seed: self.seed,
            threads: self.threads,
            generator: GeneratorAttributes {
                overlap_support: self.overlap_support,
                scanline_pass: self.scanline_pass,
                error_correction: self.error_correction.unwrap_or_default(),
            },
            error_correction_explicit: self.error_correction.is_some(),
            y_direction: self.y_direction,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ScaleConstraint::Fixed(scale) | ScaleConstraint::Minimum(scale)) = self.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidScale(scale));
            }
        }
        if let Some((width, height)) = self.dimensions {
            if width == 0 || height == 0 {
                return Err(ConfigError::InvalidDimensions { width, height });
            }
        }
        if let PackingStyle::Grid(grid) = &self.packing {
            if let Some((width, height)) = grid.cell {
                if width == 0 || height == 0 {
                    return Err(ConfigError::InvalidCell { width, height });
                }
            }
            if grid.columns == Some(0) {
                return Err(ConfigError::ZeroColumns);
            }
        }
        if let Some(Quantity::Units(range) | Quantity::Pixels(range)) = self.range {
            let valid = range.lower.is_finite() && range.upper.is_finite();
            if !valid || range.lower > range.upper {
                return Err(ConfigError::InvalidRange {
                    lower: range.lower,
                    upper: range.upper,
                });
            }
        }
        let paddings = [
            self.padding.inner_units,
            self.padding.inner_pixels,
            self.padding.outer_units,
            self.padding.outer_pixels,
        ];
        let valid_padding = paddings.iter().all(|padding| {
            [padding.left, padding.bottom, padding.right, padding.top]
                .iter()
                .all(|value| value.is_finite())
        });
        if !valid_padding {
            return Err(ConfigError::InvalidPadding);
        }
        if let Some(miter_limit) = self.miter_limit {
            if !miter_limit.is_finite() || miter_limit < 0.0 {
                return Err(ConfigError::InvalidMiterLimit(miter_limit));
            }
        }
        if !self.angle_threshold.is_finite() || self.angle_threshold <= 0.0 {
            return Err(ConfigError::InvalidAngleThreshold(self.angle_threshold));
        }
        Ok(())
    }
}
