// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The atlas pipeline: layout, edge coloring and generation.

use crate::bitmap::AtlasImage;
use crate::coloring::{ColoringCost, EdgeColoring, SimpleColoring};
use crate::config::{Configuration, ImageType, PackingStyle};
use crate::dispatch::{ErrorCorrectionDowngrade, GenerationOutcome, GenerationPlan};
use crate::error::AtlasError;
use crate::export::YDirection;
use crate::font::GlyphSet;
use crate::generator::{DistanceGenerator, ReferenceGenerator};
use crate::glyph::GlyphGeometry;
use crate::packer::{
    AtlasPacker, GridLayout, GridPacker, PackError, Packing, ScaleConstraint, TightPacker,
};
use crate::seed::{glyph_seed, SequentialSeeds};
use crate::units::DistanceRange;
use crate::workload::Workload;

/// The resolved geometry of an atlas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasLayout {
    /// The atlas image type.
    pub image_type: ImageType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixels per shape unit, shared by all glyphs.
    pub scale: f64,
    /// Distance range in pixels, shared by all glyphs.
    pub pixel_range: DistanceRange,
    /// Pixels between neighbouring glyph boxes.
    pub spacing: u32,
    /// Vertical orientation used by the sinks.
    pub y_direction: YDirection,
    /// The grid, for grid packing.
    pub grid: Option<GridLayout>,
}

impl AtlasLayout {
    /// Whether some glyph did not fit its grid cell and was cut off.
    pub fn has_cutoff(&self) -> bool {
        self.grid.is_some_and(|grid| grid.cutoff)
    }
}

/// A finished atlas.
#[derive(Debug)]
pub struct Atlas {
    layout: AtlasLayout,
    glyphs: GlyphSet,
    image: AtlasImage,
    outcome: GenerationOutcome,
    downgrade: Option<ErrorCorrectionDowngrade>,
}

impl Atlas {
    /// The resolved geometry.
    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    /// The placed glyphs.
    pub fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    /// The bitmap.
    pub fn image(&self) -> &AtlasImage {
        &self.image
    }

    /// Which glyphs failed to generate.
    ///
    /// Failed glyphs leave their rectangle partially written; whether to keep
    /// the bitmap is up to the caller.
    pub fn outcome(&self) -> &GenerationOutcome {
        &self.outcome
    }

    /// The error correction downgrade forced by the scanline pass, if any.
    pub fn downgrade(&self) -> Option<&ErrorCorrectionDowngrade> {
        self.downgrade.as_ref()
    }

    /// Splits the atlas into its layout, glyphs and bitmap.
    pub fn into_parts(self) -> (AtlasLayout, GlyphSet, AtlasImage) {
        (self.layout, self.glyphs, self.image)
    }
}

/// Runs the pipeline for one [`Configuration`].
///
/// ```
/// use sdf_atlas::kurbo::BezPath;
/// use sdf_atlas::{
///     AtlasGenerator, Configuration, FontMetrics, FontSource, GlyphSet, ImageType, LoadError,
/// };
///
/// struct Diamond;
///
/// impl FontSource for Diamond {
///     fn glyph_index(&self, codepoint: u32) -> Option<u32> {
///         (codepoint == u32::from('x')).then_some(0)
///     }
///
///     fn load_outline(&self, _glyph: u32) -> Result<(BezPath, f64), LoadError> {
///         let mut path = BezPath::new();
///         path.move_to((0.5, 0.0));
///         path.line_to((1.0, 0.5));
///         path.line_to((0.5, 1.0));
///         path.line_to((0.0, 0.5));
///         path.close_path();
///         Ok((path, 1.0))
///     }
///
///     fn metrics(&self) -> FontMetrics {
///         FontMetrics { em_size: 1.0, ..FontMetrics::default() }
///     }
///
///     fn glyph_count(&self) -> u32 {
///         1
///     }
/// }
///
/// let mut glyphs = GlyphSet::new();
/// let charset = "x".chars().collect();
/// glyphs.load_charset(&Diamond, None, &charset, false).unwrap();
///
/// let config = Configuration::builder()
///     .image_type(ImageType::Msdf)
///     .scale(16.0)
///     .build()
///     .unwrap();
/// let atlas = AtlasGenerator::new(config).generate(glyphs).unwrap();
/// assert!(atlas.outcome().is_success());
/// assert_eq!(atlas.image().channels(), 3);
/// ```
pub struct AtlasGenerator {
    config: Configuration,
    coloring: Box<dyn EdgeColoring>,
    generator: Box<dyn DistanceGenerator>,
}

impl core::fmt::Debug for AtlasGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AtlasGenerator {
    /// Creates a pipeline using [`SimpleColoring`] and [`ReferenceGenerator`].
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            coloring: Box::new(SimpleColoring),
            generator: Box::new(ReferenceGenerator),
        }
    }

    /// Replaces the edge coloring heuristic.
    #[must_use]
    pub fn with_coloring(mut self, coloring: impl EdgeColoring + 'static) -> Self {
        self.coloring = Box::new(coloring);
        self
    }

    /// Replaces the distance generator.
    #[must_use]
    pub fn with_generator(mut self, generator: impl DistanceGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Resolves the scale and places every glyph.
    ///
    /// Packing is deterministic: the same configuration and glyphs always give
    /// the same layout.
    pub fn layout(&self, glyphs: &mut GlyphSet) -> Result<AtlasLayout, AtlasError> {
        let settings = self.config.packer_settings();
        let total = glyphs.len();
        let (packing, grid) = self.pack(glyphs.glyphs_mut()).inspect_err(|error| {
            if let PackError::Unplaced(count) = error {
                log::error!("Could not fit {count} of {total} glyphs into the atlas");
            }
        })?;

        if !matches!(settings.scale, ScaleConstraint::Fixed(_)) {
            log::info!("Glyph scale: {} pixels per unit", packing.scale);
        }
        if settings.dimensions.is_none() {
            log::info!("Atlas dimensions: {} x {}", packing.width, packing.height);
        }
        if let Some(grid) = &grid {
            log::info!(
                "Grid cell dimensions: {} x {}, {} columns, {} rows",
                grid.cell_width,
                grid.cell_height,
                grid.columns,
                grid.rows
            );
            if grid.cutoff {
                log::warn!("Grid cell too small to fit all glyphs, some may be cut off");
            }
        }

        Ok(AtlasLayout {
            image_type: self.config.image_type(),
            width: packing.width,
            height: packing.height,
            scale: packing.scale,
            pixel_range: packing.pixel_range,
            spacing: settings.spacing,
            y_direction: self.config.y_direction(),
            grid,
        })
    }

    fn pack(
        &self,
        glyphs: &mut [GlyphGeometry],
    ) -> Result<(Packing, Option<GridLayout>), PackError> {
        let settings = *self.config.packer_settings();
        match self.config.packing() {
            PackingStyle::Tight => {
                let mut packer = TightPacker::new();
                *packer.settings_mut() = settings;
                Ok((packer.pack(glyphs)?, None))
            }
            PackingStyle::Grid(options) => {
                let mut packer = GridPacker::new();
                *packer.settings_mut() = settings;
                match options.cell {
                    Some((width, height)) => packer.set_cell_dimensions(width, height),
                    None => packer.set_cell_dimensions_constraint(options.cell_constraint),
                }
                if let Some(columns) = options.columns {
                    packer.set_columns(columns);
                }
                packer.set_fixed_origin(options.fixed_origin_x, options.fixed_origin_y);
                let packing = packer.pack(glyphs)?;
                Ok((packing, packer.layout().copied()))
            }
        }
    }

    /// Lays out, colors and generates every glyph.
    ///
    /// The bitmap only depends on the configuration and the glyphs, not on the
    /// number of threads.
    pub fn generate(&self, mut glyphs: GlyphSet) -> Result<Atlas, AtlasError> {
        let layout = self.layout(&mut glyphs)?;
        let plan = GenerationPlan::new(&self.config);
        let workload = Workload::new(self.config.threads());

        if plan.kind().is_multi_channel() {
            self.color_edges(glyphs.glyphs_mut(), &workload);
        }

        let (image, outcome) = plan.generate(
            &*self.generator,
            glyphs.glyphs(),
            &workload,
            layout.width,
            layout.height,
        )?;
        if !outcome.is_success() {
            let failed: Vec<usize> = outcome.failed_glyphs().collect();
            log::warn!("Failed to generate {} glyphs: {failed:?}", failed.len());
        }

        Ok(Atlas {
            layout,
            glyphs,
            image,
            outcome,
            downgrade: plan.downgrade().copied(),
        })
    }

    /// Colors edges with per-glyph seeds.
    ///
    /// Expensive heuristics run on the workload with independent seeds; cheap
    /// ones run on this thread with the running seed.
    fn color_edges(&self, glyphs: &mut [GlyphGeometry], workload: &Workload) {
        let coloring: &dyn EdgeColoring = &*self.coloring;
        let angle = self.config.angle_threshold();
        let seed = self.config.seed();
        match coloring.cost() {
            ColoringCost::Expensive => {
                workload.run_each(glyphs, |index, glyph| {
                    glyph.color_edges(coloring, angle, glyph_seed(seed, index));
                    true
                });
            }
            ColoringCost::Cheap => {
                for (glyph, running) in glyphs.iter_mut().zip(SequentialSeeds::new(seed)) {
                    glyph.color_edges(coloring, angle, running);
                }
            }
        }
    }
}
