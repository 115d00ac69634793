// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filling the atlas bitmap, one task per glyph.

use core::fmt;

use crate::bitmap::{AtlasBitmap, AtlasImage, GlyphRegion, PixelRect, Sample};
use crate::config::{Configuration, ImageType, SampleStorage};
use crate::error::{GenerateError, RegionError};
use crate::generator::{
    scanline_sign_correction, DistanceCheckMode, DistanceGenerator, ErrorCorrectionConfig,
    ErrorCorrectionMode, ErrorCorrectionPreset, GeneratorAttributes, GeneratorKind, SampleTile,
};
use crate::glyph::GlyphGeometry;
use crate::workload::Workload;

/// Distance checks that were turned off because the scanline pass already
/// corrects signs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorCorrectionDowngrade {
    /// The explicitly requested settings.
    pub requested: ErrorCorrectionConfig,
    /// The check-free preset used instead.
    pub fallback: ErrorCorrectionPreset,
}

impl fmt::Display for ErrorCorrectionDowngrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "distance checks are disabled by the scanline pass, using error correction \"{}\"",
            self.fallback.name()
        )
    }
}

/// Glyphs whose generation failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationOutcome {
    failures: Vec<(usize, GenerateError)>,
}

impl GenerationOutcome {
    /// Whether every glyph was generated.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failed glyphs, by position in the glyph list, in increasing order.
    pub fn failures(&self) -> &[(usize, GenerateError)] {
        &self.failures
    }

    /// Positions of the failed glyphs.
    pub fn failed_glyphs(&self) -> impl Iterator<Item = usize> + '_ {
        self.failures.iter().map(|&(glyph, _)| glyph)
    }
}

type FillFn = fn(
    &GenerationPlan,
    &dyn DistanceGenerator,
    &[GlyphGeometry],
    &Workload,
    (u32, u32),
) -> Result<(AtlasImage, GenerationOutcome), RegionError>;

/// The concrete way one configuration is generated: sample type, channel
/// count and generator, chosen once.
#[derive(Clone, Copy)]
struct Strategy {
    kind: GeneratorKind,
    fill: FillFn,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl Strategy {
    fn select(image_type: ImageType, storage: SampleStorage) -> Self {
        let fill: FillFn = match storage {
            SampleStorage::Byte => fill::<u8>,
            SampleStorage::Float => fill::<f32>,
        };
        Self {
            kind: image_type.generator_kind(),
            fill,
        }
    }
}

/// The resolved generation step of a run.
#[derive(Clone, Copy, Debug)]
pub struct GenerationPlan {
    image_type: ImageType,
    storage: SampleStorage,
    attributes: GeneratorAttributes,
    downgrade: Option<ErrorCorrectionDowngrade>,
    strategy: Strategy,
}

impl GenerationPlan {
    /// Resolves the generation step from a configuration.
    ///
    /// With the scanline pass enabled, distance checks are turned off. If the
    /// error correction was chosen explicitly, this is logged as a warning and
    /// reported by [`downgrade`](Self::downgrade).
    pub fn new(config: &Configuration) -> Self {
        let mut attributes = *config.generator_attributes();
        let mut downgrade = None;
        let requested = attributes.error_correction;
        if attributes.scanline_pass && requested.distance_check != DistanceCheckMode::DoNotCheck {
            attributes.error_correction.distance_check = DistanceCheckMode::DoNotCheck;
            if config.is_error_correction_explicit() {
                let fallback = match requested.mode {
                    ErrorCorrectionMode::Disabled => ErrorCorrectionPreset::Disabled,
                    ErrorCorrectionMode::Indiscriminate => ErrorCorrectionPreset::DistanceFast,
                    ErrorCorrectionMode::EdgePriority => ErrorCorrectionPreset::AutoFast,
                    ErrorCorrectionMode::EdgeOnly => ErrorCorrectionPreset::EdgeFast,
                };
                let notice = ErrorCorrectionDowngrade {
                    requested,
                    fallback,
                };
                log::warn!("{notice}");
                downgrade = Some(notice);
            }
        }
        Self {
            image_type: config.image_type(),
            storage: config.storage(),
            attributes,
            downgrade,
            strategy: Strategy::select(config.image_type(), config.storage()),
        }
    }

    /// The atlas image type.
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// The sample storage type.
    pub fn storage(&self) -> SampleStorage {
        self.storage
    }

    /// The generator run for every glyph.
    pub fn kind(&self) -> GeneratorKind {
        self.strategy.kind
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.strategy.kind.channels()
    }

    /// Generator settings after resolution.
    pub fn attributes(&self) -> &GeneratorAttributes {
        &self.attributes
    }

    /// The error correction downgrade, if one happened.
    pub fn downgrade(&self) -> Option<&ErrorCorrectionDowngrade> {
        self.downgrade.as_ref()
    }

    /// Generates every glyph into a new `width` by `height` bitmap.
    ///
    /// Glyph boxes must already be placed. Each glyph is one task on
    /// `workload`, writing only to its own rectangle; a glyph that fails leaves
    /// its rectangle partially written and is reported in the outcome.
    pub fn generate(
        &self,
        generator: &dyn DistanceGenerator,
        glyphs: &[GlyphGeometry],
        workload: &Workload,
        width: u32,
        height: u32,
    ) -> Result<(AtlasImage, GenerationOutcome), RegionError> {
        (self.strategy.fill)(self, generator, glyphs, workload, (width, height))
    }

    fn render<T: Sample>(
        &self,
        generator: &dyn DistanceGenerator,
        glyph: &GlyphGeometry,
        region: &mut GlyphRegion<'_, T>,
    ) -> Result<(), GenerateError> {
        let rect = region.rect();
        let kind = self.kind();
        let mut tile = SampleTile::new(rect.width, rect.height, kind.channels());
        generator.generate(glyph, kind, &self.attributes, &mut tile)?;
        if self.attributes.scanline_pass {
            scanline_sign_correction(glyph, kind, &mut tile);
        }
        for y in 0..rect.height {
            for (sample, &value) in region.row_mut(y).iter_mut().zip(tile.row(y)) {
                *sample = T::from_normalized(value);
            }
        }
        Ok(())
    }
}

struct GlyphTask<'a, T> {
    region: GlyphRegion<'a, T>,
    error: Option<GenerateError>,
}

fn fill<T: Sample>(
    plan: &GenerationPlan,
    generator: &dyn DistanceGenerator,
    glyphs: &[GlyphGeometry],
    workload: &Workload,
    (width, height): (u32, u32),
) -> Result<(AtlasImage, GenerationOutcome), RegionError>
where
    AtlasImage: From<AtlasBitmap<T>>,
{
    let mut bitmap = AtlasBitmap::<T>::new(width, height, plan.channels());
    let rects: Vec<PixelRect> = glyphs.iter().map(GlyphGeometry::rect).collect();
    let mut failures = Vec::new();
    {
        let mut tasks: Vec<GlyphTask<'_, T>> = bitmap
            .glyph_regions(&rects)?
            .into_iter()
            .map(|region| GlyphTask {
                region,
                error: None,
            })
            .collect();
        let success = workload.run_each(&mut tasks, |index, task| {
            if task.region.is_empty() {
                return true;
            }
            match plan.render(generator, &glyphs[index], &mut task.region) {
                Ok(()) => true,
                Err(error) => {
                    task.error = Some(error);
                    false
                }
            }
        });
        if !success {
            failures.extend(
                tasks
                    .iter()
                    .enumerate()
                    .filter_map(|(index, task)| task.error.map(|error| (index, error))),
            );
        }
    }
    Ok((AtlasImage::from(bitmap), GenerationOutcome { failures }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{GlyphAttributes, GlyphIdentifier};
    use crate::outline::tests::rect_path;
    use crate::units::{DistanceRange, Padding};

    struct FailingGenerator;

    impl DistanceGenerator for FailingGenerator {
        fn generate(
            &self,
            glyph: &GlyphGeometry,
            _kind: GeneratorKind,
            _attributes: &GeneratorAttributes,
            tile: &mut SampleTile,
        ) -> Result<(), GenerateError> {
            if glyph.index() == 1 {
                return Err(GenerateError::DegenerateBox);
            }
            for y in 0..tile.height() {
                for x in 0..tile.width() {
                    tile.pixel_mut(x, y).fill(1.0);
                }
            }
            Ok(())
        }
    }

    fn placed_glyphs() -> Vec<GlyphGeometry> {
        let attributes = GlyphAttributes {
            scale: 4.0,
            range: DistanceRange::symmetric(0.5),
            inner_padding: Padding::ZERO,
            outer_padding: Padding::ZERO,
            align_origin_x: false,
            align_origin_y: false,
            miter_limit: 0.0,
        };
        (0..3)
            .map(|index| {
                let mut glyph = GlyphGeometry::from_path(
                    GlyphIdentifier::Index(index),
                    index,
                    &rect_path(0.0, 0.0, 1.0, 1.0),
                    1.0,
                );
                glyph.wrap_box(&attributes);
                glyph.place_box(index * 8, 0);
                glyph
            })
            .collect()
    }

    fn explicit(preset: ErrorCorrectionPreset, scanline: bool) -> Configuration {
        Configuration::builder()
            .error_correction(preset.config())
            .scanline_pass(scanline)
            .build()
            .unwrap()
    }

    #[test]
    fn scanline_pass_downgrades_explicit_checks() {
        let plan = GenerationPlan::new(&explicit(ErrorCorrectionPreset::EdgeFull, true));
        assert_eq!(
            plan.downgrade().map(|downgrade| downgrade.fallback),
            Some(ErrorCorrectionPreset::EdgeFast)
        );
        assert_eq!(
            plan.attributes().error_correction.distance_check,
            DistanceCheckMode::DoNotCheck
        );
        assert_eq!(
            plan.attributes().error_correction.mode,
            ErrorCorrectionMode::EdgeOnly
        );
    }

    #[test]
    fn implicit_checks_are_dropped_silently() {
        let config = Configuration::builder().scanline_pass(true).build().unwrap();
        let plan = GenerationPlan::new(&config);
        assert!(plan.downgrade().is_none());
        assert_eq!(
            plan.attributes().error_correction.distance_check,
            DistanceCheckMode::DoNotCheck
        );
    }

    #[test]
    fn check_free_modes_are_not_downgraded() {
        let plan = GenerationPlan::new(&explicit(ErrorCorrectionPreset::DistanceFast, true));
        assert!(plan.downgrade().is_none());
        let plan = GenerationPlan::new(&explicit(ErrorCorrectionPreset::AutoFull, false));
        assert!(plan.downgrade().is_none());
        assert_eq!(
            plan.attributes().error_correction.distance_check,
            DistanceCheckMode::AlwaysCheck
        );
    }

    #[test]
    fn strategy_follows_image_type_and_storage() {
        let config = Configuration::builder()
            .image_type(ImageType::SoftMask)
            .storage(SampleStorage::Float)
            .build()
            .unwrap();
        let plan = GenerationPlan::new(&config);
        assert_eq!(plan.kind(), GeneratorKind::Sdf);
        assert_eq!(plan.channels(), 1);
        let glyphs = placed_glyphs();
        let (image, outcome) = plan
            .generate(&FailingGenerator, &glyphs[..1], &Workload::new(1), 8, 8)
            .unwrap();
        assert!(outcome.is_success());
        assert!(matches!(image, AtlasImage::Float(_)));
    }

    #[test]
    fn failures_do_not_stop_other_glyphs() {
        let config = Configuration::builder()
            .image_type(ImageType::Msdf)
            .build()
            .unwrap();
        let plan = GenerationPlan::new(&config);
        let glyphs = placed_glyphs();
        for threads in [1, 3] {
            let (image, outcome) = plan
                .generate(&FailingGenerator, &glyphs, &Workload::new(threads), 24, 8)
                .unwrap();
            assert_eq!(outcome.failed_glyphs().collect::<Vec<_>>(), [1]);
            let AtlasImage::Byte(bitmap) = image else {
                panic!("expected a byte atlas");
            };
            assert_eq!(bitmap.pixel(0, 0), [255, 255, 255]);
            assert_eq!(bitmap.pixel(16, 0), [255, 255, 255]);
            assert_eq!(bitmap.pixel(8, 0), [0, 0, 0]);
        }
    }

    #[test]
    fn overlapping_boxes_are_rejected_before_generation() {
        let mut glyphs = placed_glyphs();
        glyphs[1].place_box(2, 0);
        let plan = GenerationPlan::new(&Configuration::builder().build().unwrap());
        assert!(matches!(
            plan.generate(&FailingGenerator, &glyphs, &Workload::new(2), 24, 8),
            Err(RegionError::Overlap { .. })
        ));
    }
}
