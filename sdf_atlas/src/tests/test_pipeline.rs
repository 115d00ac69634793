// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{rects, square_glyphs, RecordingColoring};
use crate::packer::DimensionsConstraint;
use crate::seed::glyph_seed;
use crate::{
    AtlasError, AtlasGenerator, AtlasImage, Configuration, ErrorCorrectionPreset, GridOptions,
    ImageType, PackError, PackingStyle, PixelRect, SampleStorage,
};

#[test]
fn bitmap_does_not_depend_on_thread_count() {
    let atlases: Vec<_> = [1, 2, 8]
        .into_iter()
        .map(|threads| {
            let config = Configuration::builder()
                .image_type(ImageType::Mtsdf)
                .scale(24.0)
                .seed(7)
                .threads(threads)
                .build()
                .unwrap();
            AtlasGenerator::new(config)
                .generate(square_glyphs(8))
                .unwrap()
        })
        .collect();
    for atlas in &atlases[1..] {
        assert_eq!(atlas.layout(), atlases[0].layout());
        assert_eq!(rects(atlas.glyphs()), rects(atlases[0].glyphs()));
        assert_eq!(atlas.image(), atlases[0].image());
    }
    assert!(atlases[0].outcome().is_success());
}

#[test]
fn expensive_coloring_seeds_do_not_depend_on_thread_count() {
    let mut expected: Vec<u64> = (0..6).map(|index| glyph_seed(11, index)).collect();
    expected.sort_unstable();
    for threads in [1, 4] {
        let coloring = RecordingColoring::default();
        let config = Configuration::builder()
            .image_type(ImageType::Msdf)
            .scale(16.0)
            .seed(11)
            .threads(threads)
            .build()
            .unwrap();
        AtlasGenerator::new(config)
            .with_coloring(coloring.clone())
            .generate(square_glyphs(6))
            .unwrap();
        assert_eq!(coloring.sorted_seeds(), expected);
    }
}

#[test]
fn zero_seed_is_not_randomized() {
    let coloring = RecordingColoring::default();
    let config = Configuration::builder()
        .image_type(ImageType::Msdf)
        .scale(16.0)
        .seed(0)
        .build()
        .unwrap();
    AtlasGenerator::new(config)
        .with_coloring(coloring.clone())
        .generate(square_glyphs(5))
        .unwrap();
    assert_eq!(coloring.sorted_seeds(), [0; 5]);
}

#[test]
fn single_channel_types_skip_coloring() {
    let coloring = RecordingColoring::default();
    let config = Configuration::builder()
        .image_type(ImageType::Psdf)
        .scale(16.0)
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(config)
        .with_coloring(coloring.clone())
        .generate(square_glyphs(3))
        .unwrap();
    assert!(coloring.sorted_seeds().is_empty());
    assert_eq!(atlas.image().channels(), 1);
}

#[test]
fn packed_rects_keep_spacing_and_stay_inside() {
    let spacing = 3;
    let mut glyphs = square_glyphs(12);
    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .scale(20.0)
        .spacing(spacing)
        .build()
        .unwrap();
    let layout = AtlasGenerator::new(config).layout(&mut glyphs).unwrap();
    assert_eq!(layout.width % 4, 0);
    assert_eq!(layout.width, layout.height);

    let grown: Vec<PixelRect> = rects(&glyphs)
        .into_iter()
        .filter(|rect| !rect.is_empty())
        .inspect(|rect| {
            assert!(rect.right() <= layout.width);
            assert!(rect.top() <= layout.height);
        })
        .map(|rect| PixelRect::new(rect.x, rect.y, rect.width + spacing, rect.height + spacing))
        .collect();
    assert_eq!(grown.len(), 11);
    for (i, a) in grown.iter().enumerate() {
        for b in &grown[i + 1..] {
            assert!(!a.intersects(b), "{a:?} and {b:?} are closer than the spacing");
        }
    }
}

#[test]
fn relayout_is_idempotent() {
    let mut glyphs = square_glyphs(9);
    let config = Configuration::builder().minimum_scale(8.0).build().unwrap();
    let generator = AtlasGenerator::new(config);
    let first = generator.layout(&mut glyphs).unwrap();
    let first_rects = rects(&glyphs);
    let second = generator.layout(&mut glyphs).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_rects, rects(&glyphs));
}

#[test]
fn larger_fixed_atlas_never_lowers_scale() {
    let scale = |side: u32| {
        let mut glyphs = square_glyphs(6);
        let config = Configuration::builder()
            .image_type(ImageType::Sdf)
            .dimensions(side, side)
            .build()
            .unwrap();
        AtlasGenerator::new(config)
            .layout(&mut glyphs)
            .unwrap()
            .scale
    };
    let small = scale(64);
    let large = scale(128);
    assert!(small > 0.0);
    assert!(large >= small);
}

#[test]
fn overfull_fixed_atlas_is_an_error() {
    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .dimensions(16, 16)
        .scale(64.0)
        .build()
        .unwrap();
    let error = AtlasGenerator::new(config)
        .generate(square_glyphs(5))
        .unwrap_err();
    assert!(matches!(error, AtlasError::Pack(PackError::Unplaced(count)) if count > 0));
}

#[test]
fn glyphs_larger_than_any_atlas_are_infeasible() {
    for packing in [PackingStyle::Tight, PackingStyle::Grid(GridOptions::default())] {
        let config = Configuration::builder()
            .image_type(ImageType::Sdf)
            .packing(packing)
            .scale(1e10)
            .build()
            .unwrap();
        let error = AtlasGenerator::new(config)
            .layout(&mut square_glyphs(3))
            .unwrap_err();
        assert!(matches!(error, AtlasError::Pack(PackError::Infeasible)), "{error}");
    }

    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .dimensions(64, 64)
        .scale(1e10)
        .build()
        .unwrap();
    let error = AtlasGenerator::new(config)
        .layout(&mut square_glyphs(3))
        .unwrap_err();
    assert!(matches!(error, AtlasError::Pack(PackError::Infeasible)), "{error}");
}

#[test]
fn grid_cutoff_is_not_an_error() {
    let options = GridOptions {
        cell: Some((8, 8)),
        ..GridOptions::default()
    };
    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .packing(PackingStyle::Grid(options))
        .scale(64.0)
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(config)
        .generate(square_glyphs(4))
        .unwrap();
    assert!(atlas.layout().has_cutoff());
    assert!(atlas.outcome().is_success());
    let grid = atlas.layout().grid.unwrap();
    assert_eq!((grid.cell_width, grid.cell_height), (8, 8));
}

#[test]
fn grid_cells_grow_to_the_largest_glyph() {
    let options = GridOptions {
        cell_constraint: DimensionsConstraint::Square,
        columns: Some(2),
        ..GridOptions::default()
    };
    let mut glyphs = square_glyphs(5);
    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .packing(PackingStyle::Grid(options))
        .scale(16.0)
        .build()
        .unwrap();
    let layout = AtlasGenerator::new(config).layout(&mut glyphs).unwrap();
    let grid = layout.grid.unwrap();
    assert!(!layout.has_cutoff());
    assert_eq!(grid.columns, 2);
    assert_eq!(grid.cell_width, grid.cell_height);
    let largest = rects(&glyphs).iter().map(|rect| rect.width).max().unwrap();
    assert!(largest <= grid.cell_width);
}

#[test]
fn scanline_pass_downgrades_explicit_error_correction() {
    let config = Configuration::builder()
        .image_type(ImageType::Msdf)
        .scale(16.0)
        .scanline_pass(true)
        .error_correction(ErrorCorrectionPreset::EdgeFull.config())
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(config)
        .generate(square_glyphs(3))
        .unwrap();
    let downgrade = atlas.downgrade().unwrap();
    assert_eq!(downgrade.requested, ErrorCorrectionPreset::EdgeFull.config());
    assert_eq!(downgrade.fallback, ErrorCorrectionPreset::EdgeFast);

    let implicit = Configuration::builder()
        .image_type(ImageType::Msdf)
        .scale(16.0)
        .scanline_pass(true)
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(implicit)
        .generate(square_glyphs(3))
        .unwrap();
    assert!(atlas.downgrade().is_none());
}

#[test]
fn distance_field_is_positive_inside() {
    let config = Configuration::builder()
        .image_type(ImageType::Sdf)
        .storage(SampleStorage::Float)
        .scale(32.0)
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(config)
        .generate(square_glyphs(4))
        .unwrap();
    let AtlasImage::Float(bitmap) = atlas.image() else {
        panic!("expected a float atlas");
    };
    for glyph in atlas.glyphs().glyphs().iter().filter(|glyph| !glyph.is_whitespace()) {
        let rect = glyph.rect();
        let center = bitmap.pixel(rect.x + rect.width / 2, rect.y + rect.height / 2)[0];
        let corner = bitmap.pixel(rect.x, rect.y)[0];
        assert!(center > 0.5, "center of glyph {} is {center}", glyph.index());
        assert!(corner < 0.5, "corner of glyph {} is {corner}", glyph.index());
    }
}

#[test]
fn masks_use_a_one_pixel_range() {
    let config = Configuration::builder()
        .image_type(ImageType::HardMask)
        .scale(16.0)
        .build()
        .unwrap();
    let atlas = AtlasGenerator::new(config)
        .generate(square_glyphs(3))
        .unwrap();
    assert_eq!(atlas.layout().pixel_range.width(), 1.0);
    let AtlasImage::Byte(bitmap) = atlas.image() else {
        panic!("expected a byte atlas");
    };
    assert!(bitmap.data().iter().all(|&value| value == 0 || value == 255));
}
