// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::square_glyphs;
use crate::export::{write_csv, write_raw, Endianness, YDirection};
use crate::{AtlasGenerator, Configuration, ImageType, SampleStorage};

fn generate(image_type: ImageType, storage: SampleStorage) -> crate::Atlas {
    let config = Configuration::builder()
        .image_type(image_type)
        .storage(storage)
        .scale(16.0)
        .build()
        .unwrap();
    AtlasGenerator::new(config)
        .generate(square_glyphs(4))
        .unwrap()
}

#[test]
fn raw_output_covers_every_sample() {
    let atlas = generate(ImageType::Msdf, SampleStorage::Float);
    let image = atlas.image();
    let samples = image.width() as usize * image.height() as usize * image.channels();

    let mut output = Vec::new();
    write_raw(&mut output, image, YDirection::TopDown, Endianness::Big).unwrap();
    assert_eq!(output.len(), 4 * samples);
}

#[test]
fn csv_lists_every_glyph() {
    let atlas = generate(ImageType::Psdf, SampleStorage::Byte);
    let mut output = Vec::new();
    write_csv(&mut output, atlas.layout(), atlas.glyphs()).unwrap();
    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.lines().count(), atlas.glyphs().len());
}

#[cfg(feature = "png")]
#[test]
fn png_matches_atlas_dimensions() {
    let atlas = generate(ImageType::Mtsdf, SampleStorage::Byte);
    let mut output = Vec::new();
    crate::export::write_png(&mut output, atlas.image()).unwrap();

    let reader = png::Decoder::new(output.as_slice()).read_info().unwrap();
    let info = reader.info();
    assert_eq!(info.width, atlas.layout().width);
    assert_eq!(info.height, atlas.layout().height);
    assert_eq!(info.color_type, png::ColorType::Rgba);
}

#[cfg(feature = "json")]
#[test]
fn json_reports_resolved_layout() {
    let atlas = generate(ImageType::Sdf, SampleStorage::Byte);
    let mut output = Vec::new();
    crate::export::write_json(&mut output, atlas.layout(), atlas.glyphs()).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["atlas"]["width"], atlas.layout().width);
    assert_eq!(json["atlas"]["size"], 16.0);
    assert_eq!(json["glyphs"].as_array().unwrap().len(), 4);
}
