// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::Write;

use hashbrown::HashMap;
use kurbo::Rect;
use serde::Serialize;

use super::{glyph_quads, ExportError, YDirection};
use crate::atlas::AtlasLayout;
use crate::font::{FontCollection, GlyphSet};
use crate::glyph::GlyphIdentifier;

#[derive(Serialize)]
struct Document<'a> {
    atlas: AtlasEntry,
    #[serde(flatten)]
    fonts: Fonts<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AtlasEntry {
    #[serde(rename = "type")]
    image_type: &'static str,
    distance_range: f64,
    distance_range_middle: f64,
    size: f64,
    width: u32,
    height: u32,
    y_origin: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<GridEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GridEntry {
    cell_width: u32,
    cell_height: u32,
    columns: u32,
    rows: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_y: Option<f64>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Fonts<'a> {
    Single(FontEntry<'a>),
    Variants { variants: Vec<FontEntry<'a>> },
}

#[derive(Serialize)]
struct FontEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    metrics: MetricsEntry,
    glyphs: Vec<GlyphEntry>,
    kerning: Vec<KerningEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsEntry {
    em_size: f64,
    line_height: f64,
    ascender: f64,
    descender: f64,
    underline_y: f64,
    underline_thickness: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Identifier {
    Unicode(u32),
    Index(u32),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GlyphEntry {
    #[serde(flatten)]
    identifier: Identifier,
    advance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    plane_bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    atlas_bounds: Option<Bounds>,
}

#[derive(Serialize)]
struct Bounds {
    left: f64,
    bottom: f64,
    right: f64,
    top: f64,
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self {
            left: rect.x0,
            bottom: rect.y0,
            right: rect.x1,
            top: rect.y1,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum KerningEntry {
    Unicode {
        unicode1: u32,
        unicode2: u32,
        advance: f64,
    },
    Index {
        index1: u32,
        index2: u32,
        advance: f64,
    },
}

/// Writes the atlas layout and per-font glyph metrics as JSON.
///
/// A set with a single font stores its metrics, glyphs and kerning at the top
/// level; several fonts are stored as named `variants`.
pub fn write_json<W: Write>(
    writer: W,
    layout: &AtlasLayout,
    glyphs: &GlyphSet,
) -> Result<(), ExportError> {
    let mut fonts: Vec<FontEntry<'_>> = glyphs
        .fonts()
        .iter()
        .map(|font| font_entry(layout, glyphs, font))
        .collect();
    let fonts = if fonts.len() == 1 {
        let mut font = fonts.remove(0);
        font.name = None;
        Fonts::Single(font)
    } else {
        Fonts::Variants { variants: fonts }
    };
    let document = Document {
        atlas: atlas_entry(layout),
        fonts,
    };
    serde_json::to_writer(writer, &document)?;
    Ok(())
}

fn atlas_entry(layout: &AtlasLayout) -> AtlasEntry {
    let grid = layout.grid.map(|grid| {
        let origin_y = grid.origin_y.map(|origin_y| match layout.y_direction {
            YDirection::BottomUp => origin_y,
            YDirection::TopDown => {
                let cell = grid.cell_height.saturating_sub(layout.spacing + 1);
                f64::from(cell) / layout.scale - origin_y
            }
        });
        GridEntry {
            cell_width: grid.cell_width,
            cell_height: grid.cell_height,
            columns: grid.columns,
            rows: grid.rows,
            origin_x: grid.origin_x,
            origin_y,
        }
    });
    AtlasEntry {
        image_type: layout.image_type.name(),
        distance_range: layout.pixel_range.width(),
        distance_range_middle: 0.5 * (layout.pixel_range.lower + layout.pixel_range.upper),
        size: layout.scale,
        width: layout.width,
        height: layout.height,
        y_origin: layout.y_direction.name(),
        grid,
    }
}

fn font_entry<'a>(
    layout: &AtlasLayout,
    glyphs: &GlyphSet,
    font: &'a FontCollection,
) -> FontEntry<'a> {
    let y_factor = match layout.y_direction {
        YDirection::BottomUp => 1.0,
        YDirection::TopDown => -1.0,
    };
    let metrics = font.metrics();
    let metrics = MetricsEntry {
        em_size: metrics.em_size,
        line_height: metrics.line_height,
        ascender: y_factor * metrics.ascender_y,
        descender: y_factor * metrics.descender_y,
        underline_y: y_factor * metrics.underline_y,
        underline_thickness: metrics.underline_thickness,
    };

    let font_glyphs = glyphs.font_glyphs(font);
    let codepoints: HashMap<u32, u32> = font_glyphs
        .iter()
        .filter_map(|glyph| Some((glyph.index(), glyph.codepoint()?)))
        .collect();
    let glyph_entries = font_glyphs
        .iter()
        .map(|glyph| {
            let identifier = match glyph.identifier() {
                GlyphIdentifier::Codepoint(codepoint) => Identifier::Unicode(codepoint),
                GlyphIdentifier::Index(index) => Identifier::Index(index),
            };
            let (plane_bounds, atlas_bounds) = if glyph.is_whitespace() {
                (None, None)
            } else {
                let (plane, atlas) = glyph_quads(layout, glyph);
                (Some(plane.into()), Some(atlas.into()))
            };
            GlyphEntry {
                identifier,
                advance: glyph.advance(),
                plane_bounds,
                atlas_bounds,
            }
        })
        .collect();

    let mut pairs: Vec<(&(u32, u32), &f64)> = font.kerning().iter().collect();
    pairs.sort_by_key(|(pair, _)| **pair);
    let kerning = pairs
        .into_iter()
        .map(|(&(left, right), &advance)| {
            match (codepoints.get(&left), codepoints.get(&right)) {
                (Some(&unicode1), Some(&unicode2)) => KerningEntry::Unicode {
                    unicode1,
                    unicode2,
                    advance,
                },
                _ => KerningEntry::Index {
                    index1: left,
                    index2: right,
                    advance,
                },
            }
        })
        .collect();

    FontEntry {
        name: font.name(),
        metrics,
        glyphs: glyph_entries,
        kerning,
    }
}
