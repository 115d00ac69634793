// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading glyphs from fonts.

use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;
use kurbo::BezPath;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::raw::tables::kern::{Kern, SubtableKind};
use skrifa::raw::TableProvider;
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::error::LoadError;
use crate::glyph::{GlyphGeometry, GlyphIdentifier};

/// Font-wide vertical metrics, in shape units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Size of the em square.
    pub em_size: f64,
    /// Ascender position, above the baseline.
    pub ascender_y: f64,
    /// Descender position, usually negative.
    pub descender_y: f64,
    /// Distance between consecutive baselines.
    pub line_height: f64,
    /// Underline position.
    pub underline_y: f64,
    /// Underline thickness.
    pub underline_thickness: f64,
}

/// Where glyph outlines come from.
///
/// All lengths are in shape units, so a source decides how font units map to
/// them.
pub trait FontSource {
    /// Maps a codepoint to a glyph index.
    fn glyph_index(&self, codepoint: u32) -> Option<u32>;

    /// The outline and advance of a glyph.
    fn load_outline(&self, glyph: u32) -> Result<(BezPath, f64), LoadError>;

    /// Horizontal kerning between two glyphs.
    fn kerning(&self, _left: u32, _right: u32) -> Option<f64> {
        None
    }

    /// Font-wide metrics.
    fn metrics(&self) -> FontMetrics;

    /// Number of glyphs in the font.
    fn glyph_count(&self) -> u32;
}

/// A [`FontSource`] backed by skrifa.
///
/// Outlines are unhinted, at the default location of variable fonts, and
/// measured in ems times a font scale. Kerning comes from the `kern` table.
#[derive(Clone)]
pub struct SkrifaFontSource<'a> {
    font: FontRef<'a>,
    kern: Option<Kern<'a>>,
    scale: f64,
    units_per_em: u16,
    glyph_count: u16,
}

impl fmt::Debug for SkrifaFontSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkrifaFontSource")
            .field("scale", &self.scale)
            .field("units_per_em", &self.units_per_em)
            .field("glyph_count", &self.glyph_count)
            .field("kern", &self.kern.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> SkrifaFontSource<'a> {
    /// Wraps a parsed font. An em measures `font_scale` shape units.
    pub fn new(font: FontRef<'a>, font_scale: f64) -> Self {
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let units_per_em = metrics.units_per_em.max(1);
        let kern = font.kern().ok();
        Self {
            font,
            kern,
            scale: font_scale / f64::from(units_per_em),
            units_per_em,
            glyph_count: metrics.glyph_count,
        }
    }

    /// Parses font `index` of a font file or collection.
    pub fn from_data(data: &'a [u8], index: u32, font_scale: f64) -> Result<Self, LoadError> {
        Ok(Self::new(FontRef::from_index(data, index)?, font_scale))
    }

    /// Font units per em.
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }
}

/// Collects a skrifa outline into a path in shape units.
struct PathPen {
    path: BezPath,
    scale: f64,
}

impl PathPen {
    fn point(&self, x: f32, y: f32) -> (f64, f64) {
        (f64::from(x) * self.scale, f64::from(y) * self.scale)
    }
}

impl OutlinePen for PathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (c, p) = (self.point(cx0, cy0), self.point(x, y));
        self.path.quad_to(c, p);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (c0, c1, p) = (self.point(cx0, cy0), self.point(cx1, cy1), self.point(x, y));
        self.path.curve_to(c0, c1, p);
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

impl FontSource for SkrifaFontSource<'_> {
    fn glyph_index(&self, codepoint: u32) -> Option<u32> {
        let glyph = self.font.charmap().map(codepoint)?;
        (glyph != GlyphId::NOTDEF).then(|| glyph.to_u32())
    }

    fn load_outline(&self, glyph: u32) -> Result<(BezPath, f64), LoadError> {
        let id = GlyphId::new(glyph);
        if glyph >= u32::from(self.glyph_count) {
            return Err(LoadError::GlyphNotFound(GlyphIdentifier::Index(glyph)));
        }
        let advance = self
            .font
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(id)
            .map_or(0.0, |advance| f64::from(advance) * self.scale);
        let mut pen = PathPen {
            path: BezPath::new(),
            scale: self.scale,
        };
        // Glyphs without an outline, such as spaces, keep an empty path.
        if let Some(outline) = self.font.outline_glyphs().get(id) {
            let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
            outline
                .draw(settings, &mut pen)
                .map_err(|error| LoadError::Outline { glyph, error })?;
        }
        Ok((pen.path, advance))
    }

    fn kerning(&self, left: u32, right: u32) -> Option<f64> {
        let kern = self.kern.as_ref()?;
        let (left, right) = (GlyphId::new(left), GlyphId::new(right));
        let mut total: Option<i32> = None;
        // Values of all horizontal subtables accumulate.
        for subtable in kern.subtables().filter_map(Result::ok) {
            if !subtable.is_horizontal() || subtable.is_cross_stream() || subtable.is_variable() {
                continue;
            }
            let value = match subtable.kind() {
                Ok(SubtableKind::Format0(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format2(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format3(table)) => table.kerning(left, right),
                Ok(SubtableKind::Format1(_)) | Err(_) => None,
            };
            if let Some(value) = value {
                total = Some(total.unwrap_or(0).saturating_add(value));
            }
        }
        total.map(|value| f64::from(value) * self.scale)
    }

    fn metrics(&self) -> FontMetrics {
        let metrics = self.font.metrics(Size::unscaled(), LocationRef::default());
        let scale = |value: f32| f64::from(value) * self.scale;
        let (underline_y, underline_thickness) = metrics
            .underline
            .map_or((0.0, 0.0), |underline| (underline.offset, underline.thickness));
        FontMetrics {
            em_size: f64::from(self.units_per_em) * self.scale,
            ascender_y: scale(metrics.ascent),
            descender_y: scale(metrics.descent),
            line_height: scale(metrics.ascent - metrics.descent + metrics.leading),
            underline_y: scale(underline_y),
            underline_thickness: scale(underline_thickness),
        }
    }

    fn glyph_count(&self) -> u32 {
        u32::from(self.glyph_count)
    }
}

/// A sorted set of codepoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Charset {
    codepoints: Vec<u32>,
}

impl Charset {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Printable ASCII, `U+0020` through `U+007E`.
    pub fn ascii() -> Self {
        (0x20_u32..0x7f).collect()
    }

    /// Adds a codepoint.
    pub fn insert(&mut self, codepoint: u32) {
        if let Err(position) = self.codepoints.binary_search(&codepoint) {
            self.codepoints.insert(position, codepoint);
        }
    }

    /// The codepoints in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.codepoints.iter().copied()
    }

    /// Number of codepoints.
    pub fn len(&self) -> usize {
        self.codepoints.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.codepoints.is_empty()
    }
}

impl FromIterator<u32> for Charset {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut codepoints: Vec<u32> = iter.into_iter().collect();
        codepoints.sort_unstable();
        codepoints.dedup();
        Self { codepoints }
    }
}

impl FromIterator<char> for Charset {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        iter.into_iter().map(u32::from).collect()
    }
}

/// The glyphs of one font within a [`GlyphSet`].
#[derive(Clone, Debug, Default)]
pub struct FontCollection {
    name: Option<String>,
    glyphs: Range<usize>,
    metrics: FontMetrics,
    kerning: HashMap<(u32, u32), f64>,
}

impl FontCollection {
    /// The font's name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Positions of this font's glyphs in the glyph set.
    pub fn glyph_range(&self) -> Range<usize> {
        self.glyphs.clone()
    }

    /// Font-wide metrics.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Kerning between pairs of glyph indices.
    pub fn kerning(&self) -> &HashMap<(u32, u32), f64> {
        &self.kerning
    }
}

/// What happened while loading one font.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of glyphs added.
    pub loaded: usize,
    /// Requested glyphs the font does not have.
    pub missing: Vec<GlyphIdentifier>,
}

/// The glyphs of every font sharing an atlas, in atlas order.
#[derive(Clone, Debug, Default)]
pub struct GlyphSet {
    glyphs: Vec<GlyphGeometry>,
    fonts: Vec<FontCollection>,
}

impl GlyphSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// All glyphs.
    pub fn glyphs(&self) -> &[GlyphGeometry] {
        &self.glyphs
    }

    /// Mutable access to all glyphs, for packing and coloring.
    pub fn glyphs_mut(&mut self) -> &mut [GlyphGeometry] {
        &mut self.glyphs
    }

    /// The fonts, in load order.
    pub fn fonts(&self) -> &[FontCollection] {
        &self.fonts
    }

    /// The glyphs of one font.
    pub fn font_glyphs(&self, font: &FontCollection) -> &[GlyphGeometry] {
        &self.glyphs[font.glyph_range()]
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the set has no glyphs.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Loads the glyphs for every codepoint of `charset`.
    pub fn load_charset(
        &mut self,
        source: &dyn FontSource,
        name: Option<&str>,
        charset: &Charset,
        kerning: bool,
    ) -> Result<LoadReport, LoadError> {
        let requests = charset.iter().map(|codepoint| {
            let index = source.glyph_index(codepoint);
            (GlyphIdentifier::Codepoint(codepoint), index)
        });
        self.load(source, name, requests, kerning)
    }

    /// Loads glyphs by index.
    pub fn load_glyph_indices(
        &mut self,
        source: &dyn FontSource,
        name: Option<&str>,
        indices: &[u32],
        kerning: bool,
    ) -> Result<LoadReport, LoadError> {
        let requests = indices
            .iter()
            .map(|&index| (GlyphIdentifier::Index(index), Some(index)));
        self.load(source, name, requests, kerning)
    }

    /// Loads every glyph of the font.
    pub fn load_all(
        &mut self,
        source: &dyn FontSource,
        name: Option<&str>,
        kerning: bool,
    ) -> Result<LoadReport, LoadError> {
        let requests =
            (0..source.glyph_count()).map(|index| (GlyphIdentifier::Index(index), Some(index)));
        self.load(source, name, requests, kerning)
    }

    fn load(
        &mut self,
        source: &dyn FontSource,
        name: Option<&str>,
        requests: impl Iterator<Item = (GlyphIdentifier, Option<u32>)>,
        kerning: bool,
    ) -> Result<LoadReport, LoadError> {
        let start = self.glyphs.len();
        let mut report = LoadReport::default();
        for (identifier, index) in requests {
            let Some(index) = index else {
                report.missing.push(identifier);
                continue;
            };
            match source.load_outline(index) {
                Ok((path, advance)) => {
                    self.glyphs
                        .push(GlyphGeometry::from_path(identifier, index, &path, advance));
                    report.loaded += 1;
                }
                Err(LoadError::GlyphNotFound(_)) => report.missing.push(identifier),
                Err(error) => {
                    self.glyphs.truncate(start);
                    return Err(error);
                }
            }
        }
        if !report.missing.is_empty() {
            log::warn!(
                "{} of the requested glyphs are missing from font {}",
                report.missing.len(),
                name.unwrap_or("<unnamed>")
            );
        }

        let loaded = &self.glyphs[start..];
        let mut pairs = HashMap::new();
        if kerning {
            for left in loaded {
                for right in loaded {
                    let (a, b) = (left.index(), right.index());
                    if let Some(value) = source.kerning(a, b).filter(|value| *value != 0.0) {
                        pairs.insert((a, b), value);
                    }
                }
            }
        }
        self.fonts.push(FontCollection {
            name: name.map(str::to_owned),
            glyphs: start..self.glyphs.len(),
            metrics: source.metrics(),
            kerning: pairs,
        });
        Ok(report)
    }
}
