// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::Write;

use super::{glyph_quads, ExportError};
use crate::atlas::AtlasLayout;
use crate::font::GlyphSet;
use crate::glyph::GlyphIdentifier;

/// Writes one line per glyph.
///
/// Columns are the font position (only when the set holds more than one
/// font), the codepoint or glyph index, the advance, the plane quad
/// `left, bottom, right, top` in shape units and the atlas quad in pixels.
/// Whitespace glyphs get zero quads.
pub fn write_csv<W: Write>(
    mut writer: W,
    layout: &AtlasLayout,
    glyphs: &GlyphSet,
) -> Result<(), ExportError> {
    let with_font = glyphs.fonts().len() > 1;
    for (font_index, font) in glyphs.fonts().iter().enumerate() {
        for glyph in glyphs.font_glyphs(font) {
            if with_font {
                write!(writer, "{font_index},")?;
            }
            let identifier = match glyph.identifier() {
                GlyphIdentifier::Codepoint(codepoint) => codepoint,
                GlyphIdentifier::Index(index) => index,
            };
            let (plane, atlas) = glyph_quads(layout, glyph);
            writeln!(
                writer,
                "{identifier},{},{},{},{},{},{},{},{},{}",
                glyph.advance(),
                plane.x0,
                plane.y0,
                plane.x1,
                plane.y1,
                atlas.x0,
                atlas.y0,
                atlas.x1,
                atlas.y1
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
