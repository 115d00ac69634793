// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, Mutex};

use crate::font::tests::SquareFont;
use crate::{ColoringCost, EdgeColoring, GlyphSet, Outline, PixelRect, SimpleColoring};

/// A set of `count` square glyphs of growing size, loaded by index. Glyph 0
/// is a space.
pub(crate) fn square_glyphs(count: u32) -> GlyphSet {
    let indices: Vec<u32> = (0..count).collect();
    let mut glyphs = GlyphSet::new();
    glyphs
        .load_glyph_indices(&SquareFont { glyphs: count }, None, &indices, false)
        .unwrap();
    glyphs
}

/// The rectangles of every glyph, in glyph order.
pub(crate) fn rects(glyphs: &GlyphSet) -> Vec<PixelRect> {
    glyphs.glyphs().iter().map(|glyph| glyph.rect()).collect()
}

/// Simple coloring that reports as expensive and records the seeds it gets.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingColoring {
    pub(crate) seeds: Arc<Mutex<Vec<u64>>>,
}

impl RecordingColoring {
    /// The recorded seeds, sorted.
    pub(crate) fn sorted_seeds(&self) -> Vec<u64> {
        let mut seeds = self.seeds.lock().unwrap().clone();
        seeds.sort_unstable();
        seeds
    }
}

impl EdgeColoring for RecordingColoring {
    fn color_edges(&self, outline: &mut Outline, angle_threshold: f64, seed: u64) {
        self.seeds.lock().unwrap().push(seed);
        SimpleColoring.color_edges(outline, angle_threshold, seed);
    }

    fn cost(&self) -> ColoringCost {
        ColoringCost::Expensive
    }
}
