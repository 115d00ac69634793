// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge coloring for multi-channel distance fields.

use kurbo::{ParamCurve, Vec2};
use smallvec::SmallVec;

use crate::outline::{Contour, Edge, EdgeColor, Outline};

/// How expensive a coloring heuristic is, which decides how glyph seeds are
/// derived.
///
/// Cheap heuristics color glyphs one after another from a running seed.
/// Expensive ones color glyphs in parallel, each from an independent seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColoringCost {
    /// Colored sequentially, in glyph order.
    Cheap,
    /// Colored in parallel.
    Expensive,
}

/// Assigns colors to the edges of an outline.
pub trait EdgeColoring: Send + Sync {
    /// Colors every edge of `outline`.
    ///
    /// `angle_threshold` is the largest angle, in radians, between adjacent
    /// edges that is still considered smooth. The result must only depend on
    /// the arguments; a seed of `0` selects the non-random coloring.
    fn color_edges(&self, outline: &mut Outline, angle_threshold: f64, seed: u64);

    /// The cost class of this heuristic.
    fn cost(&self) -> ColoringCost;
}

/// The classic corner-based coloring.
///
/// Smooth contours get a single color. Contours with one corner are split into
/// three colored parts, and contours with several corners switch color at
/// every corner, never giving the last part the color of the first.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleColoring;

impl EdgeColoring for SimpleColoring {
    fn color_edges(&self, outline: &mut Outline, angle_threshold: f64, seed: u64) {
        let cross_threshold = angle_threshold.sin();
        let mut seed = seed;
        let mut corners = Vec::new();
        for contour in outline.contours_mut() {
            find_corners(contour, cross_threshold, &mut corners);
            match corners.as_slice() {
                [] => {
                    let mut color = EdgeColor::WHITE;
                    switch_color(&mut color, &mut seed, EdgeColor::BLACK);
                    for edge in &mut contour.edges {
                        edge.color = color;
                    }
                }
                &[corner] => color_teardrop(contour, corner, &mut seed),
                _ => color_corners(contour, &corners, &mut seed),
            }
        }
    }

    fn cost(&self) -> ColoringCost {
        ColoringCost::Cheap
    }
}

fn is_corner(a: Vec2, b: Vec2, cross_threshold: f64) -> bool {
    a.dot(b) <= 0.0 || a.cross(b).abs() > cross_threshold
}

fn normalized(direction: Vec2) -> Vec2 {
    let length = direction.hypot();
    if length > 0.0 {
        direction / length
    } else {
        direction
    }
}

fn find_corners(contour: &Contour, cross_threshold: f64, corners: &mut Vec<usize>) {
    corners.clear();
    let Some(last) = contour.edges.last() else {
        return;
    };
    let mut previous = last.direction(1.0);
    for (index, edge) in contour.edges.iter().enumerate() {
        if is_corner(normalized(previous), normalized(edge.direction(0.0)), cross_threshold) {
            corners.push(index);
        }
        previous = edge.direction(1.0);
    }
}

/// Moves `color` to another two-channel color, avoiding `banned` where possible.
fn switch_color(color: &mut EdgeColor, seed: &mut u64, banned: EdgeColor) {
    let combined = EdgeColor::from_bits(color.bits() & banned.bits());
    if matches!(combined, EdgeColor::RED | EdgeColor::GREEN | EdgeColor::BLUE) {
        *color = EdgeColor::from_bits(combined.bits() ^ EdgeColor::WHITE.bits());
        return;
    }
    if matches!(*color, EdgeColor::BLACK | EdgeColor::WHITE) {
        const START: [EdgeColor; 3] = [EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW];
        #[expect(clippy::cast_possible_truncation, reason = "the remainder is below 3")]
        let start = (*seed % 3) as usize;
        *color = START[start];
        *seed /= 3;
        return;
    }
    let shifted = u32::from(color.bits()) << (1 + (*seed & 1));
    #[expect(clippy::cast_possible_truncation, reason = "masked to three bits")]
    let bits = ((shifted | shifted >> 3) & 7) as u8;
    *color = EdgeColor::from_bits(bits);
    *seed >>= 1;
}

/// Which of three parts edge `position` of `count` belongs to: `0`, `1` or `2`.
#[expect(clippy::cast_possible_truncation, reason = "the value lies in 2..=5")]
fn symmetrical_trichotomy(position: usize, count: usize) -> usize {
    let ratio = position as f64 / (count - 1) as f64;
    (2.875 * ratio - 1.4375 + 3.5) as usize - 2
}

fn color_teardrop(contour: &mut Contour, corner: usize, seed: &mut u64) {
    let mut colors = [EdgeColor::WHITE; 3];
    switch_color(&mut colors[0], seed, EdgeColor::BLACK);
    colors[2] = colors[0];
    switch_color(&mut colors[2], seed, EdgeColor::BLACK);
    colors[1] = EdgeColor::WHITE;

    let count = contour.edges.len();
    if count >= 3 {
        for i in 0..count {
            contour.edges[(corner + i) % count].color = colors[symmetrical_trichotomy(i, count)];
        }
        return;
    }

    // Too few edges for three colors: split each edge in thirds.
    let thirds = |edge: &Edge| -> [Edge; 3] {
        [(0.0, 1.0 / 3.0), (1.0 / 3.0, 2.0 / 3.0), (2.0 / 3.0, 1.0)]
            .map(|(t0, t1)| Edge::new(edge.segment.subsegment(t0..t1)))
    };
    let mut parts: SmallVec<[Edge; 8]> = SmallVec::new();
    match contour.edges.as_slice() {
        [edge] => {
            parts.extend(thirds(edge));
            for (part, color) in parts.iter_mut().zip(colors) {
                part.color = color;
            }
        }
        [first, second] => {
            // The corner edge comes first; with the corner at the second edge
            // the order of the halves swaps.
            let (a, b) = if corner == 0 {
                (first, second)
            } else {
                (second, first)
            };
            parts.extend(thirds(a));
            parts.extend(thirds(b));
            let pattern = [colors[0], colors[0], colors[1], colors[1], colors[2], colors[2]];
            for (part, color) in parts.iter_mut().zip(pattern) {
                part.color = color;
            }
            if corner != 0 {
                parts.rotate_left(3);
            }
        }
        _ => return,
    }
    contour.edges = parts;
}

fn color_corners(contour: &mut Contour, corners: &[usize], seed: &mut u64) {
    let count = contour.edges.len();
    let start = corners[0];
    let mut spline = 0;
    let mut color = EdgeColor::WHITE;
    switch_color(&mut color, seed, EdgeColor::BLACK);
    let initial = color;
    for i in 0..count {
        let index = (start + i) % count;
        if spline + 1 < corners.len() && corners[spline + 1] == index {
            spline += 1;
            let banned = if spline == corners.len() - 1 {
                initial
            } else {
                EdgeColor::BLACK
            };
            switch_color(&mut color, seed, banned);
        }
        contour.edges[index].color = color;
    }
}
