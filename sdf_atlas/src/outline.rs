// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph outlines as closed contours of colored edges.

use kurbo::{
    BezPath, ParamCurve, ParamCurveDeriv, ParamCurveExtrema, PathEl, PathSeg, Point, Rect, Shape,
    Vec2,
};
use smallvec::SmallVec;

use crate::math::FloatExt;

/// Color channels an edge contributes to in multi-channel generation.
///
/// Stored as a bit set of red (1), green (2) and blue (4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeColor(u8);

impl EdgeColor {
    /// No channel.
    pub const BLACK: Self = Self(0);
    /// Red channel only.
    pub const RED: Self = Self(1);
    /// Green channel only.
    pub const GREEN: Self = Self(2);
    /// Red and green channels.
    pub const YELLOW: Self = Self(3);
    /// Blue channel only.
    pub const BLUE: Self = Self(4);
    /// Red and blue channels.
    pub const MAGENTA: Self = Self(5);
    /// Green and blue channels.
    pub const CYAN: Self = Self(6);
    /// All channels.
    pub const WHITE: Self = Self(7);

    /// Creates a color from its channel bits; bits above the blue channel are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 7)
    }

    /// The channel bits of this color.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the edge contributes to the given channel (0 = red, 1 = green, 2 = blue).
    pub const fn has_channel(self, channel: usize) -> bool {
        channel < 3 && self.0 & (1 << channel) != 0
    }
}

impl Default for EdgeColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One segment of a contour together with its color.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    /// The segment geometry, in shape units.
    pub segment: PathSeg,
    /// Channels this edge contributes to.
    pub color: EdgeColor,
}

impl Edge {
    /// Creates a white edge.
    pub fn new(segment: PathSeg) -> Self {
        Self {
            segment,
            color: EdgeColor::WHITE,
        }
    }

    /// Point on the edge at parameter `t`.
    pub fn point(&self, t: f64) -> Point {
        self.segment.eval(t)
    }

    /// Tangent direction at parameter `t`.
    ///
    /// Falls back to the chord for degenerate control points, so the result is
    /// only zero for zero-length edges.
    pub fn direction(&self, t: f64) -> Vec2 {
        let direction = match self.segment {
            PathSeg::Line(line) => line.deriv().eval(t).to_vec2(),
            PathSeg::Quad(quad) => quad.deriv().eval(t).to_vec2(),
            PathSeg::Cubic(cubic) => cubic.deriv().eval(t).to_vec2(),
        };
        if direction.hypot2().is_nearly_zero() {
            self.segment.end() - self.segment.start()
        } else {
            direction
        }
    }
}

/// A closed sequence of edges.
#[derive(Clone, Debug, Default)]
pub struct Contour {
    /// The edges, in path order.
    ///
    /// Most glyph contours are short, so a handful are stored inline.
    pub edges: SmallVec<[Edge; 8]>,
}

impl Contour {
    /// Twice the signed area enclosed by the contour, positive when
    /// counter-clockwise in a y-up coordinate system.
    ///
    /// Curves are approximated by a few points each, which is plenty for
    /// determining orientation.
    fn double_area(&self) -> f64 {
        static SAMPLES: [f64; 4] = [0.0, 0.25, 0.5, 0.75];
        let mut points = self
            .edges
            .iter()
            .flat_map(|edge| {
                let samples: &[f64] = match edge.segment {
                    PathSeg::Line(_) => &SAMPLES[..1],
                    _ => &SAMPLES,
                };
                samples.iter().map(move |&t| edge.point(t))
            })
            .peekable();
        let Some(&first) = points.peek() else {
            return 0.0;
        };
        let mut area = 0.0;
        let mut previous = first;
        for point in points.skip(1) {
            area += previous.to_vec2().cross(point.to_vec2());
            previous = point;
        }
        area + previous.to_vec2().cross(first.to_vec2())
    }
}

/// A glyph outline in shape units.
///
/// Every contour is implicitly closed. The fill rule is non-zero.
#[derive(Clone, Debug, Default)]
pub struct Outline {
    contours: Vec<Contour>,
    path: BezPath,
}

impl Outline {
    /// Builds an outline from a path, closing open subpaths and dropping
    /// zero-length segments.
    pub fn from_path(path: &BezPath) -> Self {
        let mut contours = Vec::new();
        let mut current = Contour::default();
        let mut start = Point::ZERO;
        let mut last = Point::ZERO;

        let mut close = |current: &mut Contour, last: Point, start: Point| {
            if last != start && !current.edges.is_empty() {
                current
                    .edges
                    .push(Edge::new(PathSeg::Line(kurbo::Line::new(last, start))));
            }
            if !current.edges.is_empty() {
                contours.push(core::mem::take(current));
            }
        };

        for element in path.elements() {
            match *element {
                PathEl::MoveTo(p) => {
                    close(&mut current, last, start);
                    start = p;
                    last = p;
                }
                PathEl::LineTo(p) => {
                    if p != last {
                        current
                            .edges
                            .push(Edge::new(PathSeg::Line(kurbo::Line::new(last, p))));
                    }
                    last = p;
                }
                PathEl::QuadTo(c, p) => {
                    current
                        .edges
                        .push(Edge::new(PathSeg::Quad(kurbo::QuadBez::new(last, c, p))));
                    last = p;
                }
                PathEl::CurveTo(c0, c1, p) => {
                    current.edges.push(Edge::new(PathSeg::Cubic(kurbo::CubicBez::new(
                        last, c0, c1, p,
                    ))));
                    last = p;
                }
                PathEl::ClosePath => {
                    close(&mut current, last, start);
                    last = start;
                }
            }
        }
        close(&mut current, last, start);

        Self::from_contours(contours)
    }

    /// Builds an outline from contours whose edges are already chained.
    pub fn from_contours(contours: Vec<Contour>) -> Self {
        let mut path = BezPath::new();
        for contour in &contours {
            let Some(first) = contour.edges.first() else {
                continue;
            };
            path.move_to(first.segment.start());
            for edge in &contour.edges {
                match edge.segment {
                    PathSeg::Line(line) => path.line_to(line.p1),
                    PathSeg::Quad(quad) => path.quad_to(quad.p1, quad.p2),
                    PathSeg::Cubic(cubic) => path.curve_to(cubic.p1, cubic.p2, cubic.p3),
                }
            }
            path.close_path();
        }
        Self { contours, path }
    }

    /// The contours of this outline.
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Mutable access to the contours, for assigning edge colors.
    ///
    /// The geometry must not be changed through this.
    pub fn contours_mut(&mut self) -> &mut [Contour] {
        &mut self.contours
    }

    /// The closed path equivalent of this outline.
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// All edges of all contours.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.contours.iter().flat_map(|contour| contour.edges.iter())
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.contours.iter().map(|contour| contour.edges.len()).sum()
    }

    /// Whether the outline has no edges.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Tight bounds of the outline, or `None` if it has no area.
    pub fn bounds(&self) -> Option<Rect> {
        let bounds = self
            .edges()
            .map(|edge| ParamCurveExtrema::bounding_box(&edge.segment))
            .reduce(|a, b| a.union(b))?;
        (bounds.width() > 0.0 && bounds.height() > 0.0).then_some(bounds)
    }

    /// Grows `bounds` to include the miter of every convex corner, offset by
    /// `border` and clamped to `miter_limit` times `border`.
    pub(crate) fn bound_miters(&self, mut bounds: Rect, border: f64, miter_limit: f64) -> Rect {
        let polarity = -self.orientation();
        for contour in &self.contours {
            let Some(last) = contour.edges.last() else {
                continue;
            };
            let mut previous = last.direction(1.0).normalize();
            for edge in &contour.edges {
                let direction = -edge.direction(0.0).normalize();
                if polarity * previous.cross(direction) >= 0.0 {
                    let q = 0.5 * (1.0 - previous.dot(direction));
                    let length = if q > 0.0 {
                        q.sqrt().recip().min(miter_limit)
                    } else {
                        miter_limit
                    };
                    let bisector = previous + direction;
                    if bisector.hypot2() > 0.0 {
                        let miter = edge.point(0.0) + border * length * bisector.normalize();
                        bounds = bounds.union_pt(miter);
                    }
                }
                previous = edge.direction(1.0).normalize();
            }
        }
        bounds
    }

    /// Winding number of the outline around `point`.
    pub fn winding(&self, point: Point) -> i32 {
        Shape::winding(&self.path, point)
    }

    /// Whether `point` is filled under the non-zero rule.
    pub fn contains(&self, point: Point) -> bool {
        self.winding(point) != 0
    }

    /// `1.0` if filled regions lie to the left of edge directions, `-1.0` otherwise.
    ///
    /// Determined by the orientation of the contours with the largest total area.
    pub fn orientation(&self) -> f64 {
        let area: f64 = self.contours.iter().map(Contour::double_area).sum();
        if area >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Resets every edge to white.
    pub fn reset_colors(&mut self) {
        for contour in &mut self.contours {
            for edge in &mut contour.edges {
                edge.color = EdgeColor::WHITE;
            }
        }
    }
}
