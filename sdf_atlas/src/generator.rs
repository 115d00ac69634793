// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-glyph distance generation.
//!
//! A [`DistanceGenerator`] fills a [`SampleTile`] with normalized samples for
//! one glyph box: `0.5` on the outline, growing towards `1.0` inside and
//! shrinking towards `0.0` outside over the glyph's distance range. The
//! dispatcher converts tiles to the atlas storage type afterwards.
//!
//! [`ReferenceGenerator`] computes exact nearest-point distances with kurbo. It
//! implements no error correction; the [`ErrorCorrectionConfig`] is carried to
//! generators that do.

use kurbo::{ParamCurveNearest, Point, Vec2};

use crate::error::GenerateError;
use crate::glyph::GlyphGeometry;
use crate::math::{median, FloatExt};
use crate::outline::{Edge, Outline};

/// Accuracy of nearest-point queries, in shape units.
const NEAREST_ACCURACY: f64 = 1e-9;

/// Distances within this tolerance are treated as equal when picking the
/// nearest edge at a corner.
const DISTANCE_TOLERANCE: f64 = 1e-12;

/// The generation algorithm for one glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// Binary coverage from the non-zero fill rule.
    Scanline,
    /// True signed distance.
    Sdf,
    /// Signed pseudo-distance.
    Psdf,
    /// Multi-channel signed pseudo-distance.
    Msdf,
    /// Multi-channel signed pseudo-distance plus true distance in the fourth channel.
    Mtsdf,
}

impl GeneratorKind {
    /// Samples per pixel.
    pub const fn channels(self) -> usize {
        match self {
            Self::Scanline | Self::Sdf | Self::Psdf => 1,
            Self::Msdf => 3,
            Self::Mtsdf => 4,
        }
    }

    /// Whether edge colors matter.
    pub const fn is_multi_channel(self) -> bool {
        matches!(self, Self::Msdf | Self::Mtsdf)
    }
}

/// Which pixels the error correction may change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCorrectionMode {
    /// No error correction.
    Disabled,
    /// Corrects all detected artifacts.
    Indiscriminate,
    /// Corrects artifacts, preferring to preserve edges.
    #[default]
    EdgePriority,
    /// Only corrects artifacts at edges.
    EdgeOnly,
}

/// Whether detected artifacts are confirmed by computing exact distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DistanceCheckMode {
    /// Never compute exact distances.
    DoNotCheck,
    /// Only check near edges.
    #[default]
    CheckAtEdge,
    /// Check every candidate.
    AlwaysCheck,
}

/// Error correction settings passed to generators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorCorrectionConfig {
    /// Which pixels may change.
    pub mode: ErrorCorrectionMode,
    /// Whether artifacts are confirmed by exact distances.
    pub distance_check: DistanceCheckMode,
    /// Minimum deviation from the interpolated value, relative to the
    /// expected one, that counts as an artifact.
    pub min_deviation_ratio: f64,
    /// Minimum improvement a correction must bring.
    pub min_improve_ratio: f64,
}

impl ErrorCorrectionConfig {
    /// Default minimum deviation ratio.
    pub const DEFAULT_MIN_DEVIATION_RATIO: f64 = 1.111_111_111_111_111;
    /// Default minimum improvement ratio.
    pub const DEFAULT_MIN_IMPROVE_RATIO: f64 = 1.111_111_111_111_111;
}

impl Default for ErrorCorrectionConfig {
    fn default() -> Self {
        ErrorCorrectionPreset::default().config()
    }
}

/// Named combinations of error correction and distance check modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCorrectionPreset {
    /// Edge priority without distance checks.
    AutoFast,
    /// Edge priority, always checking distances.
    AutoFull,
    /// Edge priority, checking distances at edges.
    #[default]
    AutoMixed,
    /// No error correction.
    Disabled,
    /// Indiscriminate, without distance checks.
    DistanceFast,
    /// Indiscriminate, always checking distances.
    DistanceFull,
    /// Edges only, without distance checks.
    EdgeFast,
    /// Edges only, always checking distances.
    EdgeFull,
}

impl ErrorCorrectionPreset {
    /// Every preset.
    pub const ALL: [Self; 8] = [
        Self::AutoFast,
        Self::AutoFull,
        Self::AutoMixed,
        Self::Disabled,
        Self::DistanceFast,
        Self::DistanceFull,
        Self::EdgeFast,
        Self::EdgeFull,
    ];

    /// The preset's name, such as `auto-mixed`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AutoFast => "auto-fast",
            Self::AutoFull => "auto-full",
            Self::AutoMixed => "auto-mixed",
            Self::Disabled => "disabled",
            Self::DistanceFast => "distance-fast",
            Self::DistanceFull => "distance-full",
            Self::EdgeFast => "edge-fast",
            Self::EdgeFull => "edge-full",
        }
    }

    /// Looks a preset up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }

    /// The modes this preset stands for.
    pub const fn modes(self) -> (ErrorCorrectionMode, DistanceCheckMode) {
        use DistanceCheckMode::*;
        use ErrorCorrectionMode::*;
        match self {
            Self::AutoFast => (EdgePriority, DoNotCheck),
            Self::AutoFull => (EdgePriority, AlwaysCheck),
            Self::AutoMixed => (EdgePriority, CheckAtEdge),
            Self::Disabled => (ErrorCorrectionMode::Disabled, DoNotCheck),
            Self::DistanceFast => (Indiscriminate, DoNotCheck),
            Self::DistanceFull => (Indiscriminate, AlwaysCheck),
            Self::EdgeFast => (EdgeOnly, DoNotCheck),
            Self::EdgeFull => (EdgeOnly, AlwaysCheck),
        }
    }

    /// The configuration with default ratios.
    pub const fn config(self) -> ErrorCorrectionConfig {
        let (mode, distance_check) = self.modes();
        ErrorCorrectionConfig {
            mode,
            distance_check,
            min_deviation_ratio: ErrorCorrectionConfig::DEFAULT_MIN_DEVIATION_RATIO,
            min_improve_ratio: ErrorCorrectionConfig::DEFAULT_MIN_IMPROVE_RATIO,
        }
    }
}

/// Settings shared by every glyph of a generation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratorAttributes {
    /// Whether overlapping contours are resolved with the fill rule.
    pub overlap_support: bool,
    /// Whether the sign of every sample is corrected from the fill rule after
    /// generation.
    pub scanline_pass: bool,
    /// Error correction settings.
    pub error_correction: ErrorCorrectionConfig,
}

impl Default for GeneratorAttributes {
    fn default() -> Self {
        Self {
            overlap_support: true,
            scanline_pass: false,
            error_correction: ErrorCorrectionConfig::default(),
        }
    }
}

/// The affine mapping from shape units to box-local pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Pixels per shape unit.
    pub scale: f64,
    /// Offset applied in shape units before scaling.
    pub translate: Vec2,
}

impl Projection {
    /// Maps a shape point to box-local pixel coordinates.
    pub fn project(&self, point: Point) -> Point {
        ((point.to_vec2() + self.translate) * self.scale).to_point()
    }

    /// Maps box-local pixel coordinates to a shape point.
    pub fn unproject(&self, point: Point) -> Point {
        (point.to_vec2() / self.scale - self.translate).to_point()
    }

    /// The shape point sampled by pixel `(x, y)`, at the pixel's center.
    pub fn pixel_center(&self, x: u32, y: u32) -> Point {
        self.unproject(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5))
    }
}

/// Normalized samples for one glyph box, bottom row first.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleTile {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<f32>,
}

impl SampleTile {
    /// Creates a tile filled with zeros.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width as usize * height as usize * channels],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels
    }

    /// The samples of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels]
    }

    /// The samples of one pixel, mutably.
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let start = self.offset(x, y);
        &mut self.data[start..start + self.channels]
    }

    /// One row of samples.
    pub fn row(&self, y: u32) -> &[f32] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * self.channels]
    }

    /// Coordinates of the first non-finite sample, if any.
    pub fn find_non_finite(&self) -> Option<(u32, u32)> {
        let index = self.data.iter().position(|value| !value.is_finite())?;
        let pixel = index / self.channels.max(1);
        let width = self.width.max(1) as usize;
        let x = u32::try_from(pixel % width).ok()?;
        let y = u32::try_from(pixel / width).ok()?;
        Some((x, y))
    }
}

/// Computes the samples of one glyph.
///
/// Implementations must be pure functions of their inputs: the dispatcher
/// calls them concurrently for different glyphs.
pub trait DistanceGenerator: Send + Sync {
    /// Fills `tile`, which matches the glyph's box in size and `kind` in channels.
    fn generate(
        &self,
        glyph: &GlyphGeometry,
        kind: GeneratorKind,
        attributes: &GeneratorAttributes,
        tile: &mut SampleTile,
    ) -> Result<(), GenerateError>;
}

/// Exact nearest-point generation for every [`GeneratorKind`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceGenerator;

/// The nearest point on one edge.
#[derive(Clone, Copy, Debug)]
struct EdgeHit {
    distance: f64,
    /// How perpendicular the direction to the point is to the edge, in `0..=1`.
    orthogonality: f64,
    /// Pseudo-distance magnitude.
    pseudo: f64,
    /// `1.0` when the point is to the left of the edge.
    side: f64,
}

impl EdgeHit {
    fn new(edge: &Edge, point: Point) -> Self {
        let nearest = edge.segment.nearest(point, NEAREST_ACCURACY);
        let t = nearest.t.clamp(0.0, 1.0);
        let direction = edge.direction(t);
        let offset = point - edge.point(t);
        let distance = nearest.distance_sq.max(0.0).sqrt();
        let cross = direction.cross(offset);
        let length = direction.hypot();
        let orthogonality = if distance.is_nearly_zero() || length.is_nearly_zero() {
            0.0
        } else {
            (cross / (length * distance)).abs()
        };

        let mut pseudo = distance;
        if !length.is_nearly_zero() {
            let along = direction.dot(offset) / length;
            let beyond = (t <= 0.0 && along < 0.0) || (t >= 1.0 && along > 0.0);
            if beyond {
                pseudo = pseudo.min((cross / length).abs());
            }
        }
        Self {
            distance,
            orthogonality,
            pseudo,
            side: if cross >= 0.0 { 1.0 } else { -1.0 },
        }
    }

    /// Whether this hit should be preferred over `other` as the nearest edge.
    fn is_closer_than(&self, other: &Self) -> bool {
        if (self.distance - other.distance).abs() <= DISTANCE_TOLERANCE {
            self.orthogonality > other.orthogonality
        } else {
            self.distance < other.distance
        }
    }
}

/// The nearest edge among those accepted by `filter`.
fn nearest_hit(
    outline: &Outline,
    point: Point,
    filter: impl Fn(&Edge) -> bool,
) -> Option<EdgeHit> {
    outline
        .edges()
        .filter(|edge| filter(edge))
        .map(|edge| EdgeHit::new(edge, point))
        .reduce(|best, hit| if hit.is_closer_than(&best) { hit } else { best })
}

impl ReferenceGenerator {
    /// Signed true distance, positive inside.
    fn true_distance(outline: &Outline, point: Point) -> Option<f64> {
        let hit = nearest_hit(outline, point, |_| true)?;
        let sign = if outline.contains(point) { 1.0 } else { -1.0 };
        Some(sign * hit.distance)
    }

    /// Signed pseudo-distance to the nearest edge among those accepted by `filter`.
    fn pseudo_distance(
        outline: &Outline,
        orientation: f64,
        point: Point,
        filter: impl Fn(&Edge) -> bool,
    ) -> Option<f64> {
        let hit = nearest_hit(outline, point, filter)?;
        Some(orientation * hit.side * hit.pseudo)
    }
}

impl DistanceGenerator for ReferenceGenerator {
    fn generate(
        &self,
        glyph: &GlyphGeometry,
        kind: GeneratorKind,
        _attributes: &GeneratorAttributes,
        tile: &mut SampleTile,
    ) -> Result<(), GenerateError> {
        let glyph_box = glyph.glyph_box();
        if tile.width() != glyph_box.rect.width
            || tile.height() != glyph_box.rect.height
            || tile.channels() != kind.channels()
        {
            return Err(GenerateError::TileMismatch);
        }
        let range = glyph_box.range;
        let is_positive = |value: f64| value.is_finite() && value > 0.0;
        if !is_positive(glyph_box.scale) || !is_positive(range.width()) {
            return Err(GenerateError::DegenerateBox);
        }

        let outline = glyph.outline();
        let orientation = outline.orientation();
        let projection = glyph.projection();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "samples are stored in single precision"
        )]
        let normalize = |distance: f64| ((distance - range.lower) / range.width()) as f32;

        for y in 0..tile.height() {
            for x in 0..tile.width() {
                let point = projection.pixel_center(x, y);
                let pixel = tile.pixel_mut(x, y);
                match kind {
                    GeneratorKind::Scanline => {
                        pixel[0] = if outline.contains(point) { 1.0 } else { 0.0 };
                    }
                    GeneratorKind::Sdf => {
                        let distance = Self::true_distance(outline, point).unwrap_or(range.lower);
                        pixel[0] = normalize(distance);
                    }
                    GeneratorKind::Psdf => {
                        let distance = Self::pseudo_distance(outline, orientation, point, |_| true)
                            .unwrap_or(range.lower);
                        pixel[0] = normalize(distance);
                    }
                    GeneratorKind::Msdf | GeneratorKind::Mtsdf => {
                        for (channel, sample) in pixel.iter_mut().take(3).enumerate() {
                            let distance =
                                Self::pseudo_distance(outline, orientation, point, |edge| {
                                    edge.color.has_channel(channel)
                                })
                                .or_else(|| {
                                    Self::pseudo_distance(outline, orientation, point, |_| true)
                                })
                                .unwrap_or(range.lower);
                            *sample = normalize(distance);
                        }
                        if kind == GeneratorKind::Mtsdf {
                            let distance =
                                Self::true_distance(outline, point).unwrap_or(range.lower);
                            pixel[3] = normalize(distance);
                        }
                    }
                }
            }
        }

        match tile.find_non_finite() {
            Some((x, y)) => Err(GenerateError::NonFiniteSample { x, y }),
            None => Ok(()),
        }
    }
}

/// Makes the sign of every sample agree with the non-zero fill rule.
///
/// Samples whose decoded inside/outside state disagrees with the fill rule at
/// the pixel center are mirrored around `0.5`. For [`GeneratorKind::Mtsdf`] the
/// true-distance channel is left alone.
pub fn scanline_sign_correction(
    glyph: &GlyphGeometry,
    kind: GeneratorKind,
    tile: &mut SampleTile,
) {
    if kind == GeneratorKind::Scanline {
        return;
    }
    let outline = glyph.outline();
    let projection = glyph.projection();
    for y in 0..tile.height() {
        for x in 0..tile.width() {
            let inside = outline.contains(projection.pixel_center(x, y));
            let pixel = tile.pixel_mut(x, y);
            let signed_channels = if kind.is_multi_channel() { 3 } else { 1 };
            let decoded = if kind.is_multi_channel() {
                median(pixel[0], pixel[1], pixel[2])
            } else {
                pixel[0]
            };
            if (decoded > 0.5) != inside {
                for sample in &mut pixel[..signed_channels] {
                    *sample = 1.0 - *sample;
                }
            }
        }
    }
}
