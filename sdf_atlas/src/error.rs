// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt;

use crate::export::ExportError;
use crate::glyph::GlyphIdentifier;
use crate::packer::PackError;

/// A configuration that has no solution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// A fixed or minimum scale that is not a positive finite number.
    InvalidScale(f64),
    /// Fixed atlas dimensions with zero area.
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A fixed grid cell with zero area.
    InvalidCell {
        /// Requested cell width.
        width: u32,
        /// Requested cell height.
        height: u32,
    },
    /// A distance range that is not finite or whose lower bound exceeds its upper bound.
    InvalidRange {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
    /// A padding value that is not finite.
    InvalidPadding,
    /// A grid with a fixed column count of zero.
    ZeroColumns,
    /// An angle threshold that is not a positive finite number.
    InvalidAngleThreshold(f64),
    /// A miter limit that is negative or not finite.
    InvalidMiterLimit(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScale(scale) => write!(f, "invalid glyph scale {scale}"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid atlas dimensions {width}x{height}")
            }
            Self::InvalidCell { width, height } => {
                write!(f, "invalid grid cell dimensions {width}x{height}")
            }
            Self::InvalidRange { lower, upper } => {
                write!(f, "invalid distance range {lower}..{upper}")
            }
            Self::InvalidPadding => f.write_str("padding must be finite"),
            Self::ZeroColumns => f.write_str("grid column count must be positive"),
            Self::InvalidAngleThreshold(angle) => {
                write!(f, "invalid corner angle threshold {angle}")
            }
            Self::InvalidMiterLimit(limit) => write!(f, "invalid miter limit {limit}"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Generation regions that do not partition the bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// A glyph rectangle extends past the bitmap.
    OutOfBounds {
        /// Index of the offending glyph.
        glyph: usize,
    },
    /// Two glyph rectangles share pixels.
    Overlap {
        /// Index of the glyph that owns the pixels first.
        first: usize,
        /// Index of the glyph that claims them again.
        second: usize,
    },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { glyph } => {
                write!(f, "rectangle of glyph {glyph} lies outside the atlas")
            }
            Self::Overlap { first, second } => {
                write!(f, "rectangles of glyphs {first} and {second} overlap")
            }
        }
    }
}

impl core::error::Error for RegionError {}

/// Failure to generate a single glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GenerateError {
    /// The sample tile does not match the glyph's box.
    TileMismatch,
    /// The glyph box has a non-positive scale or an empty range.
    DegenerateBox,
    /// A computed sample was NaN or infinite.
    NonFiniteSample {
        /// Column within the glyph box.
        x: u32,
        /// Row within the glyph box, counted from the bottom.
        y: u32,
    },
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileMismatch => f.write_str("sample tile does not match glyph box"),
            Self::DegenerateBox => f.write_str("glyph box has no scale or no distance range"),
            Self::NonFiniteSample { x, y } => write!(f, "non-finite sample at ({x}, {y})"),
        }
    }
}

impl core::error::Error for GenerateError {}

/// Failure to read glyphs from a font.
#[derive(Debug)]
pub enum LoadError {
    /// The font data could not be parsed.
    Font(skrifa::raw::ReadError),
    /// The font has no outline for the glyph.
    GlyphNotFound(GlyphIdentifier),
    /// The glyph outline could not be decoded.
    Outline {
        /// Index of the glyph.
        glyph: u32,
        /// The decoding error.
        error: skrifa::outline::DrawError,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Font(error) => write!(f, "failed to read font: {error}"),
            Self::GlyphNotFound(GlyphIdentifier::Codepoint(codepoint)) => {
                write!(f, "font has no glyph for U+{codepoint:04X}")
            }
            Self::GlyphNotFound(GlyphIdentifier::Index(index)) => {
                write!(f, "font has no glyph with index {index}")
            }
            Self::Outline { glyph, error } => {
                write!(f, "failed to decode outline of glyph {glyph}: {error}")
            }
        }
    }
}

impl core::error::Error for LoadError {}

impl From<skrifa::raw::ReadError> for LoadError {
    fn from(error: skrifa::raw::ReadError) -> Self {
        Self::Font(error)
    }
}

/// Any failure that stops an atlas run.
#[derive(Debug)]
pub enum AtlasError {
    /// The configuration has no solution.
    Config(ConfigError),
    /// Glyphs could not be loaded.
    Load(LoadError),
    /// Glyphs could not be packed.
    Pack(PackError),
    /// Packed rectangles do not partition the bitmap.
    Region(RegionError),
    /// A sink failed.
    Export(ExportError),
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "configuration error: {error}"),
            Self::Load(error) => write!(f, "load error: {error}"),
            Self::Pack(error) => write!(f, "packing error: {error}"),
            Self::Region(error) => write!(f, "region error: {error}"),
            Self::Export(error) => write!(f, "export error: {error}"),
        }
    }
}

impl core::error::Error for AtlasError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::Load(error) => Some(error),
            Self::Pack(error) => Some(error),
            Self::Region(error) => Some(error),
            Self::Export(error) => Some(error),
        }
    }
}

impl From<ConfigError> for AtlasError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<LoadError> for AtlasError {
    fn from(error: LoadError) -> Self {
        Self::Load(error)
    }
}

impl From<PackError> for AtlasError {
    fn from(error: PackError) -> Self {
        Self::Pack(error)
    }
}

impl From<RegionError> for AtlasError {
    fn from(error: RegionError) -> Self {
        Self::Region(error)
    }
}

impl From<ExportError> for AtlasError {
    fn from(error: ExportError) -> Self {
        Self::Export(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            ConfigError::InvalidDimensions {
                width: 0,
                height: 64
            }
            .to_string(),
            "invalid atlas dimensions 0x64"
        );
        assert_eq!(
            RegionError::Overlap {
                first: 1,
                second: 4
            }
            .to_string(),
            "rectangles of glyphs 1 and 4 overlap"
        );
        assert_eq!(
            LoadError::GlyphNotFound(GlyphIdentifier::Codepoint(0x41)).to_string(),
            "font has no glyph for U+0041"
        );
    }

    #[test]
    fn atlas_error_exposes_source() {
        use core::error::Error as _;
        let error = AtlasError::from(PackError::Unplaced(3));
        assert!(error.source().is_some());
        assert!(error.to_string().contains('3'));
    }
}
