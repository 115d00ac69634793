// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::Write;

use super::{ExportError, YDirection};
use crate::bitmap::{AtlasBitmap, AtlasImage, Sample};

/// Byte order of floating point samples in raw output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Writes the samples without a header.
///
/// Byte atlases write one byte per sample, float atlases four. Rows start at
/// the bottom for [`YDirection::BottomUp`] and at the top otherwise.
pub fn write_raw<W: Write>(
    mut writer: W,
    image: &AtlasImage,
    y_direction: YDirection,
    endianness: Endianness,
) -> Result<(), ExportError> {
    match image {
        AtlasImage::Byte(bitmap) => {
            for_each_row(bitmap, y_direction, |row| writer.write_all(row))?;
        }
        AtlasImage::Float(bitmap) => {
            let mut bytes = Vec::with_capacity(4 * bitmap.width() as usize * bitmap.channels());
            for_each_row(bitmap, y_direction, |row| {
                bytes.clear();
                for value in row {
                    bytes.extend_from_slice(&match endianness {
                        Endianness::Little => value.to_le_bytes(),
                        Endianness::Big => value.to_be_bytes(),
                    });
                }
                writer.write_all(&bytes)
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn for_each_row<T: Sample>(
    bitmap: &AtlasBitmap<T>,
    y_direction: YDirection,
    mut f: impl FnMut(&[T]) -> std::io::Result<()>,
) -> std::io::Result<()> {
    let height = bitmap.height();
    for y in 0..height {
        let y = match y_direction {
            YDirection::BottomUp => y,
            YDirection::TopDown => height - 1 - y,
        };
        f(bitmap.row(y))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bitmap::{AtlasBitmap, AtlasImage, PixelRect, Sample};

    use super::{write_raw, Endianness, YDirection};

    fn marked<T: Sample>(value: T) -> AtlasBitmap<T> {
        let mut bitmap = AtlasBitmap::new(2, 2, 1);
        let mut regions = bitmap.glyph_regions(&[PixelRect::new(1, 0, 1, 1)]).unwrap();
        regions[0].set_pixel(0, 0, &[value]);
        drop(regions);
        bitmap
    }

    #[test]
    fn byte_rows_follow_direction() {
        let image = AtlasImage::Byte(marked(7_u8));
        let mut bottom_up = Vec::new();
        write_raw(&mut bottom_up, &image, YDirection::BottomUp, Endianness::Little).unwrap();
        assert_eq!(bottom_up, [0, 7, 0, 0]);

        let mut top_down = Vec::new();
        write_raw(&mut top_down, &image, YDirection::TopDown, Endianness::Little).unwrap();
        assert_eq!(top_down, [0, 0, 0, 7]);
    }

    #[test]
    fn float_samples_use_requested_byte_order() {
        let image = AtlasImage::Float(marked(1.0_f32));
        let mut little = Vec::new();
        write_raw(&mut little, &image, YDirection::BottomUp, Endianness::Little).unwrap();
        assert_eq!(little.len(), 16);
        assert_eq!(little[4..8], 1.0_f32.to_le_bytes());

        let mut big = Vec::new();
        write_raw(&mut big, &image, YDirection::BottomUp, Endianness::Big).unwrap();
        assert_eq!(big[4..8], 1.0_f32.to_be_bytes());
    }
}
