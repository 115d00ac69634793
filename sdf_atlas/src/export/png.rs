// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::Write;

use super::ExportError;
use crate::bitmap::AtlasImage;

/// Encodes the atlas as an 8-bit PNG, top row first.
///
/// Floating point atlases are quantized the same way byte atlases are.
pub fn write_png<W: Write>(writer: W, image: &AtlasImage) -> Result<(), ExportError> {
    let color = match image.channels() {
        1 => png::ColorType::Grayscale,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        channels => return Err(ExportError::UnsupportedChannels(channels)),
    };
    let bytes = image.to_bytes();
    let row_len = image.width() as usize * image.channels();
    let mut data = Vec::with_capacity(bytes.len());
    if row_len > 0 {
        for row in bytes.chunks_exact(row_len).rev() {
            data.extend_from_slice(row);
        }
    }

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bitmap::{AtlasBitmap, AtlasImage, PixelRect};

    use super::write_png;

    #[test]
    fn rows_are_written_upright() {
        let mut bitmap = AtlasBitmap::<u8>::new(2, 2, 3);
        {
            let mut regions = bitmap
                .glyph_regions(&[PixelRect::new(0, 0, 1, 1)])
                .unwrap();
            regions[0].set_pixel(0, 0, &[10, 20, 30]);
        }
        let mut output = Vec::new();
        write_png(&mut output, &AtlasImage::Byte(bitmap)).unwrap();

        let decoder = png::Decoder::new(output.as_slice());
        let mut reader = decoder.read_info().unwrap();
        let mut pixels = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        // The bottom-left pixel ends up in the last row.
        assert_eq!(&pixels[..6], [0; 6]);
        assert_eq!(&pixels[6..9], [10, 20, 30]);
    }

    #[test]
    fn unsupported_channel_counts_are_rejected() {
        let bitmap = AtlasBitmap::<f32>::new(1, 1, 2);
        let mut output = Vec::new();
        assert!(write_png(&mut output, &AtlasImage::Float(bitmap)).is_err());
        assert!(output.is_empty());
    }
}
