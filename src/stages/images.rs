// src/stages/images.rs

//! Lossless-ish image re-encoding.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageFormat;
use tracing::debug;

/// Re-encode `bytes` and return the smaller of the original and the result.
///
/// PNG is re-compressed losslessly; JPEG is re-encoded at a quality derived
/// from `level` (0–7, higher means smaller files). Any other format is
/// returned unchanged.
pub fn optimize(bytes: &[u8], format: ImageFormat, level: u8) -> Result<Vec<u8>> {
    let encoded = match format {
        ImageFormat::Png => encode_png(bytes, level)?,
        ImageFormat::Jpeg => encode_jpeg(bytes, level)?,
        other => {
            debug!(?other, "format not optimised; copying as is");
            return Ok(bytes.to_vec());
        }
    };

    if encoded.len() < bytes.len() {
        Ok(encoded)
    } else {
        Ok(bytes.to_vec())
    }
}

fn encode_png(bytes: &[u8], level: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png).context("decoding png")?;
    let compression = match level {
        0 => CompressionType::Fast,
        1..=3 => CompressionType::Default,
        _ => CompressionType::Best,
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
    img.write_with_encoder(encoder).context("encoding png")?;
    Ok(out)
}

fn encode_jpeg(bytes: &[u8], level: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg).context("decoding jpeg")?;
    let quality = 92u8.saturating_sub(level.min(7) * 3);

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.to_rgb8().write_with_encoder(encoder).context("encoding jpeg")?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn sample_png() -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(32, 32, |x, _| Rgba([(x * 8) as u8, 0, 0, 255]));
        let mut out = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
        img.write_with_encoder(encoder).unwrap();
        out
    }

    #[test]
    fn png_never_grows_and_stays_decodable() {
        let original = sample_png();
        let optimised = optimize(&original, ImageFormat::Png, 7).unwrap();

        assert!(optimised.len() <= original.len());
        let decoded = image::load_from_memory(&optimised).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }

    #[test]
    fn unsupported_formats_pass_through() {
        let bytes = b"GIF89a-not-really".to_vec();
        assert_eq!(optimize(&bytes, ImageFormat::Gif, 3).unwrap(), bytes);
    }

    #[test]
    fn corrupt_png_is_an_error() {
        assert!(optimize(b"definitely not a png", ImageFormat::Png, 3).is_err());
    }
}
