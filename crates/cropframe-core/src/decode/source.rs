//! Decoding of the user's selected image file.

use std::io::Cursor;

use image::ImageReader;

use super::{DecodeError, RasterImage};

/// Decode an image file (JPEG or PNG) into an RGBA bitmap.
///
/// The returned image's dimensions are the natural dimensions used by the
/// rasterizer.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are empty or the format
/// cannot be recognized.
/// Returns `DecodeError::CorruptedFile` if the data is recognized but broken.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let source = RasterImage::from_rgba_image(img.into_rgba8());
    tracing::debug!(
        width = source.width,
        height = source.height,
        "Decoded source image"
    );
    Ok(source)
}
