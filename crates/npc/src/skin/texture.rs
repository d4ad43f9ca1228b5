use std::io::Cursor;

use image::{ImageError, ImageReader};

use super::types::{Dimensions, SkinError, SkinSize};

#[derive(Debug, Clone)]
pub(crate) struct DecodedTexture {
    pub size: SkinSize,
    pub pixels: Vec<u8>,
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, SkinError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|error| SkinError::TextureDecode(ImageError::IoError(error)))
}

pub(crate) fn decode_texture(bytes: &[u8]) -> Result<DecodedTexture, SkinError> {
    // Header first, so oversized images are refused before any pixel is decoded.
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(SkinError::TextureDecode)?;
    let dimensions = Dimensions { width, height };
    let size = SkinSize::from_dimensions(dimensions).ok_or(SkinError::InvalidDimensions {
        width: dimensions.width,
        height: dimensions.height,
    })?;

    let decoded = reader(bytes)?.decode().map_err(SkinError::TextureDecode)?;
    // Grey, palette and 16-bit sources all end up as straight 8-bit RGBA.
    let pixels = decoded.into_rgba8().into_raw();
    Ok(DecodedTexture { size, pixels })
}
