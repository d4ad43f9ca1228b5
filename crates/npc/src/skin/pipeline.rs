use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use super::model::read_model_description;
use super::texture::decode_texture;
use super::types::{SkinDescriptor, SkinError, SkinInput};

/// Decodes a skin texture and its geometry model into a validated descriptor.
///
/// Nothing is returned unless the texture is 64x32, 64x64 or 128x128 and the
/// model declares exactly the same texture dimensions.
pub fn ingest_skin(texture_bytes: &[u8], model_bytes: &[u8]) -> Result<SkinDescriptor, SkinError> {
    let texture = decode_texture(texture_bytes)?;
    let model = read_model_description(model_bytes)?;

    let texture_dimensions = texture.size.dimensions();
    if model.texture != texture_dimensions {
        return Err(SkinError::DimensionMismatch {
            texture: texture_dimensions,
            model: model.texture,
        });
    }

    let skin = SkinDescriptor::new(
        texture.size,
        texture.pixels,
        model_bytes.to_vec(),
        model.identifier,
    );
    info!(
        dimensions = %texture_dimensions,
        model_identifier = skin.model_identifier(),
        fingerprint = %skin.fingerprint_sha256_hex(),
        "skin_ingested"
    );
    Ok(skin)
}

pub fn read_skin<T: Read, M: Read>(mut texture: T, mut model: M) -> Result<SkinDescriptor, SkinError> {
    let texture_bytes = read_all(&mut texture, SkinInput::Texture)?;
    let model_bytes = read_all(&mut model, SkinInput::Model)?;
    ingest_skin(&texture_bytes, &model_bytes)
}

pub fn parse_skin(
    texture_path: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
) -> Result<SkinDescriptor, SkinError> {
    let texture_path = texture_path.as_ref();
    let model_path = model_path.as_ref();
    debug!(
        texture = %texture_path.display(),
        model = %model_path.display(),
        "skin_parse_files"
    );
    let texture = open(texture_path, SkinInput::Texture)?;
    let model = open(model_path, SkinInput::Model)?;
    read_skin(texture, model)
}

fn open(path: &Path, input: SkinInput) -> Result<File, SkinError> {
    File::open(path).map_err(|source| SkinError::OpenFile {
        input,
        path: path.to_path_buf(),
        source,
    })
}

fn read_all(reader: &mut impl Read, input: SkinInput) -> Result<Vec<u8>, SkinError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| SkinError::Read { input, source })?;
    Ok(bytes)
}
