use serde::Deserialize;
use serde_json::Value;

use super::types::{Dimensions, SkinError};

const GEOMETRY_KEY: &str = "minecraft:geometry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelDescription {
    pub identifier: String,
    pub texture: Dimensions,
}

#[derive(Debug, Deserialize)]
struct GeometryEntry {
    description: GeometryDescription,
}

#[derive(Debug, Deserialize)]
struct GeometryDescription {
    identifier: String,
    texture_width: f64,
    texture_height: f64,
}

pub(crate) fn read_model_description(bytes: &[u8]) -> Result<ModelDescription, SkinError> {
    let root = serde_json::from_slice::<Value>(bytes).map_err(SkinError::ModelDecode)?;

    let entries = root
        .get(GEOMETRY_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| schema_error(GEOMETRY_KEY, "expected an array of geometry entries"))?;
    // Only the first entry defines the default geometry; later entries are not inspected.
    let first = entries
        .first()
        .ok_or_else(|| schema_error(GEOMETRY_KEY, "geometry array is empty"))?;

    let entry_path = format!("{GEOMETRY_KEY}[0]");
    let entry = match serde_path_to_error::deserialize::<_, GeometryEntry>(first) {
        Ok(entry) => entry,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let full_path = if path.is_empty() || path == "." {
                entry_path
            } else {
                format!("{entry_path}.{path}")
            };
            return Err(schema_error(&full_path, source.to_string()));
        }
    };

    let description = entry.description;
    let width = texture_extent(description.texture_width, &entry_path, "texture_width")?;
    let height = texture_extent(description.texture_height, &entry_path, "texture_height")?;
    Ok(ModelDescription {
        identifier: description.identifier,
        texture: Dimensions { width, height },
    })
}

fn texture_extent(raw: f64, entry_path: &str, field: &str) -> Result<u32, SkinError> {
    let path = format!("{entry_path}.description.{field}");
    let in_range = raw.is_finite() && raw >= 0.0 && raw <= f64::from(u32::MAX);
    if !in_range {
        return Err(schema_error(
            &path,
            format!("expected a non-negative integer within u32 range, got {raw}"),
        ));
    }
    // Texture extents are pixel counts; fractions are refused rather than truncated.
    if raw.fract() != 0.0 {
        return Err(schema_error(
            &path,
            format!("texture extent must be a whole number of pixels, got fractional {raw}"),
        ));
    }
    Ok(raw as u32)
}

fn schema_error(path: &str, message: impl Into<String>) -> SkinError {
    SkinError::ModelSchema {
        path: path.to_string(),
        message: message.into(),
    }
}
