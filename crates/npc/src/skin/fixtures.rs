use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::json;

use super::{ingest_skin, SkinDescriptor};

pub(crate) fn texture_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub(crate) fn model_json(width: u32, height: u32, identifier: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "format_version": "1.12.0",
        "minecraft:geometry": [{
            "description": {
                "identifier": identifier,
                "texture_width": width,
                "texture_height": height
            },
            "bones": []
        }]
    }))
    .expect("encode model")
}

pub(crate) fn steve_skin() -> SkinDescriptor {
    ingest_skin(
        &texture_png(64, 64),
        &model_json(64, 64, "geometry.humanoid.custom"),
    )
    .expect("steve skin")
}
