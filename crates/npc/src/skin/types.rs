use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::hashing::fingerprint_skin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The texture geometries the client can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkinSize {
    /// 64x32, legacy single-layer layout.
    Classic,
    /// 64x64, layered layout.
    Standard,
    /// 128x128.
    HighDefinition,
}

impl SkinSize {
    pub const ALL: [SkinSize; 3] = [Self::Classic, Self::Standard, Self::HighDefinition];

    pub fn from_dimensions(dimensions: Dimensions) -> Option<Self> {
        match (dimensions.width, dimensions.height) {
            (64, 32) => Some(Self::Classic),
            (64, 64) => Some(Self::Standard),
            (128, 128) => Some(Self::HighDefinition),
            _ => None,
        }
    }

    pub fn dimensions(self) -> Dimensions {
        let (width, height) = match self {
            Self::Classic => (64, 32),
            Self::Standard => (64, 64),
            Self::HighDefinition => (128, 128),
        };
        Dimensions { width, height }
    }

    pub fn width(self) -> u32 {
        self.dimensions().width
    }

    pub fn height(self) -> u32 {
        self.dimensions().height
    }

    pub fn pixel_buffer_len(self) -> usize {
        self.width() as usize * self.height() as usize * 4
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SkinDescriptor {
    size: SkinSize,
    pixels: Vec<u8>,
    model_data: Vec<u8>,
    model_identifier: String,
}

impl SkinDescriptor {
    pub(crate) fn new(
        size: SkinSize,
        pixels: Vec<u8>,
        model_data: Vec<u8>,
        model_identifier: String,
    ) -> Self {
        debug_assert_eq!(pixels.len(), size.pixel_buffer_len());
        Self {
            size,
            pixels,
            model_data,
            model_identifier,
        }
    }

    pub fn size(&self) -> SkinSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width()
    }

    pub fn height(&self) -> u32 {
        self.size.height()
    }

    /// RGBA, row-major, four bytes per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The raw model JSON exactly as it was ingested.
    pub fn model_data(&self) -> &[u8] {
        &self.model_data
    }

    pub fn model_identifier(&self) -> &str {
        &self.model_identifier
    }

    pub fn fingerprint_sha256_hex(&self) -> String {
        fingerprint_skin(self)
    }
}

impl fmt::Debug for SkinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkinDescriptor")
            .field("size", &self.size.dimensions().to_string())
            .field("pixel_bytes", &self.pixels.len())
            .field("model_bytes", &self.model_data.len())
            .field("model_identifier", &self.model_identifier)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinInput {
    Texture,
    Model,
}

impl fmt::Display for SkinInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Texture => f.write_str("texture"),
            Self::Model => f.write_str("model"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinErrorCode {
    Read,
    TextureDecode,
    InvalidDimensions,
    ModelDecode,
    ModelSchema,
    DimensionMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Read,
    Decode,
    Validate,
    Schema,
    CrossCheck,
}

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("failed to open skin {input} file {path}: {source}")]
    OpenFile {
        input: SkinInput,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read skin {input}: {source}")]
    Read {
        input: SkinInput,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode skin texture: {0}")]
    TextureDecode(#[source] image::ImageError),
    #[error("invalid skin texture dimensions {width}x{height}; expected 64x32, 64x64 or 128x128")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("failed to decode skin model json: {0}")]
    ModelDecode(#[source] serde_json::Error),
    #[error("invalid skin model at {path}: {message}")]
    ModelSchema { path: String, message: String },
    #[error("skin texture dimensions did not match model: model declares {model} but texture is {texture}")]
    DimensionMismatch {
        texture: Dimensions,
        model: Dimensions,
    },
}

impl SkinError {
    pub fn code(&self) -> SkinErrorCode {
        match self {
            Self::OpenFile { .. } | Self::Read { .. } => SkinErrorCode::Read,
            Self::TextureDecode(_) => SkinErrorCode::TextureDecode,
            Self::InvalidDimensions { .. } => SkinErrorCode::InvalidDimensions,
            Self::ModelDecode(_) => SkinErrorCode::ModelDecode,
            Self::ModelSchema { .. } => SkinErrorCode::ModelSchema,
            Self::DimensionMismatch { .. } => SkinErrorCode::DimensionMismatch,
        }
    }

    pub fn stage(&self) -> IngestStage {
        match self.code() {
            SkinErrorCode::Read => IngestStage::Read,
            SkinErrorCode::TextureDecode | SkinErrorCode::ModelDecode => IngestStage::Decode,
            SkinErrorCode::InvalidDimensions => IngestStage::Validate,
            SkinErrorCode::ModelSchema => IngestStage::Schema,
            SkinErrorCode::DimensionMismatch => IngestStage::CrossCheck,
        }
    }
}
