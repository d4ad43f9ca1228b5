#[cfg(test)]
pub(crate) mod fixtures;
mod hashing;
mod model;
mod pipeline;
mod texture;
mod types;

pub use pipeline::{ingest_skin, parse_skin, read_skin};
pub use types::{
    Dimensions, IngestStage, SkinDescriptor, SkinError, SkinErrorCode, SkinInput, SkinSize,
};
