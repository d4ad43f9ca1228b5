use std::env;
use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageError, ImageFormat, Rgba, RgbaImage};
use npc::{ingest_skin, parse_skin, RuntimeConfig, SkinDescriptor, SkinError};
use serde_json::json;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TEXTURE_ENV_VAR: &str = "NPC_SANDBOX_TEXTURE";
const MODEL_ENV_VAR: &str = "NPC_SANDBOX_MODEL";
const SYNTHESIZED_SIDE: u32 = 64;
const SYNTHESIZED_IDENTIFIER: &str = "geometry.sandbox.guard";

#[derive(Debug, Error)]
pub(crate) enum SandboxError {
    #[error("{set} is set but {missing} is not; provide both skin paths or neither")]
    IncompleteSkinPaths {
        set: &'static str,
        missing: &'static str,
    },
    #[error("failed to encode synthesized skin texture")]
    SynthesizeTexture(#[source] ImageError),
    #[error("failed to encode synthesized skin model")]
    SynthesizeModel(#[source] serde_json::Error),
    #[error(transparent)]
    Skin(#[from] SkinError),
    #[error("npc {name} disappeared from the host before the scenario finished")]
    NpcVanished { name: String },
    #[error("attack callback ran {calls} times; expected exactly once")]
    AttackCallbackCount { calls: usize },
    #[error("invulnerable npc lost health: {before} -> {after}")]
    TookDamage { before: f64, after: f64 },
    #[error("chunk loader did not follow npc into the new world within {waited_ms}ms")]
    LoaderDidNotFollow { waited_ms: u64 },
    #[error("chunk loader was not released when the npc was removed")]
    LoaderNotReleased,
}

pub(crate) struct SandboxWiring {
    pub(crate) config: RuntimeConfig,
    pub(crate) skin: SkinDescriptor,
}

pub(crate) fn build_sandbox() -> Result<SandboxWiring, SandboxError> {
    init_tracing();
    info!("=== NPC Sandbox Startup ===");

    let config = RuntimeConfig::from_env();
    let skin = load_skin()?;
    info!(
        width = skin.width(),
        height = skin.height(),
        identifier = skin.model_identifier(),
        fingerprint = %skin.fingerprint_sha256_hex(),
        "sandbox_skin_ready"
    );

    Ok(SandboxWiring { config, skin })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_skin() -> Result<SkinDescriptor, SandboxError> {
    match skin_paths_from_env()? {
        Some((texture, model)) => {
            info!(texture = %texture.display(), model = %model.display(), "sandbox_skin_from_disk");
            Ok(parse_skin(&texture, &model)?)
        }
        None => synthesize_skin(),
    }
}

fn skin_paths_from_env() -> Result<Option<(PathBuf, PathBuf)>, SandboxError> {
    resolve_skin_paths(env_path(TEXTURE_ENV_VAR), env_path(MODEL_ENV_VAR))
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn resolve_skin_paths(
    texture: Option<PathBuf>,
    model: Option<PathBuf>,
) -> Result<Option<(PathBuf, PathBuf)>, SandboxError> {
    match (texture, model) {
        (Some(texture), Some(model)) => Ok(Some((texture, model))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(SandboxError::IncompleteSkinPaths {
            set: TEXTURE_ENV_VAR,
            missing: MODEL_ENV_VAR,
        }),
        (None, Some(_)) => Err(SandboxError::IncompleteSkinPaths {
            set: MODEL_ENV_VAR,
            missing: TEXTURE_ENV_VAR,
        }),
    }
}

pub(crate) fn synthesize_skin() -> Result<SkinDescriptor, SandboxError> {
    let image = RgbaImage::from_fn(SYNTHESIZED_SIDE, SYNTHESIZED_SIDE, |x, y| {
        // Head band in the top quarter, body below.
        if y < SYNTHESIZED_SIDE / 4 {
            Rgba([214, 168, 120, 255])
        } else {
            Rgba([40, 70 + (x % 16) as u8 * 4, 140, 255])
        }
    });
    let mut texture = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut texture), ImageFormat::Png)
        .map_err(SandboxError::SynthesizeTexture)?;

    let model = serde_json::to_vec(&json!({
        "format_version": "1.12.0",
        "minecraft:geometry": [{
            "description": {
                "identifier": SYNTHESIZED_IDENTIFIER,
                "texture_width": SYNTHESIZED_SIDE,
                "texture_height": SYNTHESIZED_SIDE
            },
            "bones": []
        }]
    }))
    .map_err(SandboxError::SynthesizeModel)?;

    info!(side = SYNTHESIZED_SIDE, "sandbox_skin_synthesized");
    Ok(ingest_skin(&texture, &model)?)
}
