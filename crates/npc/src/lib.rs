mod config;
mod factory;
mod follower;
mod handler;
pub mod host;
mod loader;
mod settings;
pub mod sim;
pub mod skin;
mod sync;

pub use config::{RuntimeConfig, DEFAULT_FOLLOW_INTERVAL, DEFAULT_LOADER_RADIUS, FOLLOW_INTERVAL_ENV_VAR};
pub use factory::{create_npc, create_npc_with_config, Npc};
pub use follower::FollowerHandle;
pub use handler::AttackCallback;
pub use host::{
    ActorSpawn, Attacker, ChunkLoader, DamageSource, EntityHandler, EntityId, EventContext, Host,
    LoaderError, PlayerRef, Tx, WorldId,
};
pub use settings::{Rotation, Settings, Vec3};
pub use skin::{
    ingest_skin, parse_skin, read_skin, Dimensions, IngestStage, SkinDescriptor, SkinError,
    SkinErrorCode, SkinInput, SkinSize,
};
