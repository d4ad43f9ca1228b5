use std::sync::Arc;

use thiserror::Error;

use crate::settings::{Rotation, Vec3};
use crate::skin::SkinDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerRef {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attacker {
    Player(PlayerRef),
    Entity(EntityId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DamageSource {
    Attack { attacker: Attacker },
    Projectile { owner: Option<Attacker> },
    Fall,
    Fire,
    Drowning,
    Void,
    Custom(String),
}

impl DamageSource {
    pub fn attacking_player(&self) -> Option<&PlayerRef> {
        match self {
            Self::Attack {
                attacker: Attacker::Player(player),
            } => Some(player),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorSpawn {
    pub name: String,
    pub skin: SkinDescriptor,
    pub position: Vec3,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("chunk loader was already closed")]
    AlreadyClosed,
    #[error("host rejected chunk loader operation: {message}")]
    Rejected { message: String },
}

pub trait Tx {
    fn world(&self) -> WorldId;
    fn host(&self) -> Arc<dyn Host>;
    fn spawn_actor(&mut self, spawn: ActorSpawn) -> EntityId;
    fn position(&self, entity: EntityId) -> Option<Vec3>;
    fn set_rotation(&mut self, entity: EntityId, rotation: Rotation);
    fn set_scale(&mut self, entity: EntityId, scale: f64);
    fn set_immobile(&mut self, entity: EntityId);
    fn attach_handler(&mut self, entity: EntityId, handler: Box<dyn EntityHandler>);
    fn open_loader(&mut self, radius: i32) -> Box<dyn ChunkLoader>;
}

pub trait Host: Send + Sync {
    /// Returns `false` without running `f` if the entity is gone or in no world.
    fn exec_entity(&self, entity: EntityId, f: &mut dyn FnMut(&mut dyn Tx)) -> bool;
}

pub trait ChunkLoader: Send {
    fn world(&self) -> WorldId;
    fn move_to(&mut self, tx: &mut dyn Tx, position: Vec3);
    fn load(&mut self, tx: &mut dyn Tx, radius: i32);
    fn change_world(&mut self, tx: &mut dyn Tx, world: WorldId);
    fn close(&mut self, tx: &mut dyn Tx) -> Result<(), LoaderError>;
}

pub struct EventContext<'a> {
    tx: &'a mut (dyn Tx + 'a),
    entity: EntityId,
    cancelled: bool,
}

impl<'a> EventContext<'a> {
    pub fn new(tx: &'a mut (dyn Tx + 'a), entity: EntityId) -> Self {
        Self {
            tx,
            entity,
            cancelled: false,
        }
    }

    pub fn tx(&mut self) -> &mut (dyn Tx + 'a) {
        &mut *self.tx
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Called with the world locked; implementations must not block.
pub trait EntityHandler: Send {
    fn handle_hurt(&mut self, _ctx: &mut EventContext<'_>, _damage: f64, _source: &DamageSource) {}

    fn handle_move(&mut self, _ctx: &mut EventContext<'_>, _position: Vec3, _rotation: Rotation) {}

    fn handle_teleport(&mut self, _ctx: &mut EventContext<'_>, _position: Vec3) {}

    fn handle_quit(&mut self, _tx: &mut dyn Tx, _entity: EntityId) {}
}
