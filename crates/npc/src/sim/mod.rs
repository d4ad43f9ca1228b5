mod loader;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::host::{
    ActorSpawn, ChunkLoader, DamageSource, EntityHandler, EntityId, EventContext, Host, Tx,
    WorldId,
};
use crate::settings::{Rotation, Vec3};
use crate::sync::lock_recover;

use self::loader::{LoaderRegistry, SimLoader};
pub use self::loader::{LoaderOp, LoaderRecord};

pub const DEFAULT_HEALTH: f64 = 20.0;

struct SimEntity {
    name: String,
    skin_identifier: String,
    world: Option<WorldId>,
    last_world: WorldId,
    position: Vec3,
    rotation: Rotation,
    scale: f64,
    immobile: bool,
    health: f64,
    handler: Option<Box<dyn EntityHandler>>,
}

#[derive(Default)]
struct SimState {
    next_entity: u64,
    next_world: u32,
    entities: BTreeMap<EntityId, SimEntity>,
}

impl SimState {
    fn world_of(&self, entity: EntityId) -> Option<WorldId> {
        self.entities.get(&entity)?.world
    }
}

#[derive(Default)]
struct SimShared {
    state: Mutex<SimState>,
    loaders: LoaderRegistry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub name: String,
    pub skin_identifier: String,
    pub world: Option<WorldId>,
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: f64,
    pub immobile: bool,
    pub health: f64,
    pub has_handler: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HurtOutcome {
    pub cancelled: bool,
    pub health: f64,
}

#[derive(Clone, Default)]
pub struct SimHost {
    shared: Arc<SimShared>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_world(&self) -> WorldId {
        let mut state = self.lock_state();
        let world = WorldId(state.next_world);
        state.next_world += 1;
        debug!(?world, "sim_world_created");
        world
    }

    pub fn exec<R>(&self, world: WorldId, f: impl FnOnce(&mut dyn Tx) -> R) -> R {
        let mut state = self.lock_state();
        let mut tx = SimTx {
            state: &mut *state,
            world,
            host: self.clone(),
        };
        f(&mut tx)
    }

    pub fn hurt(&self, entity: EntityId, damage: f64, source: DamageSource) -> Option<HurtOutcome> {
        let mut state = self.lock_state();
        let world = state.world_of(entity)?;
        let cancelled = self
            .dispatch(&mut *state, entity, world, |handler, tx| {
                let mut ctx = EventContext::new(tx, entity);
                handler.handle_hurt(&mut ctx, damage, &source);
                ctx.is_cancelled()
            })
            .unwrap_or(false);

        let record = state.entities.get_mut(&entity)?;
        if !cancelled {
            record.health = (record.health - damage).max(0.0);
        }
        debug!(?entity, damage, cancelled, health = record.health, "sim_entity_hurt");
        Some(HurtOutcome {
            cancelled,
            health: record.health,
        })
    }

    pub fn move_entity(&self, entity: EntityId, position: Vec3, rotation: Rotation) -> bool {
        let mut state = self.lock_state();
        let Some(world) = state.world_of(entity) else {
            return false;
        };
        let cancelled = self
            .dispatch(&mut *state, entity, world, |handler, tx| {
                let mut ctx = EventContext::new(tx, entity);
                handler.handle_move(&mut ctx, position, rotation);
                ctx.is_cancelled()
            })
            .unwrap_or(false);

        if !cancelled {
            if let Some(record) = state.entities.get_mut(&entity) {
                record.position = position;
                record.rotation = rotation;
            }
        }
        true
    }

    pub fn teleport(&self, entity: EntityId, position: Vec3) -> bool {
        let mut state = self.lock_state();
        let Some(world) = state.world_of(entity) else {
            return false;
        };
        let cancelled = self
            .dispatch(&mut *state, entity, world, |handler, tx| {
                let mut ctx = EventContext::new(tx, entity);
                handler.handle_teleport(&mut ctx, position);
                ctx.is_cancelled()
            })
            .unwrap_or(false);

        if !cancelled {
            if let Some(record) = state.entities.get_mut(&entity) {
                record.position = position;
            }
        }
        true
    }

    /// No handler is notified.
    pub fn transfer_silently(&self, entity: EntityId, world: WorldId, position: Vec3) -> bool {
        let mut state = self.lock_state();
        let Some(record) = state.entities.get_mut(&entity) else {
            return false;
        };
        let from = record.world;
        record.world = Some(world);
        record.last_world = world;
        record.position = position;
        debug!(?entity, ?from, to = ?world, "sim_entity_transferred");
        true
    }

    pub fn detach(&self, entity: EntityId) -> bool {
        let mut state = self.lock_state();
        let Some(record) = state.entities.get_mut(&entity) else {
            return false;
        };
        record.world = None;
        debug!(?entity, "sim_entity_detached");
        true
    }

    // Detached entities still quit, in the last world they were in.
    pub fn remove(&self, entity: EntityId) -> bool {
        let mut state = self.lock_state();
        let world = state
            .entities
            .get(&entity)
            .map(|record| record.world.unwrap_or(record.last_world));
        if let Some(world) = world {
            self.dispatch(&mut *state, entity, world, |handler, tx| {
                handler.handle_quit(tx, entity);
            });
        }
        let removed = state.entities.remove(&entity).is_some();
        if removed {
            debug!(?entity, "sim_entity_removed");
        }
        removed
    }

    pub fn entity(&self, entity: EntityId) -> Option<EntitySnapshot> {
        let state = self.lock_state();
        let record = state.entities.get(&entity)?;
        Some(EntitySnapshot {
            name: record.name.clone(),
            skin_identifier: record.skin_identifier.clone(),
            world: record.world,
            position: record.position,
            rotation: record.rotation,
            scale: record.scale,
            immobile: record.immobile,
            health: record.health,
            has_handler: record.handler.is_some(),
        })
    }

    pub fn loaders(&self) -> Vec<LoaderRecord> {
        lock_recover(&self.shared.loaders, "sim_loader_registry").clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SimState> {
        lock_recover(&self.shared.state, "sim_state")
    }

    // The handler is taken out of the table while it runs.
    fn dispatch<R>(
        &self,
        state: &mut SimState,
        entity: EntityId,
        world: WorldId,
        f: impl FnOnce(&mut dyn EntityHandler, &mut SimTx<'_>) -> R,
    ) -> Option<R> {
        let mut handler = state.entities.get_mut(&entity)?.handler.take()?;
        let result = {
            let mut tx = SimTx {
                state: &mut *state,
                world,
                host: self.clone(),
            };
            f(&mut *handler, &mut tx)
        };
        if let Some(record) = state.entities.get_mut(&entity) {
            if record.handler.is_none() {
                record.handler = Some(handler);
            }
        }
        Some(result)
    }
}

impl Host for SimHost {
    fn exec_entity(&self, entity: EntityId, f: &mut dyn FnMut(&mut dyn Tx)) -> bool {
        let mut state = self.lock_state();
        let Some(world) = state.world_of(entity) else {
            return false;
        };
        let mut tx = SimTx {
            state: &mut *state,
            world,
            host: self.clone(),
        };
        f(&mut tx);
        true
    }
}

struct SimTx<'a> {
    state: &'a mut SimState,
    world: WorldId,
    host: SimHost,
}

impl SimTx<'_> {
    fn entity_mut(&mut self, entity: EntityId) -> Option<&mut SimEntity> {
        self.state.entities.get_mut(&entity)
    }
}

impl Tx for SimTx<'_> {
    fn world(&self) -> WorldId {
        self.world
    }

    fn host(&self) -> Arc<dyn Host> {
        Arc::new(self.host.clone())
    }

    fn spawn_actor(&mut self, spawn: ActorSpawn) -> EntityId {
        let entity = EntityId(self.state.next_entity);
        self.state.next_entity += 1;
        self.state.entities.insert(
            entity,
            SimEntity {
                name: spawn.name,
                skin_identifier: spawn.skin.model_identifier().to_string(),
                world: Some(self.world),
                last_world: self.world,
                position: spawn.position,
                rotation: Rotation::default(),
                scale: 1.0,
                immobile: false,
                health: DEFAULT_HEALTH,
                handler: None,
            },
        );
        debug!(?entity, world = ?self.world, "sim_entity_spawned");
        entity
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.state.entities.get(&entity).map(|record| record.position)
    }

    fn set_rotation(&mut self, entity: EntityId, rotation: Rotation) {
        if let Some(record) = self.entity_mut(entity) {
            record.rotation = rotation;
        }
    }

    fn set_scale(&mut self, entity: EntityId, scale: f64) {
        if let Some(record) = self.entity_mut(entity) {
            record.scale = scale;
        }
    }

    fn set_immobile(&mut self, entity: EntityId) {
        if let Some(record) = self.entity_mut(entity) {
            record.immobile = true;
        }
    }

    fn attach_handler(&mut self, entity: EntityId, handler: Box<dyn EntityHandler>) {
        if let Some(record) = self.entity_mut(entity) {
            record.handler = Some(handler);
        }
    }

    fn open_loader(&mut self, radius: i32) -> Box<dyn ChunkLoader> {
        Box::new(SimLoader::open(&self.host.shared.loaders, self.world, radius))
    }
}
