use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::host::{ChunkLoader, LoaderError, Tx, WorldId};
use crate::settings::Vec3;
use crate::sync::lock_recover;

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderOp {
    Opened { radius: i32 },
    Moved(Vec3),
    Loaded(i32),
    ChangedWorld(WorldId),
    Closed,
}

/// Everything a simulated loader has been asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderRecord {
    pub world: WorldId,
    pub position: Option<Vec3>,
    pub loaded_radius: Option<i32>,
    pub closed: bool,
    pub ops: Vec<LoaderOp>,
}

pub(crate) type LoaderRegistry = Arc<Mutex<Vec<LoaderRecord>>>;

pub(crate) struct SimLoader {
    index: usize,
    world: WorldId,
    registry: LoaderRegistry,
}

impl SimLoader {
    pub(crate) fn open(registry: &LoaderRegistry, world: WorldId, radius: i32) -> Self {
        let mut records = lock_recover(registry, "sim_loader_registry");
        let index = records.len();
        records.push(LoaderRecord {
            world,
            position: None,
            loaded_radius: None,
            closed: false,
            ops: vec![LoaderOp::Opened { radius }],
        });
        debug!(loader = index, ?world, radius, "sim_loader_opened");
        Self {
            index,
            world,
            registry: Arc::clone(registry),
        }
    }

    fn record<R>(&self, f: impl FnOnce(&mut LoaderRecord) -> R) -> R {
        let mut records = lock_recover(&self.registry, "sim_loader_registry");
        f(&mut records[self.index])
    }
}

impl ChunkLoader for SimLoader {
    fn world(&self) -> WorldId {
        self.world
    }

    fn move_to(&mut self, _tx: &mut dyn Tx, position: Vec3) {
        self.record(|record| {
            record.position = Some(position);
            record.ops.push(LoaderOp::Moved(position));
        });
    }

    fn load(&mut self, _tx: &mut dyn Tx, radius: i32) {
        self.record(|record| {
            record.loaded_radius = Some(radius);
            record.ops.push(LoaderOp::Loaded(radius));
        });
    }

    fn change_world(&mut self, _tx: &mut dyn Tx, world: WorldId) {
        self.world = world;
        self.record(|record| {
            record.world = world;
            record.loaded_radius = None;
            record.ops.push(LoaderOp::ChangedWorld(world));
        });
    }

    fn close(&mut self, _tx: &mut dyn Tx) -> Result<(), LoaderError> {
        self.record(|record| {
            if record.closed {
                return Err(LoaderError::AlreadyClosed);
            }
            record.closed = true;
            record.ops.push(LoaderOp::Closed);
            Ok(())
        })
    }
}
