use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::host::{ChunkLoader, Tx, WorldId};
use crate::settings::Vec3;
use crate::sync::lock_recover;

/// Wraps the host loader that keeps an NPC's chunk alive. Once released it
/// never reaches the host again.
pub(crate) struct TrackingLoader {
    inner: Box<dyn ChunkLoader>,
    radius: i32,
    released: bool,
}

impl TrackingLoader {
    pub(crate) fn new(inner: Box<dyn ChunkLoader>, radius: i32) -> Self {
        Self {
            inner,
            radius,
            released: false,
        }
    }

    pub(crate) fn world(&self) -> WorldId {
        self.inner.world()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn sync_position(&mut self, tx: &mut dyn Tx, position: Vec3) {
        if self.released {
            debug!(?position, "npc_loader_sync_skipped_released");
            return;
        }
        self.inner.move_to(tx, position);
        self.inner.load(tx, self.radius);
    }

    pub(crate) fn migrate(&mut self, tx: &mut dyn Tx, world: WorldId, position: Option<Vec3>) {
        if self.released {
            debug!(?world, "npc_loader_migrate_skipped_released");
            return;
        }
        self.inner.change_world(tx, world);
        if let Some(position) = position {
            self.inner.move_to(tx, position);
        }
        self.inner.load(tx, self.radius);
    }

    /// Returns `true` only for the call that actually released the loader.
    pub(crate) fn release(&mut self, tx: &mut dyn Tx) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Err(error) = self.inner.close(tx) {
            warn!(error = %error, "npc_loader_release_failed");
        }
        true
    }
}

#[derive(Clone)]
pub(crate) struct SharedLoader {
    loader: Arc<Mutex<TrackingLoader>>,
}

impl SharedLoader {
    pub(crate) fn new(loader: TrackingLoader) -> Self {
        Self {
            loader: Arc::new(Mutex::new(loader)),
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut TrackingLoader) -> R) -> R {
        let mut guard = lock_recover(&self.loader, "tracking_loader");
        f(&mut guard)
    }
}
