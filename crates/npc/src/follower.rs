use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::host::{EntityId, Host, Tx, WorldId};
use crate::loader::SharedLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FollowStep {
    InSync,
    Migrated { from: WorldId, to: WorldId },
    Stop,
}

/// One follower wake: resolve the entity and pull the loader into its world.
pub(crate) fn follow_tick(host: &dyn Host, entity: EntityId, loader: &SharedLoader) -> FollowStep {
    let mut step = FollowStep::InSync;
    let resolved = host.exec_entity(entity, &mut |tx: &mut dyn Tx| {
        let world = tx.world();
        let position = tx.position(entity);
        step = loader.with(|tracking| {
            if tracking.is_released() {
                return FollowStep::Stop;
            }
            let from = tracking.world();
            if from == world {
                return FollowStep::InSync;
            }
            tracking.migrate(tx, world, position);
            FollowStep::Migrated { from, to: world }
        });
    });

    if resolved {
        step
    } else {
        FollowStep::Stop
    }
}

#[derive(Debug)]
pub struct FollowerHandle {
    thread: JoinHandle<()>,
}

impl FollowerHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the follower has stopped, which happens within one
    /// interval of the NPC leaving the world.
    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("npc_follower_panicked");
        }
    }
}

pub(crate) fn spawn_follower(
    name: &str,
    host: Arc<dyn Host>,
    entity: EntityId,
    loader: SharedLoader,
    interval: Duration,
) -> FollowerHandle {
    let thread_name = format!("npc-follow-{}", name.replace('\0', ""));
    let npc_name = name.to_string();
    let spawned = thread::Builder::new()
        .name(thread_name)
        .spawn(move || run_follower(&npc_name, host.as_ref(), entity, &loader, interval));
    match spawned {
        Ok(thread) => FollowerHandle { thread },
        Err(error) => panic!("failed to start follower thread for npc {name}: {error}"),
    }
}

fn run_follower(
    name: &str,
    host: &dyn Host,
    entity: EntityId,
    loader: &SharedLoader,
    interval: Duration,
) {
    info!(npc = name, ?entity, interval_ms = interval.as_millis() as u64, "npc_follower_started");
    let mut ticks: u64 = 0;
    loop {
        thread::sleep(interval);
        ticks = ticks.saturating_add(1);
        match follow_tick(host, entity, loader) {
            FollowStep::InSync => {}
            FollowStep::Migrated { from, to } => {
                info!(npc = name, ?entity, ?from, ?to, "npc_loader_world_migrated");
            }
            FollowStep::Stop => break,
        }
    }
    debug!(npc = name, ?entity, ticks, "npc_follower_exit");
    info!(npc = name, ?entity, "npc_follower_stopped");
}
