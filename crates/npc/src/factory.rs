use tracing::info;

use crate::config::RuntimeConfig;
use crate::follower::{spawn_follower, FollowerHandle};
use crate::handler::{AttackCallback, NpcHandler};
use crate::host::{ActorSpawn, EntityId, Tx};
use crate::loader::{SharedLoader, TrackingLoader};
use crate::settings::Settings;

/// A spawned NPC. Holds only the lookup key for the entity; the host owns it
/// and removes it like any other entity.
#[derive(Debug)]
pub struct Npc {
    entity: EntityId,
    name: String,
    follower: FollowerHandle,
}

impl Npc {
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn follower(&self) -> &FollowerHandle {
        &self.follower
    }

    pub fn into_follower(self) -> FollowerHandle {
        self.follower
    }
}

/// Spawns an NPC into the world of `tx` and starts keeping its chunk loaded.
///
/// `on_attack` is called with any player that hits the NPC in melee; `None`
/// installs a no-op. The NPC's chunk is loaded before this returns.
pub fn create_npc(settings: Settings, tx: &mut dyn Tx, on_attack: Option<AttackCallback>) -> Npc {
    create_npc_with_config(settings, tx, on_attack, RuntimeConfig::default())
}

pub fn create_npc_with_config(
    settings: Settings,
    tx: &mut dyn Tx,
    on_attack: Option<AttackCallback>,
    config: RuntimeConfig,
) -> Npc {
    let config = config.normalized();
    let on_attack = on_attack.unwrap_or_default();
    let rotation = settings.rotation();
    let Settings {
        name,
        skin,
        position,
        scale,
        immobile,
        vulnerable,
        ..
    } = settings;
    let skin_fingerprint = skin.fingerprint_sha256_hex();

    let entity = tx.spawn_actor(ActorSpawn {
        name: name.clone(),
        skin,
        position,
    });
    tx.set_rotation(entity, rotation);
    tx.set_scale(entity, scale);
    if immobile {
        tx.set_immobile(entity);
    }

    let loader = SharedLoader::new(TrackingLoader::new(
        tx.open_loader(config.loader_radius),
        config.loader_radius,
    ));
    tx.attach_handler(
        entity,
        Box::new(NpcHandler::new(loader.clone(), on_attack, vulnerable)),
    );
    loader.with(|tracking| tracking.sync_position(tx, position));

    let world = tx.world();
    let follower = spawn_follower(&name, tx.host(), entity, loader, config.follow_interval);
    info!(
        npc = %name,
        ?entity,
        ?world,
        ?position,
        vulnerable,
        immobile,
        skin = %skin_fingerprint,
        "npc_created"
    );

    Npc {
        entity,
        name,
        follower,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::host::{Attacker, DamageSource, PlayerRef};
    use crate::settings::{Rotation, Vec3};
    use crate::sim::{LoaderOp, SimHost};
    use crate::skin::fixtures::steve_skin;

    const FAST: RuntimeConfig = RuntimeConfig {
        follow_interval: Duration::from_millis(10),
        loader_radius: 1,
    };

    fn guard_settings() -> Settings {
        Settings::new("Guard", steve_skin())
            .with_position(Vec3::new(0.0, 64.0, 0.0))
            .with_vulnerable(false)
    }

    fn player_p() -> PlayerRef {
        PlayerRef {
            id: EntityId(9_000),
            name: "P".to_string(),
        }
    }

    fn melee_from(player: PlayerRef) -> DamageSource {
        DamageSource::Attack {
            attacker: Attacker::Player(player),
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn guard_scenario_reports_attacker_once_and_keeps_health() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let seen = Arc::new(Mutex::new(Vec::<PlayerRef>::new()));
        let sink = Arc::clone(&seen);
        let callback = AttackCallback::new(move |player| {
            sink.lock().expect("seen").push(player.clone());
        });

        let npc = sim.exec(overworld, |tx| create_npc(guard_settings(), tx, Some(callback)));
        let before = sim.entity(npc.entity()).expect("spawned");

        let outcome = sim
            .hurt(npc.entity(), 5.0, melee_from(player_p()))
            .expect("entity present");

        assert!(outcome.cancelled);
        assert_eq!(*seen.lock().expect("seen"), vec![player_p()]);
        let after = sim.entity(npc.entity()).expect("still present");
        assert_eq!(after.health, before.health);
    }

    #[test]
    fn vulnerable_npc_takes_damage_and_still_reports() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback = AttackCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let settings = guard_settings().with_vulnerable(true);

        let npc = sim.exec(overworld, |tx| create_npc(settings, tx, Some(callback)));
        let before = sim.entity(npc.entity()).expect("spawned").health;
        let outcome = sim
            .hurt(npc.entity(), 5.0, melee_from(player_p()))
            .expect("entity present");

        assert!(!outcome.cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.health, before - 5.0);
    }

    #[test]
    fn creation_applies_settings_and_loads_chunk_before_returning() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let settings = guard_settings()
            .with_rotation(180.0, 15.0)
            .with_scale(2.0)
            .with_immobile(true);

        let npc = sim.exec(overworld, |tx| create_npc(settings, tx, None));

        let entity = sim.entity(npc.entity()).expect("spawned");
        assert_eq!(entity.name, "Guard");
        assert_eq!(entity.world, Some(overworld));
        assert_eq!(entity.rotation, Rotation { yaw: 180.0, pitch: 15.0 });
        assert_eq!(entity.scale, 2.0);
        assert!(entity.immobile);
        assert_eq!(entity.skin_identifier, "geometry.humanoid.custom");

        let loaders = sim.loaders();
        assert_eq!(loaders.len(), 1);
        let loader = &loaders[0];
        assert_eq!(loader.world, overworld);
        assert_eq!(loader.position, Some(Vec3::new(0.0, 64.0, 0.0)));
        assert_eq!(loader.loaded_radius, Some(1));
        assert!(!loader.closed);
    }

    #[test]
    fn missing_callback_defaults_to_noop() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let npc = sim.exec(overworld, |tx| create_npc(guard_settings(), tx, None));

        let outcome = sim
            .hurt(npc.entity(), 1.0, melee_from(player_p()))
            .expect("entity present");
        assert!(outcome.cancelled);
    }

    #[test]
    fn move_and_teleport_keep_loader_on_npc() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let npc = sim.exec(overworld, |tx| create_npc(guard_settings(), tx, None));

        assert!(sim.move_entity(npc.entity(), Vec3::new(3.0, 64.0, 4.0), Rotation::default()));
        assert_eq!(sim.loaders()[0].position, Some(Vec3::new(3.0, 64.0, 4.0)));

        assert!(sim.teleport(npc.entity(), Vec3::new(-300.0, 80.0, 12.0)));
        assert_eq!(sim.loaders()[0].position, Some(Vec3::new(-300.0, 80.0, 12.0)));
        assert_eq!(sim.loaders()[0].loaded_radius, Some(1));
    }

    #[test]
    fn silent_world_transfer_converges_within_follow_period() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let nether = sim.create_world();
        let npc = sim.exec(overworld, |tx| {
            create_npc_with_config(guard_settings(), tx, None, FAST)
        });

        assert!(sim.transfer_silently(npc.entity(), nether, Vec3::new(10.0, 40.0, 10.0)));
        let converged = wait_until(Duration::from_secs(2), || sim.loaders()[0].world == nether);
        assert!(converged, "loader never followed npc into new world");
        assert_eq!(sim.loaders()[0].position, Some(Vec3::new(10.0, 40.0, 10.0)));
        assert!(!npc.follower().is_finished());
    }

    #[test]
    fn removal_releases_loader_and_stops_follower() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let nether = sim.create_world();
        let npc = sim.exec(overworld, |tx| {
            create_npc_with_config(guard_settings(), tx, None, FAST)
        });
        let entity = npc.entity();

        assert!(sim.remove(entity));
        npc.into_follower().join();

        let loader = sim.loaders()[0].clone();
        assert!(loader.closed);
        assert_eq!(
            loader.ops.iter().filter(|op| matches!(op, LoaderOp::Closed)).count(),
            1
        );
        let ops_after_removal = loader.ops.len();

        // A stale lookup key must never bring the loader back.
        assert!(!sim.transfer_silently(entity, nether, Vec3::default()));
        thread::sleep(Duration::from_millis(40));
        assert_eq!(sim.loaders()[0].ops.len(), ops_after_removal);
        assert!(sim.entity(entity).is_none());
    }

    #[test]
    fn detached_entity_stops_follower_without_migration() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let npc = sim.exec(overworld, |tx| {
            create_npc_with_config(guard_settings(), tx, None, FAST)
        });
        let ops_before = sim.loaders()[0].ops.len();

        assert!(sim.detach(npc.entity()));
        npc.into_follower().join();

        let loader = sim.loaders()[0].clone();
        assert_eq!(loader.ops.len(), ops_before);
        assert_eq!(loader.world, overworld);
    }

    #[test]
    fn removing_detached_npc_still_releases_loader() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let npc = sim.exec(overworld, |tx| {
            create_npc_with_config(guard_settings(), tx, None, FAST)
        });
        let entity = npc.entity();

        assert!(sim.detach(entity));
        npc.into_follower().join();
        assert!(sim.remove(entity));

        let loader = sim.loaders()[0].clone();
        assert!(loader.closed, "removal of a detached npc must release its loader");
        assert_eq!(
            loader.ops.iter().filter(|op| matches!(op, LoaderOp::Closed)).count(),
            1
        );
    }

    #[test]
    fn each_npc_owns_its_own_loader() {
        let sim = SimHost::new();
        let overworld = sim.create_world();
        let first = sim.exec(overworld, |tx| create_npc(guard_settings(), tx, None));
        let second = sim.exec(overworld, |tx| {
            create_npc(
                Settings::new("Merchant", steve_skin()).with_position(Vec3::new(32.0, 64.0, 0.0)),
                tx,
                None,
            )
        });
        assert_ne!(first.entity(), second.entity());

        assert!(sim.remove(first.entity()));
        let loaders = sim.loaders();
        assert_eq!(loaders.len(), 2);
        assert!(loaders[0].closed);
        assert!(!loaders[1].closed);
        assert_eq!(loaders[1].position, Some(Vec3::new(32.0, 64.0, 0.0)));
    }
}
