use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use npc::sim::SimHost;
use npc::{
    create_npc_with_config, AttackCallback, Attacker, DamageSource, EntityId, PlayerRef, Rotation,
    Settings, Vec3, WorldId,
};
use tracing::info;

use crate::bootstrap::{SandboxError, SandboxWiring};

const FOLLOW_WAIT_INTERVALS: u32 = 40;

#[derive(Debug)]
pub(crate) struct ScenarioReport {
    pub(crate) attack_calls: usize,
    pub(crate) follow_latency: Duration,
}

/// Spawns an invulnerable guard, hits it, walks it, moves it to another
/// world behind its back and finally removes it.
pub(crate) fn run_scenario(wiring: SandboxWiring) -> Result<ScenarioReport, SandboxError> {
    let SandboxWiring { config, skin } = wiring;
    let sim = SimHost::new();
    let overworld = sim.create_world();
    let nether = sim.create_world();

    let attack_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attack_calls);
    let on_attack = AttackCallback::new(move |player| {
        counter.fetch_add(1, Ordering::SeqCst);
        info!(player = %player.name, "guard_attacked");
    });

    let settings = Settings::new("Guard", skin)
        .with_position(Vec3::new(0.0, 64.0, 0.0))
        .with_rotation(90.0, 0.0)
        .with_vulnerable(false);
    let npc = sim.exec(overworld, |tx| {
        create_npc_with_config(settings, tx, Some(on_attack), config)
    });
    let entity = npc.entity();
    let vanished = || SandboxError::NpcVanished {
        name: npc.name().to_string(),
    };

    let before = sim.entity(entity).ok_or_else(vanished)?.health;
    let intruder = PlayerRef {
        id: EntityId(u64::MAX),
        name: "Intruder".to_string(),
    };
    let outcome = sim
        .hurt(
            entity,
            4.0,
            DamageSource::Attack {
                attacker: Attacker::Player(intruder),
            },
        )
        .ok_or_else(vanished)?;
    let calls = attack_calls.load(Ordering::SeqCst);
    if calls != 1 {
        return Err(SandboxError::AttackCallbackCount { calls });
    }
    if outcome.health < before {
        return Err(SandboxError::TookDamage {
            before,
            after: outcome.health,
        });
    }

    if !sim.move_entity(entity, Vec3::new(6.0, 64.0, -3.0), Rotation::default()) {
        return Err(vanished());
    }

    if !sim.transfer_silently(entity, nether, Vec3::new(0.75, 40.0, -0.375)) {
        return Err(vanished());
    }
    let deadline = config.follow_interval * FOLLOW_WAIT_INTERVALS;
    let follow_latency = wait_for_loader_world(&sim, nether, deadline).ok_or(
        SandboxError::LoaderDidNotFollow {
            waited_ms: deadline.as_millis() as u64,
        },
    )?;
    info!(latency_ms = follow_latency.as_millis() as u64, "sandbox_loader_followed");

    sim.remove(entity);
    npc.into_follower().join();
    let released = sim.loaders().iter().all(|loader| loader.closed);
    if !released {
        return Err(SandboxError::LoaderNotReleased);
    }

    Ok(ScenarioReport {
        attack_calls: calls,
        follow_latency,
    })
}

fn wait_for_loader_world(
    sim: &SimHost,
    world: WorldId,
    deadline: Duration,
) -> Option<Duration> {
    let started = Instant::now();
    loop {
        if sim.loaders().first().is_some_and(|loader| loader.world == world) {
            return Some(started.elapsed());
        }
        if started.elapsed() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(1));
    }
}
