use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::host::{DamageSource, EntityHandler, EntityId, EventContext, PlayerRef, Tx};
use crate::loader::SharedLoader;
use crate::settings::{Rotation, Vec3};

/// Called with the attacking player whenever an NPC is hit in melee. Runs on
/// the host's dispatch path with the world locked.
#[derive(Clone)]
pub struct AttackCallback(Arc<dyn Fn(&PlayerRef) + Send + Sync>);

fn ignore_attack(_attacker: &PlayerRef) {}

impl AttackCallback {
    pub fn new(callback: impl Fn(&PlayerRef) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub fn noop() -> Self {
        Self(Arc::new(ignore_attack))
    }

    pub fn call(&self, attacker: &PlayerRef) {
        (self.0)(attacker)
    }
}

impl Default for AttackCallback {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for AttackCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AttackCallback")
    }
}

pub(crate) struct NpcHandler {
    loader: SharedLoader,
    on_attack: AttackCallback,
    vulnerable: bool,
}

impl NpcHandler {
    pub(crate) fn new(loader: SharedLoader, on_attack: AttackCallback, vulnerable: bool) -> Self {
        Self {
            loader,
            on_attack,
            vulnerable,
        }
    }

    fn sync_position(&self, tx: &mut dyn Tx, position: Vec3) {
        self.loader.with(|loader| loader.sync_position(tx, position));
    }
}

impl EntityHandler for NpcHandler {
    fn handle_hurt(&mut self, ctx: &mut EventContext<'_>, damage: f64, source: &DamageSource) {
        if let Some(attacker) = source.attacking_player() {
            info!(
                entity = ?ctx.entity(),
                attacker = %attacker.name,
                damage,
                "npc_attacked"
            );
            self.on_attack.call(attacker);
        }

        if !self.vulnerable {
            ctx.cancel();
        }
    }

    fn handle_move(&mut self, ctx: &mut EventContext<'_>, position: Vec3, _rotation: Rotation) {
        self.sync_position(ctx.tx(), position);
    }

    fn handle_teleport(&mut self, ctx: &mut EventContext<'_>, position: Vec3) {
        self.sync_position(ctx.tx(), position);
    }

    fn handle_quit(&mut self, tx: &mut dyn Tx, entity: EntityId) {
        let released = self.loader.with(|loader| loader.release(tx));
        debug!(?entity, released, "npc_quit");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::host::{Attacker, EntityId};
    use crate::loader::tests::{recording_loader, NullTx, RecordedOp};

    fn player() -> PlayerRef {
        PlayerRef {
            id: EntityId(42),
            name: "P".to_string(),
        }
    }

    fn melee() -> DamageSource {
        DamageSource::Attack {
            attacker: Attacker::Player(player()),
        }
    }

    fn handler_with_log(
        vulnerable: bool,
    ) -> (
        NpcHandler,
        Arc<Mutex<Vec<PlayerRef>>>,
        Arc<Mutex<Vec<RecordedOp>>>,
    ) {
        let (loader, ops) = recording_loader(false);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = AttackCallback::new(move |attacker| {
            sink.lock().expect("seen").push(attacker.clone());
        });
        (
            NpcHandler::new(SharedLoader::new(loader), callback, vulnerable),
            seen,
            ops,
        )
    }

    #[test]
    fn invulnerable_npc_reports_attacker_and_cancels() {
        let (mut handler, seen, _) = handler_with_log(false);
        let mut tx = NullTx;
        let mut ctx = EventContext::new(&mut tx, EntityId(1));

        handler.handle_hurt(&mut ctx, 4.0, &melee());

        assert!(ctx.is_cancelled());
        assert_eq!(*seen.lock().expect("seen"), vec![player()]);
    }

    #[test]
    fn vulnerable_npc_reports_attacker_without_cancelling() {
        let (mut handler, seen, _) = handler_with_log(true);
        let mut tx = NullTx;
        let mut ctx = EventContext::new(&mut tx, EntityId(1));

        handler.handle_hurt(&mut ctx, 4.0, &melee());

        assert!(!ctx.is_cancelled());
        assert_eq!(seen.lock().expect("seen").len(), 1);
    }

    #[test]
    fn unattributed_damage_skips_callback_but_still_cancels() {
        let (mut handler, seen, _) = handler_with_log(false);
        let mut tx = NullTx;
        let mut ctx = EventContext::new(&mut tx, EntityId(1));

        handler.handle_hurt(&mut ctx, 2.0, &DamageSource::Fall);
        handler.handle_hurt(
            &mut ctx,
            2.0,
            &DamageSource::Attack {
                attacker: Attacker::Entity(EntityId(5)),
            },
        );

        assert!(ctx.is_cancelled());
        assert!(seen.lock().expect("seen").is_empty());
    }

    #[test]
    fn move_and_teleport_resync_loader() {
        let (mut handler, _, ops) = handler_with_log(false);
        let mut tx = NullTx;
        let mut ctx = EventContext::new(&mut tx, EntityId(1));

        handler.handle_move(&mut ctx, Vec3::new(1.0, 64.0, 1.0), Rotation::default());
        handler.handle_teleport(&mut ctx, Vec3::new(100.0, 70.0, -20.0));

        assert!(!ctx.is_cancelled());
        assert_eq!(
            *ops.lock().expect("ops"),
            vec![
                RecordedOp::Move(Vec3::new(1.0, 64.0, 1.0)),
                RecordedOp::Load(1),
                RecordedOp::Move(Vec3::new(100.0, 70.0, -20.0)),
                RecordedOp::Load(1),
            ]
        );
    }

    #[test]
    fn quit_releases_loader_once_even_when_repeated() {
        let (mut handler, _, ops) = handler_with_log(false);
        handler.handle_quit(&mut NullTx, EntityId(1));
        handler.handle_quit(&mut NullTx, EntityId(1));
        assert_eq!(*ops.lock().expect("ops"), vec![RecordedOp::Close]);
    }

    #[test]
    fn quit_survives_failing_release() {
        let (loader, ops) = recording_loader(true);
        let mut handler = NpcHandler::new(SharedLoader::new(loader), AttackCallback::noop(), false);
        handler.handle_quit(&mut NullTx, EntityId(1));
        assert_eq!(*ops.lock().expect("ops"), vec![RecordedOp::Close]);
    }

    #[test]
    fn default_callback_is_a_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting = AttackCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        counting.call(&player());
        AttackCallback::default().call(&player());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
