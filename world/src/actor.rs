//! Closed set of actor variants and the shared update plumbing.

use prey_arena_core::{ActorId, ActorKind, Message};

use crate::{
    context::Context, EnemyActor, InputActor, PathingActor, PlayerActor, UnitActor, WeaponActor,
    WorldActor, WorldError,
};

/// Per-kind state of a registered actor.
#[derive(Debug)]
pub(crate) enum Actor {
    Unit(UnitActor),
    Weapon(WeaponActor),
    Player(PlayerActor),
    Enemy(EnemyActor),
    World(WorldActor),
    Pathing(PathingActor),
    Input(InputActor),
}

/// Fixed phase order of a frame; each phase visits its actors by ascending id.
///
/// The pathing actor only answers queries and is never updated.
pub(crate) const UPDATE_ORDER: [ActorKind; 6] = [
    ActorKind::Input,
    ActorKind::World,
    ActorKind::Player,
    ActorKind::Enemy,
    ActorKind::Unit,
    ActorKind::Weapon,
];

/// Runs one update of the actor, if it is still registered.
pub(crate) fn update_actor(id: ActorId, ctx: &mut Context<'_>) -> Result<(), WorldError> {
    match ctx.directory.kind_of(id) {
        None => Ok(()),
        Some(ActorKind::Unit) => UnitActor::update(id, ctx),
        Some(kind) => {
            let Some(mut actor) = ctx.directory.checkout(id) else {
                return Ok(());
            };
            let result = match &mut actor {
                Actor::Weapon(weapon) => weapon.update(ctx),
                Actor::Player(player) => player.update(ctx),
                Actor::Enemy(enemy) => enemy.update(ctx),
                Actor::World(world) => world.update(ctx),
                Actor::Pathing(_) => Ok(()),
                Actor::Input(input) => input.update(ctx),
                Actor::Unit(_) => Err(WorldError::UnexpectedKind {
                    actor: id,
                    expected: kind,
                }),
            };
            ctx.directory.checkin(id, actor);
            result
        }
    }
}

/// Hands every queued message to `handle` in arrival order.
///
/// Stops as soon as the actor is no longer registered; messages left behind
/// are discarded with its mailbox.
pub(crate) fn drain_mailbox<'a, F>(
    id: ActorId,
    ctx: &mut Context<'a>,
    mut handle: F,
) -> Result<(), WorldError>
where
    F: FnMut(Message, &mut Context<'a>) -> Result<(), WorldError>,
{
    while let Some(message) = ctx.directory.pop_message(id) {
        handle(message, ctx)?;
        if !ctx.directory.is_registered(id) {
            break;
        }
    }
    Ok(())
}
