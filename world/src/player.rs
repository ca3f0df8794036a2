//! Player bookkeeping: the prey unit, kills and shots.

use prey_arena_core::{
    ActorAlias, ActorId, ActorKind, Message, MessageRoutingRules, Team, UnitTypeName, Vec2,
};
use tracing::{debug, info};

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    UnitActor, WorldError,
};

/// Owns the player's unit for a round and feeds the round score.
#[derive(Debug)]
pub struct PlayerActor {
    id: ActorId,
    unit: ActorId,
    defeated: bool,
}

impl PlayerActor {
    /// Registers the player actor and spawns the prey at the origin with
    /// the weapons from the loadout slots.
    pub(crate) fn spawn(ctx: &mut Context<'_>) -> ActorId {
        let id = ctx.directory.register(ActorKind::Player);
        ctx.directory.register_alias(ActorAlias::PlayerActor, id);

        let unit = UnitActor::spawn(ctx, UnitTypeName::Prey, Vec2::ZERO, Team::Player);
        ctx.directory
            .register_alias(ActorAlias::PlayerUnitActor, unit);

        let loadout: Vec<_> = ctx.score.weapon_slots().iter().flatten().copied().collect();
        for weapon in loadout {
            ctx.publish(
                Message::AddWeapon { weapon },
                MessageRoutingRules::to_actor(unit),
            );
        }

        ctx.directory.checkin(
            id,
            Actor::Player(Self {
                id,
                unit,
                defeated: false,
            }),
        );
        debug!(player = %id, %unit, "spawned player");
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// The player's unit, which may already be gone.
    #[must_use]
    pub fn unit(&self) -> ActorId {
        self.unit
    }

    /// Reports whether the player's unit died this round.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub(crate) fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        drain_mailbox(self.id, ctx, |message, ctx| {
            self.handle_message(message, ctx);
            Ok(())
        })
    }

    fn handle_message(&mut self, message: Message, ctx: &mut Context<'_>) {
        match message {
            Message::UnitHasDied { dead, killer } => {
                if dead.actor == self.unit {
                    self.defeated = true;
                    info!(unit = %self.unit, "player unit died");
                    return;
                }
                let by_player = killer.is_some_and(|killer| killer.team == Team::Player);
                if dead.team == Team::Enemy && by_player {
                    if let Some(round) = ctx.score.current_round_mut() {
                        round.record_kill(dead.unit_type);
                    }
                }
            }
            Message::PlayerFiredWeapon { weapon } => {
                if let Some(round) = ctx.score.current_round_mut() {
                    round.record_shot(weapon);
                }
            }
            _ => {}
        }
    }
}
