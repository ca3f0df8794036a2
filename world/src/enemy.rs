//! Enemy director: keeps the population topped up and sends it at the player.

use std::{collections::BTreeMap, time::Duration};

use prey_arena_core::{
    Aabb, ActorAlias, ActorId, ActorKind, Message, MessageRoutingRules, OrderKind, SectorCoord,
    Team, UnitTypeName, Vec2,
};
use rand::Rng;
use tracing::{debug, trace};

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    UnitActor, WorldError,
};

/// Spawns enemies up to a difficulty-scaled target per unit type.
#[derive(Debug)]
pub struct EnemyActor {
    id: ActorId,
    counts: BTreeMap<UnitTypeName, u32>,
    last_ramp: Duration,
}

impl EnemyActor {
    /// Registers the director under its alias.
    pub(crate) fn spawn(ctx: &mut Context<'_>) -> ActorId {
        let id = ctx.directory.register(ActorKind::Enemy);
        ctx.directory.register_alias(ActorAlias::EnemyActor, id);
        let enemy = Self {
            id,
            counts: BTreeMap::new(),
            last_ramp: ctx.now(),
        };
        ctx.directory.checkin(id, Actor::Enemy(enemy));
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Live enemies of a unit type.
    #[must_use]
    pub fn count(&self, unit_type: UnitTypeName) -> u32 {
        self.counts.get(&unit_type).copied().unwrap_or(0)
    }

    /// Live enemies across all types.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub(crate) fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        drain_mailbox(self.id, ctx, |message, _| {
            self.handle_message(message);
            Ok(())
        })?;

        self.ramp_difficulty(ctx);

        let Some(player_unit) = ctx.directory.alias(ActorAlias::PlayerUnitActor) else {
            return Ok(());
        };
        let Some(player_position) = ctx.engine.body(player_unit).map(|body| body.position) else {
            return Ok(());
        };

        let difficulty = ctx.score.difficulty();
        let targets: Vec<(UnitTypeName, u32)> = ctx
            .config
            .enemy_targets
            .iter()
            .map(|(unit_type, target)| (*unit_type, (*target as f32 * difficulty).floor() as u32))
            .collect();

        for (unit_type, target) in targets {
            if self.count(unit_type) >= target {
                continue;
            }
            if let Some(unit) = spawn_enemy(ctx, unit_type, player_unit, player_position) {
                *self.counts.entry(unit_type).or_insert(0) += 1;
                trace!(%unit, ?unit_type, target, "enemy spawned");
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, message: Message) {
        let gone = match message {
            Message::UnitHasDied { dead, .. } => dead,
            Message::UnitRemoved { removed } => removed,
            _ => return,
        };
        if gone.team != Team::Enemy {
            return;
        }
        if let Some(count) = self.counts.get_mut(&gone.unit_type) {
            *count = count.saturating_sub(1);
        }
    }

    fn ramp_difficulty(&mut self, ctx: &mut Context<'_>) {
        let now = ctx.now();
        if now.saturating_sub(self.last_ramp) <= ctx.config.difficulty_ramp_interval() {
            return;
        }
        self.last_ramp = now;
        ctx.score.raise_difficulty(ctx.config.difficulty_ramp_step);
        debug!(difficulty = ctx.score.difficulty(), "difficulty raised");
    }
}

/// Spawns one enemy at a random reachable point of the loaded window that
/// lies outside the player's safe zone.
fn spawn_enemy(
    ctx: &mut Context<'_>,
    unit_type: UnitTypeName,
    player_unit: ActorId,
    player_position: Vec2,
) -> Option<ActorId> {
    let window = SectorCoord::containing(player_position, ctx.config.sector_size)
        .window_bounds(ctx.config.sector_size);
    let safe_zone = Aabb::new(player_position, ctx.config.safe_zone);
    let size = Vec2::splat(unit_type.unit_type().size);

    for _ in 0..ctx.config.max_spawn_attempts {
        let (min, max) = (window.min(), window.max());
        let candidate = {
            let rng = ctx.engine.rng();
            Vec2::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y))
        };
        if safe_zone.contains_point(candidate) {
            continue;
        }
        let footprint = Aabb::new(candidate, size);
        if ctx
            .engine
            .obstacles()
            .any(|obstacle| obstacle.footprint.overlaps(&footprint))
        {
            continue;
        }
        if ctx.find_path(candidate, player_position).is_none() {
            continue;
        }

        let unit = UnitActor::spawn(ctx, unit_type, candidate, Team::Enemy);
        ctx.publish(
            Message::IssueOrder {
                order: OrderKind::AttackUnit {
                    target: player_unit,
                },
            },
            MessageRoutingRules::to_actor(unit),
        );
        return Some(unit);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Game, WorldConfig};
    use prey_arena_core::{InputFrame, UnitIdentity};

    const FRAME: Duration = Duration::from_millis(16);

    fn quiet_config() -> WorldConfig {
        WorldConfig {
            enemy_targets: BTreeMap::from([(UnitTypeName::Mouse, 4)]),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn population_fills_up_to_the_scaled_target() {
        let mut game = Game::new(quiet_config()).expect("valid config");
        let _ = game.start_round();
        // one spawn per type per frame; nobody has started walking yet
        for _ in 0..5 {
            game.update(FRAME, &InputFrame::idle()).expect("frame");
        }

        // difficulty 0.9 scales the target of four down to three
        let enemy = game.directory().enemy().expect("director");
        assert_eq!(enemy.count(UnitTypeName::Mouse), 3);
        assert_eq!(enemy.total(), 3);

        let player = game
            .directory()
            .alias(ActorAlias::PlayerUnitActor)
            .expect("player unit");
        let safe_zone = Aabb::new(Vec2::ZERO, game.config().safe_zone);
        let mice: Vec<ActorId> = game
            .directory()
            .ids_of_kind(ActorKind::Unit)
            .into_iter()
            .filter(|id| *id != player)
            .collect();
        assert_eq!(mice.len(), 3);
        for mouse in mice {
            let unit = game.directory().unit(mouse).expect("mouse");
            assert_eq!(unit.team(), Team::Enemy);
            assert!(matches!(
                unit.orders().front().map(|order| order.kind()),
                Some(OrderKind::AttackUnit { target }) if *target == player
            ));
            let body = game.engine().body(mouse).expect("body");
            assert!(!safe_zone.contains_point(body.position));
        }
    }

    #[test]
    fn deaths_and_removals_free_up_slots() {
        let mut game = Game::new(quiet_config()).expect("valid config");
        let _ = game.start_round();
        game.update(FRAME, &InputFrame::idle()).expect("frame");
        let director = game.directory().alias(ActorAlias::EnemyActor).expect("director");
        let before = game.directory().enemy().expect("director").total();
        assert_eq!(before, 1);

        let mouse = UnitIdentity {
            actor: ActorId::new(999),
            unit_type: UnitTypeName::Mouse,
            team: Team::Enemy,
        };
        let prey = UnitIdentity {
            team: Team::Player,
            unit_type: UnitTypeName::Prey,
            ..mouse
        };
        for message in [
            Message::UnitRemoved { removed: mouse },
            Message::UnitHasDied {
                dead: mouse,
                killer: None,
            },
            Message::UnitHasDied {
                dead: prey,
                killer: None,
            },
        ] {
            let _ = game.publish(message, &MessageRoutingRules::to_actor(director));
        }
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        // the count bottoms out at zero and the frame spawns a replacement
        assert_eq!(game.directory().enemy().expect("director").total(), 1);
    }

    #[test]
    fn difficulty_ramps_on_the_configured_interval() {
        let config = WorldConfig {
            enemy_targets: BTreeMap::new(),
            difficulty_ramp_interval_ms: 100,
            ..WorldConfig::default()
        };
        let mut game = Game::new(config).expect("valid config");
        let _ = game.start_round();
        let start = game.score().difficulty();

        for _ in 0..7 {
            game.update(FRAME, &InputFrame::idle()).expect("frame");
        }
        assert!((game.score().difficulty() - (start + 0.1)).abs() < 1e-5);
    }
}
