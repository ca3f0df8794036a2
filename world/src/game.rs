//! Round lifecycle and the fixed per-frame update pass.

use std::time::Duration;

use prey_arena_core::{
    ActorAlias, ActorId, Event, InputFrame, Message, MessageRoutingRules, SectorCoord, Team,
    UnitTypeName, Vec2,
};
use prey_arena_system_scoring::GameScore;
use tracing::{debug, info};

use crate::{
    actor::{update_actor, Actor, UPDATE_ORDER},
    context::Context,
    ActorDirectory, ConfigError, EnemyActor, Engine, InputActor, MessageBroker, PathingActor,
    PlayerActor, UnitActor, WorldActor, WorldConfig, WorldError,
};

/// Infrastructure actors that survive round resets.
const PRESERVED: [ActorAlias; 3] = [
    ActorAlias::WorldActor,
    ActorAlias::PathingActor,
    ActorAlias::InputActor,
];

/// Authoritative simulation: actors, their mail, the engine and the score.
#[derive(Debug)]
pub struct Game {
    config: WorldConfig,
    directory: ActorDirectory,
    broker: MessageBroker,
    engine: Engine,
    score: GameScore,
    round: Option<usize>,
}

impl Game {
    /// Creates a world with its infrastructure actors and the sectors around
    /// the origin loaded. No round is running yet.
    ///
    /// Fails when the configuration does not pass [`WorldConfig::validate`].
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut directory = ActorDirectory::new();
        let _ = WorldActor::spawn(&mut directory, &config);
        let _ = PathingActor::spawn(&mut directory, &config);
        let _ = InputActor::spawn(&mut directory);

        let mut game = Self {
            engine: Engine::new(config.seed, config.damping),
            config,
            directory,
            broker: MessageBroker::new(),
            score: GameScore::new(),
            round: None,
        };
        game.load_origin_window();
        Ok(game)
    }

    /// Starts a fresh round, closing the running one first.
    ///
    /// Returns the zero-based round index.
    pub fn start_round(&mut self) -> usize {
        if self.round.is_some() {
            let _ = self.end_round();
        }

        let removed = self.directory.reset_actors(&PRESERVED);
        self.engine.clear();
        let round = self
            .score
            .start_round(self.engine.now(), self.config.difficulty_carryover);
        self.load_origin_window();

        let mut ctx = self.context();
        let _ = PlayerActor::spawn(&mut ctx);
        let _ = EnemyActor::spawn(&mut ctx);

        self.engine.emit(Event::RoundStarted { round });
        self.round = Some(round);
        info!(round, removed, difficulty = self.score.difficulty(), "round started");
        round
    }

    /// Ends the running round, awarding its score as spendable points.
    ///
    /// Returns the round's total score, or `None` when no round was running.
    pub fn end_round(&mut self) -> Option<u32> {
        let round = self.round.take()?;
        let total_score = self.score.end_round(self.engine.now()).unwrap_or(0);

        let _ = self.directory.reset_actors(&PRESERVED);
        self.engine.clear();
        self.engine.emit(Event::RoundEnded { round, total_score });
        info!(round, total_score, "round ended");
        Some(total_score)
    }

    /// Advances the simulation by one frame.
    ///
    /// The engine integrates first, then every actor updates in the fixed
    /// phase order. A message reaches actors that have not yet updated this
    /// frame immediately and everyone else on the next frame. The round ends
    /// on the frame the player actor learns its unit died.
    pub fn update(&mut self, dt: Duration, input: &InputFrame) -> Result<(), WorldError> {
        self.engine.step(dt);
        if let Some(actor) = self.directory.input_mut() {
            actor.set_frame(input.clone());
        }

        let mut ctx = self.context();
        for kind in UPDATE_ORDER {
            for id in ctx.directory.ids_of_kind(kind) {
                update_actor(id, &mut ctx)?;
            }
        }

        let defeated = self
            .directory
            .player()
            .is_some_and(PlayerActor::is_defeated);
        if defeated && self.round.is_some() {
            debug!(frame = self.engine.frame(), "player defeated");
            let _ = self.end_round();
        }
        Ok(())
    }

    /// Publishes a message from outside the actor system.
    ///
    /// Returns the number of mailboxes the message was delivered to.
    pub fn publish(&mut self, message: Message, rules: &MessageRoutingRules) -> usize {
        self.broker
            .publish(&mut self.directory, &self.engine, message, rules)
    }

    /// Spawns a unit with its default weapons queued.
    pub fn spawn_unit(&mut self, unit_type: UnitTypeName, position: Vec2, team: Team) -> ActorId {
        UnitActor::spawn(&mut self.context(), unit_type, position, team)
    }

    /// Index of the running round.
    #[must_use]
    pub fn round(&self) -> Option<usize> {
        self.round
    }

    /// Reports whether a round is running.
    #[must_use]
    pub fn is_round_active(&self) -> bool {
        self.round.is_some()
    }

    /// Registered actors.
    #[must_use]
    pub fn directory(&self) -> &ActorDirectory {
        &self.directory
    }

    /// Bodies, obstacles, clock and pending events.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable engine access for adapters that script the world.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Campaign score.
    #[must_use]
    pub fn score(&self) -> &GameScore {
        &self.score
    }

    /// Mutable campaign score, for purchases between rounds.
    pub fn score_mut(&mut self) -> &mut GameScore {
        &mut self.score
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Message broker statistics.
    #[must_use]
    pub fn broker(&self) -> &MessageBroker {
        &self.broker
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.engine.drain_events()
    }

    #[cfg(test)]
    pub(crate) fn directory_mut(&mut self) -> &mut ActorDirectory {
        &mut self.directory
    }

    pub(crate) fn context(&mut self) -> Context<'_> {
        Context {
            directory: &mut self.directory,
            broker: &mut self.broker,
            engine: &mut self.engine,
            score: &mut self.score,
            config: &self.config,
        }
    }

    fn load_origin_window(&mut self) {
        let Some(id) = self.directory.alias(ActorAlias::WorldActor) else {
            return;
        };
        let mut ctx = self.context();
        match ctx.directory.checkout(id) {
            Some(Actor::World(mut world)) => {
                world.load_window(SectorCoord::ORIGIN, &mut ctx);
                ctx.directory.checkin(id, Actor::World(world));
            }
            Some(other) => ctx.directory.checkin(id, other),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prey_arena_core::ActorKind;

    const FRAME: Duration = Duration::from_millis(16);

    fn calm_config() -> WorldConfig {
        WorldConfig {
            enemy_targets: Default::default(),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn new_worlds_load_the_origin_window() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");

        assert_eq!(game.directory().len(), 3);
        assert!(game.directory().world().is_some());
        assert!(game.directory().pathing().is_some());
        assert!(!game.is_round_active());
        let generated = game
            .drain_events()
            .iter()
            .filter(|event| matches!(event, Event::SectorGenerated { .. }))
            .count();
        assert_eq!(generated, 9);
        assert!(game
            .engine()
            .obstacles()
            .all(|obstacle| !obstacle.footprint.contains_point(Vec2::ZERO)));
    }

    #[test]
    fn unusable_configs_are_refused() {
        let flat = WorldConfig {
            sector_size: 0.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            Game::new(flat),
            Err(ConfigError::NotPositive("sector_size"))
        ));

        let pinpoint = WorldConfig {
            path_node_size: -1.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            Game::new(pinpoint),
            Err(ConfigError::NotPositive("path_node_size"))
        ));
    }

    #[test]
    fn rounds_reset_everything_but_the_infrastructure() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let world = game.directory().alias(ActorAlias::WorldActor);
        assert_eq!(game.start_round(), 0);
        for _ in 0..5 {
            game.update(FRAME, &InputFrame::idle()).expect("frame");
        }
        assert!(!game.directory().ids_of_kind(ActorKind::Unit).is_empty());

        let total = game.end_round();

        assert!(total.is_some());
        assert_eq!(game.directory().len(), 3);
        assert_eq!(game.directory().alias(ActorAlias::WorldActor), world);
        assert!(game.directory().alias(ActorAlias::PlayerActor).is_none());
        assert_eq!(game.engine().bodies().count(), 0);
        assert_eq!(game.end_round(), None);

        assert_eq!(game.start_round(), 1);
        let events = game.drain_events();
        assert!(events.contains(&Event::RoundStarted { round: 1 }));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::RoundEnded { round: 0, .. })));
    }

    #[test]
    fn player_death_ends_the_round() {
        let mut game = Game::new(calm_config()).expect("valid config");
        let _ = game.start_round();
        let prey = game
            .directory()
            .alias(ActorAlias::PlayerUnitActor)
            .expect("prey");
        let _ = game.publish(
            Message::DamageUnit {
                damaging_actor: prey,
                damage: 100.0,
            },
            &MessageRoutingRules::to_actor(prey),
        );

        let mut frames = 0;
        while game.is_round_active() {
            game.update(FRAME, &InputFrame::idle()).expect("frame");
            frames += 1;
            assert!(frames < 10, "round never ended");
        }

        let events = game.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UnitDied { unit } if unit.actor == prey
        )));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::RoundEnded { round: 0, .. })));
        assert_eq!(game.score().round_scores().len(), 1);
        assert!(game.score().round_scores()[0].is_finished());
    }

    #[test]
    fn unit_updates_see_mail_published_earlier_in_the_frame() {
        let mut game = Game::new(calm_config()).expect("valid config");
        let _ = game.start_round();
        let _ = game.drain_events();

        // the input phase issues the order before the unit phase runs
        game.update(FRAME, &InputFrame::attacking(Vec2::X))
            .expect("frame");

        assert!(game
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::WeaponFired { .. })));
    }
}
