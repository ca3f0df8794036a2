//! Sector streaming around the player unit.

use std::collections::BTreeSet;

use prey_arena_core::{Aabb, ActorAlias, ActorId, ActorKind, Event, Message, SectorCoord, Vec2};
use prey_arena_system_terrain::TerrainGenerator;
use tracing::debug;

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    ActorDirectory, Obstacle, ObstacleKind, WorldConfig, WorldError,
};

const TREE_SIZE: f32 = 1.0;

/// Keeps the 3x3 window of sectors around the player loaded.
#[derive(Debug)]
pub struct WorldActor {
    id: ActorId,
    generator: TerrainGenerator,
    current_sector: SectorCoord,
}

impl WorldActor {
    /// Registers the world actor under its alias. Nothing is generated until
    /// [`WorldActor::load_window`] runs.
    pub(crate) fn spawn(directory: &mut ActorDirectory, config: &WorldConfig) -> ActorId {
        let id = directory.register(ActorKind::World);
        directory.register_alias(ActorAlias::WorldActor, id);
        let world = Self {
            id,
            generator: TerrainGenerator::new(
                config.seed,
                config.sector_size,
                config.terrain.clone(),
                config.clearing_size,
            ),
            current_sector: SectorCoord::ORIGIN,
        };
        directory.checkin(id, Actor::World(world));
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Sector the window is centred on.
    #[must_use]
    pub fn current_sector(&self) -> SectorCoord {
        self.current_sector
    }

    /// Generates every sector of the window around `center` from scratch.
    pub(crate) fn load_window(&mut self, center: SectorCoord, ctx: &mut Context<'_>) {
        self.current_sector = center;
        for sector in center.adjacent() {
            self.generate_sector(sector, ctx);
        }
        self.move_pathing_window(ctx);
    }

    pub(crate) fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        drain_mailbox(self.id, ctx, |_, _| Ok(()))?;

        let Some(position) = player_position(ctx) else {
            return Ok(());
        };
        let sector = SectorCoord::containing(position, ctx.config.sector_size);
        if sector != self.current_sector {
            self.change_sector(sector, ctx);
        }
        Ok(())
    }

    fn change_sector(&mut self, to: SectorCoord, ctx: &mut Context<'_>) {
        let from = self.current_sector;
        let old: BTreeSet<SectorCoord> = from.adjacent().into_iter().collect();
        let new: BTreeSet<SectorCoord> = to.adjacent().into_iter().collect();
        debug!(?from, ?to, "player changed sector");

        for sector in old.difference(&new) {
            self.unload_sector(*sector, ctx);
        }
        for sector in new.difference(&old) {
            self.generate_sector(*sector, ctx);
        }

        self.current_sector = to;
        self.move_pathing_window(ctx);
        ctx.engine.emit(Event::SectorChanged { from, to });
    }

    /// Removes the sector's obstacles and every unit in it except the
    /// player's, telling the score keepers about each removal.
    fn unload_sector(&self, sector: SectorCoord, ctx: &mut Context<'_>) {
        let size = ctx.config.sector_size;
        let player_unit = ctx.directory.alias(ActorAlias::PlayerUnitActor);
        let leaving: Vec<ActorId> = ctx
            .engine
            .bodies()
            .filter(|(id, body)| {
                Some(*id) != player_unit && SectorCoord::containing(body.position, size) == sector
            })
            .map(|(id, _)| id)
            .collect();

        for id in leaving {
            let Some(removed) = ctx.directory.unit(id).map(|unit| unit.identity()) else {
                continue;
            };
            ctx.publish_to_aliases(
                Message::UnitRemoved { removed },
                &[ActorAlias::PlayerActor, ActorAlias::EnemyActor],
            );
            ctx.engine.emit(Event::UnitRemoved { unit: removed });
            ctx.destroy_actor(id);
        }

        let obstacles = ctx.engine.remove_obstacles_within(sector.bounds(size));
        debug!(?sector, obstacles, "unloaded sector");
    }

    fn generate_sector(&self, sector: SectorCoord, ctx: &mut Context<'_>) {
        let _ = ctx
            .engine
            .remove_obstacles_within(sector.bounds(ctx.config.sector_size));
        let trees = self.generator.generate(sector);
        for center in &trees {
            let _ = ctx.engine.spawn_obstacle(Obstacle {
                kind: ObstacleKind::Tree,
                footprint: Aabb::new(*center, Vec2::splat(TREE_SIZE)),
            });
        }
        ctx.engine.emit(Event::SectorGenerated {
            sector,
            obstacles: trees.len(),
        });
    }

    fn move_pathing_window(&self, ctx: &mut Context<'_>) {
        let bounds = self.current_sector.window_bounds(ctx.config.sector_size);
        if let Some(pathing) = ctx.directory.pathing_mut() {
            pathing.set_bounds(bounds);
        }
    }
}

fn player_position(ctx: &Context<'_>) -> Option<Vec2> {
    let unit = ctx.directory.alias(ActorAlias::PlayerUnitActor)?;
    ctx.engine.body(unit).map(|body| body.position)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Game, WorldConfig};
    use prey_arena_core::{InputFrame, Team, UnitTypeName};

    const FRAME: Duration = Duration::from_millis(16);

    fn calm_config() -> WorldConfig {
        WorldConfig {
            enemy_targets: Default::default(),
            ..WorldConfig::default()
        }
    }

    fn move_player(game: &mut Game, position: Vec2) {
        let unit = game
            .directory()
            .alias(ActorAlias::PlayerUnitActor)
            .expect("player unit");
        game.engine_mut().body_mut(unit).expect("body").position = position;
    }

    #[test]
    fn crossing_a_sector_border_streams_the_window() {
        let config = calm_config();
        let size = config.sector_size;
        let generator = TerrainGenerator::new(
            config.seed,
            size,
            config.terrain.clone(),
            config.clearing_size,
        );
        let mut game = Game::new(config).expect("valid config");
        let _ = game.start_round();
        let straggler = game.spawn_unit(UnitTypeName::Pig, Vec2::new(-size, 0.0), Team::Enemy);
        let neighbour = game.spawn_unit(UnitTypeName::Pig, Vec2::new(size * 0.9, 0.0), Team::Enemy);
        let _ = game.drain_events();

        move_player(&mut game, Vec2::new(size, 0.0));
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        assert!(!game.directory().is_registered(straggler));
        assert!(game.directory().is_registered(neighbour));
        assert_eq!(
            game.directory().world().expect("world").current_sector(),
            SectorCoord::new(1, 0)
        );

        let events = game.drain_events();
        assert!(events.contains(&Event::SectorChanged {
            from: SectorCoord::ORIGIN,
            to: SectorCoord::new(1, 0),
        }));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UnitRemoved { unit } if unit.actor == straggler
        )));
        for y in -1..=1 {
            let sector = SectorCoord::new(2, y);
            assert!(events.contains(&Event::SectorGenerated {
                sector,
                obstacles: generator.generate(sector).len(),
            }));
        }

        let left_edge = -size * 0.5;
        assert!(game
            .engine()
            .obstacles()
            .all(|obstacle| obstacle.footprint.center.x > left_edge));
        let window = SectorCoord::new(1, 0).window_bounds(size);
        assert_eq!(game.directory().pathing().expect("pathing").bounds(), window);
    }

    #[test]
    fn revisited_sectors_reproduce_their_layout() {
        let config = calm_config();
        let size = config.sector_size;
        let mut game = Game::new(config).expect("valid config");
        let _ = game.start_round();
        let snapshot = |game: &Game| {
            let mut centers: Vec<(i32, i32)> = game
                .engine()
                .obstacles()
                .map(|obstacle| {
                    let center = obstacle.footprint.center;
                    (center.x.floor() as i32, center.y.floor() as i32)
                })
                .collect();
            centers.sort_unstable();
            centers
        };
        let before = snapshot(&game);

        move_player(&mut game, Vec2::new(size, 0.0));
        game.update(FRAME, &InputFrame::idle()).expect("out");
        move_player(&mut game, Vec2::ZERO);
        game.update(FRAME, &InputFrame::idle()).expect("back");

        assert_eq!(snapshot(&game), before);
    }
}
