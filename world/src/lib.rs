#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative actor world for Prey Arena.
//!
//! Every participant in the simulation is an actor registered in the
//! [`ActorDirectory`]. Actors never call each other: they publish messages
//! through the [`MessageBroker`], which enqueues them on the mailbox of each
//! actor that passes the routing rules. Units carry a queue of [`Order`]s;
//! each order drives one [`Ability`] gated by [`AbilityCheck`]s and recovers
//! from failed checks by retrying, delegating to a child order or giving up.
//!
//! [`Game`] owns the directory, the broker, the [`Engine`] and the campaign
//! score, and advances them one frame at a time in a fixed phase order.

mod ability;
mod actor;
mod broker;
mod check;
mod config;
mod context;
mod directory;
mod enemy;
mod engine;
mod error;
mod game;
mod input;
mod order;
mod pathing;
mod player;
mod sectors;
mod unit;
mod weapon;

pub use ability::{Ability, AbilityStage};
pub use broker::MessageBroker;
pub use check::{first_failed_check, AbilityCheck};
pub use config::{ConfigError, WorldConfig};
pub use directory::ActorDirectory;
pub use enemy::EnemyActor;
pub use engine::{Body, Engine, Obstacle, ObstacleId, ObstacleKind};
pub use error::WorldError;
pub use game::Game;
pub use input::InputActor;
pub use order::{Order, OrderStage};
pub use pathing::PathingActor;
pub use player::PlayerActor;
pub use sectors::WorldActor;
pub use unit::{UnitActor, UnitFlags};
pub use weapon::{ray_count, WeaponActor, WeaponFlags};

/// Query functions that provide read-only snapshots of the world.
pub mod query {
    use prey_arena_core::{
        ActorAlias, ActorId, ActorKind, Aabb, Team, UnitTypeName, Vec2, WeaponTypeName,
        WELCOME_BANNER,
    };

    use super::{Game, UnitActor, WeaponActor};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(_game: &Game) -> &'static str {
        WELCOME_BANNER
    }

    /// Captures every unit that has a body, in ascending id order.
    #[must_use]
    pub fn units(game: &Game) -> Vec<UnitSnapshot> {
        game.directory()
            .ids_of_kind(ActorKind::Unit)
            .into_iter()
            .filter_map(|id| unit(game, id))
            .collect()
    }

    /// Captures a single unit.
    #[must_use]
    pub fn unit(game: &Game, id: ActorId) -> Option<UnitSnapshot> {
        let unit = game.directory().unit(id)?;
        let body = game.engine().body(id)?;
        let equipped = unit
            .equipped_weapon()
            .and_then(|weapon| game.directory().weapon(weapon))
            .map(WeaponSnapshot::of);
        Some(UnitSnapshot::of(unit, body.position, body.velocity, equipped))
    }

    /// Captures the unit controlled by the player, while it lives.
    #[must_use]
    pub fn player_unit(game: &Game) -> Option<UnitSnapshot> {
        let id = game.directory().alias(ActorAlias::PlayerUnitActor)?;
        unit(game, id)
    }

    /// Enemy unit closest to `from`; ties go to the lower id.
    #[must_use]
    pub fn nearest_enemy(game: &Game, from: Vec2) -> Option<UnitSnapshot> {
        units(game)
            .into_iter()
            .filter(|snapshot| snapshot.team == Team::Enemy)
            .min_by(|a, b| {
                a.position
                    .distance_squared(from)
                    .total_cmp(&b.position.distance_squared(from))
            })
    }

    /// Footprints of every obstacle currently in the world.
    #[must_use]
    pub fn obstacle_footprints(game: &Game) -> Vec<Aabb> {
        game.engine()
            .obstacles()
            .map(|obstacle| obstacle.footprint)
            .collect()
    }

    /// Immutable representation of a unit used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct UnitSnapshot {
        /// Actor identifier of the unit.
        pub id: ActorId,
        /// Template the unit was spawned from.
        pub unit_type: UnitTypeName,
        /// Side the unit fights for.
        pub team: Team,
        /// Body centre.
        pub position: Vec2,
        /// Body velocity in world units per frame.
        pub velocity: Vec2,
        /// Facing angle in radians.
        pub facing_angle: f32,
        /// Remaining hitpoints.
        pub hitpoints: f32,
        /// Hitpoints of a fresh unit of this type.
        pub max_hitpoints: f32,
        /// Currently equipped weapon.
        pub equipped_weapon: Option<WeaponSnapshot>,
    }

    impl UnitSnapshot {
        fn of(
            unit: &UnitActor,
            position: Vec2,
            velocity: Vec2,
            equipped_weapon: Option<WeaponSnapshot>,
        ) -> Self {
            Self {
                id: unit.id(),
                unit_type: unit.unit_type().name,
                team: unit.team(),
                position,
                velocity,
                facing_angle: unit.facing_angle(),
                hitpoints: unit.hitpoints(),
                max_hitpoints: unit.unit_type().hitpoints,
                equipped_weapon,
            }
        }
    }

    /// Immutable representation of a weapon used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct WeaponSnapshot {
        /// Weapon template.
        pub weapon_type: WeaponTypeName,
        /// Rounds in the clip.
        pub loaded_rounds: u32,
        /// Clip capacity.
        pub clip_size: u32,
        /// Reach of the ray fan.
        pub range: f32,
        /// Indicates whether a reload cycle is running.
        pub reloading: bool,
    }

    impl WeaponSnapshot {
        fn of(weapon: &WeaponActor) -> Self {
            Self {
                weapon_type: weapon.weapon_type(),
                loaded_rounds: weapon.loaded_rounds(),
                clip_size: weapon.stats().clip_size,
                range: weapon.stats().range,
                reloading: weapon.flags().reloading,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use prey_arena_core::{InputFrame, Team, UnitTypeName, Vec2, WeaponTypeName, WELCOME_BANNER};

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn welcome_banner_is_exposed() {
        let game = Game::new(WorldConfig::default()).expect("valid config");
        assert_eq!(query::welcome_banner(&game), WELCOME_BANNER);
    }

    #[test]
    fn nearest_enemy_ignores_the_player_team() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let _ = game.spawn_unit(UnitTypeName::Prey, Vec2::new(0.5, 0.0), Team::Player);
        let far = game.spawn_unit(UnitTypeName::Pig, Vec2::new(6.0, 0.0), Team::Enemy);
        let near = game.spawn_unit(UnitTypeName::Mouse, Vec2::new(-3.0, 0.0), Team::Enemy);

        assert_eq!(query::nearest_enemy(&game, Vec2::ZERO).map(|s| s.id), Some(near));
        assert_eq!(
            query::nearest_enemy(&game, Vec2::new(5.0, 0.0)).map(|s| s.id),
            Some(far)
        );
    }

    #[test]
    fn player_snapshot_reports_the_equipped_weapon() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        assert!(query::player_unit(&game).is_none());

        let _ = game.start_round();
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        let prey = query::player_unit(&game).expect("prey");
        assert_eq!(prey.unit_type, UnitTypeName::Prey);
        assert_eq!(prey.hitpoints, prey.max_hitpoints);
        let weapon = prey.equipped_weapon.expect("bat");
        assert_eq!(weapon.weapon_type, WeaponTypeName::Bat);
        assert_eq!(weapon.loaded_rounds, weapon.clip_size);
    }
}
