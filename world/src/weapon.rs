//! Weapons owned by units: clip, cooldown, reload cycle and the ray fan.

use std::time::Duration;

use prey_arena_core::{
    angle_of, vector_from_angle, ActorAlias, ActorId, ActorKind, Event, Message,
    MessageRoutingRules, Segment, Team, UpgradeLevels, Vec2, WeaponStats, WeaponTypeName,
};
use tracing::{debug, trace};

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    UnitActor, WorldError,
};

const MIN_RAY_GAP: f32 = 0.5;
const MIN_RAYS: usize = 2;
const MAX_RAYS: usize = 100;

/// Number of rays traced for a shot so that no gap wider than half a unit
/// opens between neighbouring rays at full range.
#[must_use]
pub fn ray_count(spread: f32, range: f32) -> usize {
    if !range.is_finite() || range <= 0.0 || !spread.is_finite() {
        return MIN_RAYS;
    }
    let step = 2.0 * (MIN_RAY_GAP / (2.0 * range)).min(1.0).asin();
    let rays = (spread / step).ceil();
    if rays.is_nan() {
        return MIN_RAYS;
    }
    (rays.max(0.0) as usize).clamp(MIN_RAYS, MAX_RAYS)
}

/// Derived weapon state, recomputed from the clip and the timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaponFlags {
    /// The last shot is more recent than the cooldown.
    pub on_cooldown: bool,
    /// A reload cycle is running.
    pub reloading: bool,
    /// No rounds are loaded.
    pub clip_is_empty: bool,
    /// The clip holds its full capacity.
    pub clip_is_full: bool,
}

/// Runtime instance of a weapon type carried by one unit.
#[derive(Debug)]
pub struct WeaponActor {
    id: ActorId,
    weapon_type: WeaponTypeName,
    owner: ActorId,
    owner_team: Team,
    stats: WeaponStats,
    loaded_rounds: u32,
    last_fire: Option<Duration>,
    last_reload: Option<Duration>,
    flags: WeaponFlags,
}

impl WeaponActor {
    /// Registers a weapon for `owner` with a full clip.
    ///
    /// Player weapons use the purchased upgrade levels.
    pub(crate) fn spawn(
        ctx: &mut Context<'_>,
        weapon_type: WeaponTypeName,
        owner: &UnitActor,
    ) -> ActorId {
        let base = UpgradeLevels::new();
        let levels = match owner.team() {
            Team::Player => ctx.score.upgrade_levels(weapon_type),
            Team::Enemy => &base,
        };
        let stats = weapon_type.weapon_type().stats(levels, owner.unit_type());

        let id = ctx.directory.register(ActorKind::Weapon);
        let mut weapon = Self {
            id,
            weapon_type,
            owner: owner.id(),
            owner_team: owner.team(),
            stats,
            loaded_rounds: stats.clip_size,
            last_fire: None,
            last_reload: None,
            flags: WeaponFlags::default(),
        };
        weapon.refresh_flags(ctx.now());
        ctx.directory.checkin(id, Actor::Weapon(weapon));
        debug!(weapon = %id, owner = %owner.id(), ?weapon_type, "spawned weapon");
        id
    }

    /// Weapon template.
    #[must_use]
    pub fn weapon_type(&self) -> WeaponTypeName {
        self.weapon_type
    }

    /// Unit carrying the weapon.
    #[must_use]
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Effective stats after upgrades and owner adjustments.
    #[must_use]
    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    /// Rounds currently in the clip.
    #[must_use]
    pub fn loaded_rounds(&self) -> u32 {
        self.loaded_rounds
    }

    /// Derived state as of the last refresh.
    #[must_use]
    pub fn flags(&self) -> WeaponFlags {
        self.flags
    }

    pub(crate) fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        let now = ctx.now();
        self.finish_reload(now);
        self.refresh_flags(now);

        drain_mailbox(self.id, ctx, |message, ctx| {
            let handled = self.handle_message(message, ctx);
            self.refresh_flags(ctx.now());
            handled
        })
    }

    fn finish_reload(&mut self, now: Duration) {
        let Some(started) = self.last_reload else {
            return;
        };
        if now.saturating_sub(started) >= self.stats.reload {
            self.loaded_rounds =
                (self.loaded_rounds + self.stats.reload_rounds).min(self.stats.clip_size);
            self.last_reload = None;
            trace!(weapon = %self.id, loaded = self.loaded_rounds, "reload cycle finished");
        }
    }

    fn refresh_flags(&mut self, now: Duration) {
        self.flags = WeaponFlags {
            on_cooldown: self
                .last_fire
                .is_some_and(|fired| now.saturating_sub(fired) < self.stats.cooldown),
            reloading: self.last_reload.is_some(),
            clip_is_empty: self.loaded_rounds == 0,
            clip_is_full: self.loaded_rounds >= self.stats.clip_size,
        };
    }

    fn handle_message(&mut self, message: Message, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        match message {
            Message::FireWeapon { target } => self.fire(target, ctx)?,
            Message::ReloadWeapon => self.start_reload(ctx),
            Message::WeaponEquipped => {
                if self.loaded_rounds == 0 {
                    self.start_reload(ctx);
                }
            }
            Message::WeaponUnequipped => self.last_reload = None,
            _ => {}
        }
        Ok(())
    }

    fn fire(&mut self, target: Vec2, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        if self.loaded_rounds == 0 {
            return Err(WorldError::ClipEmpty(self.id));
        }
        if self.flags.on_cooldown {
            return Err(WorldError::WeaponOnCooldown(self.id));
        }
        let origin = ctx
            .engine
            .body(self.owner)
            .ok_or(WorldError::MissingBody(self.owner))?
            .position;

        self.last_reload = None;
        self.loaded_rounds -= 1;
        self.last_fire = Some(ctx.now());

        let rays = self.rays(origin, target);
        let rules = MessageRoutingRules::intersecting(rays.clone()).excluding(vec![self.owner]);
        ctx.publish(
            Message::ImpactUnit {
                force: self.stats.force,
                origin,
            },
            rules.clone(),
        );
        ctx.publish(
            Message::DamageUnit {
                damaging_actor: self.owner,
                damage: self.stats.damage,
            },
            rules,
        );
        ctx.engine.emit(Event::WeaponFired {
            weapon: self.id,
            weapon_type: self.weapon_type,
            rays,
        });
        if self.owner_team == Team::Player {
            ctx.publish_to_aliases(
                Message::PlayerFiredWeapon {
                    weapon: self.weapon_type,
                },
                &[ActorAlias::PlayerActor],
            );
        }
        trace!(weapon = %self.id, loaded = self.loaded_rounds, "weapon fired");

        if self.loaded_rounds == 0 {
            self.start_reload(ctx);
        }
        Ok(())
    }

    /// Fan of rays centred on the aim direction, one `range` long each.
    fn rays(&self, origin: Vec2, target: Vec2) -> Vec<Segment> {
        let count = ray_count(self.stats.spread, self.stats.range);
        let aim = angle_of(target - origin);
        let first = aim - self.stats.spread / 2.0;
        let step = self.stats.spread / (count - 1) as f32;

        (0..count)
            .map(|index| {
                let angle = first + step * index as f32;
                Segment::new(origin, origin + vector_from_angle(angle, self.stats.range))
            })
            .collect()
    }

    fn start_reload(&mut self, ctx: &mut Context<'_>) {
        if self.loaded_rounds >= self.stats.clip_size || self.last_reload.is_some() {
            return;
        }
        self.last_reload = Some(ctx.now());
        ctx.engine.emit(Event::ReloadStarted {
            weapon: self.id,
            weapon_type: self.weapon_type,
        });
        debug!(weapon = %self.id, weapon_type = ?self.weapon_type, "reload started");
    }

    #[cfg(test)]
    pub(crate) fn empty_clip(&mut self) {
        self.loaded_rounds = 0;
        self.flags.clip_is_empty = true;
        self.flags.clip_is_full = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Game, WorldConfig};
    use prey_arena_core::{InputFrame, UnitTypeName};

    const FRAME: Duration = Duration::from_millis(16);

    fn armed_prey(game: &mut Game, weapon: WeaponTypeName) -> (ActorId, ActorId) {
        let prey = game.spawn_unit(UnitTypeName::Prey, Vec2::ZERO, Team::Player);
        let _ = game.publish(
            Message::AddWeapon { weapon },
            &MessageRoutingRules::to_actor(prey),
        );
        game.update(FRAME, &InputFrame::idle()).expect("frame");
        let weapon = game
            .directory()
            .unit(prey)
            .and_then(UnitActor::equipped_weapon)
            .expect("weapon equipped");
        (prey, weapon)
    }

    fn fire_at(game: &mut Game, weapon: ActorId, target: Vec2) {
        let _ = game.publish(
            Message::FireWeapon { target },
            &MessageRoutingRules::to_actor(weapon),
        );
    }

    #[test]
    fn quarter_turn_fan_at_two_units_uses_seven_rays() {
        assert_eq!(ray_count(std::f32::consts::FRAC_PI_2, 2.0), 7);
    }

    #[test]
    fn degenerate_ranges_still_trace_two_rays() {
        assert_eq!(ray_count(0.6, 0.0), 2);
        assert_eq!(ray_count(0.6, f32::INFINITY), 2);
        assert_eq!(ray_count(0.0, 8.0), 2);
        assert_eq!(ray_count(std::f32::consts::PI, 0.1), 2);
        assert_eq!(ray_count(1000.0, 1000.0), 100);
    }

    #[test]
    fn firing_with_a_full_clip_hits_targets_in_the_line() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (prey, pistol) = armed_prey(&mut game, WeaponTypeName::Pistol);
        let pig = game.spawn_unit(UnitTypeName::Pig, Vec2::new(3.0, 0.0), Team::Enemy);
        let clip = game.directory().weapon(pistol).expect("pistol").stats().clip_size;
        let _ = game.drain_events();

        fire_at(&mut game, pistol, Vec2::new(3.0, 0.0));
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        let weapon = game.directory().weapon(pistol).expect("pistol");
        assert_eq!(weapon.loaded_rounds(), clip - 1);
        assert!(!weapon.flags().clip_is_empty);
        assert!(weapon.flags().on_cooldown);

        let mail: Vec<&Message> = game.directory().mailbox(pig).expect("pig").iter().collect();
        assert!(matches!(mail[0], Message::ImpactUnit { .. }));
        assert!(matches!(
            mail[1],
            Message::DamageUnit { damaging_actor, .. } if *damaging_actor == prey
        ));
        assert!(game.directory().mailbox(prey).expect("prey").is_empty());

        let fired = game.drain_events().into_iter().find_map(|event| match event {
            Event::WeaponFired { rays, .. } => Some(rays),
            _ => None,
        });
        assert!(fired.is_some_and(|rays| rays.len() >= 2));
    }

    #[test]
    fn firing_an_empty_clip_is_an_invariant_violation() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (_, bat) = armed_prey(&mut game, WeaponTypeName::Bat);

        fire_at(&mut game, bat, Vec2::X);
        fire_at(&mut game, bat, Vec2::X);

        assert_eq!(
            game.update(FRAME, &InputFrame::idle()),
            Err(WorldError::ClipEmpty(bat))
        );
    }

    #[test]
    fn emptied_clip_reloads_itself() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (_, bat) = armed_prey(&mut game, WeaponTypeName::Bat);
        let _ = game.drain_events();

        fire_at(&mut game, bat, Vec2::X);
        game.update(FRAME, &InputFrame::idle()).expect("fire");
        let weapon = game.directory().weapon(bat).expect("bat");
        assert_eq!(weapon.loaded_rounds(), 0);
        assert!(weapon.flags().reloading);
        assert!(game
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::ReloadStarted { weapon, .. } if *weapon == bat)));

        game.update(FRAME, &InputFrame::idle()).expect("reload");
        let weapon = game.directory().weapon(bat).expect("bat");
        assert_eq!(weapon.loaded_rounds(), 1);
        assert!(weapon.flags().clip_is_full);
        assert!(!weapon.flags().reloading);
    }

    #[test]
    fn reload_cycle_adds_rounds_up_to_the_clip_size() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (_, pistol) = armed_prey(&mut game, WeaponTypeName::Pistol);
        let stats = *game.directory().weapon(pistol).expect("pistol").stats();

        fire_at(&mut game, pistol, Vec2::X);
        game.update(FRAME, &InputFrame::idle()).expect("fire");
        let _ = game.publish(
            Message::ReloadWeapon,
            &MessageRoutingRules::to_actor(pistol),
        );
        game.update(FRAME, &InputFrame::idle()).expect("start reload");
        assert!(game.directory().weapon(pistol).expect("pistol").flags().reloading);

        let mut elapsed = Duration::ZERO;
        while elapsed <= stats.reload {
            game.update(FRAME, &InputFrame::idle()).expect("frame");
            elapsed += FRAME;
        }

        let weapon = game.directory().weapon(pistol).expect("pistol");
        assert_eq!(weapon.loaded_rounds(), stats.clip_size);
        assert!(!weapon.flags().reloading);
    }

    #[test]
    fn full_clips_ignore_reload_requests() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (_, pistol) = armed_prey(&mut game, WeaponTypeName::Pistol);
        let _ = game.drain_events();

        let _ = game.publish(
            Message::ReloadWeapon,
            &MessageRoutingRules::to_actor(pistol),
        );
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        assert!(!game.directory().weapon(pistol).expect("pistol").flags().reloading);
        assert!(!game
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::ReloadStarted { .. })));
    }

    #[test]
    fn unequipping_cancels_a_running_reload() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (_, pistol) = armed_prey(&mut game, WeaponTypeName::Pistol);

        fire_at(&mut game, pistol, Vec2::X);
        game.update(FRAME, &InputFrame::idle()).expect("fire");
        for message in [Message::ReloadWeapon, Message::WeaponUnequipped] {
            let _ = game.publish(message, &MessageRoutingRules::to_actor(pistol));
        }
        game.update(FRAME, &InputFrame::idle()).expect("frame");

        let weapon = game.directory().weapon(pistol).expect("pistol");
        assert!(!weapon.flags().reloading);
        assert_eq!(weapon.loaded_rounds(), weapon.stats().clip_size - 1);
    }
}
