//! Immutable unit and weapon templates plus upgrade arithmetic.

use std::{collections::BTreeMap, f32::consts::PI, time::Duration};

use serde::{Deserialize, Serialize};

/// Names every unit template known to the simulation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnitTypeName {
    /// The player-controlled prey.
    Prey,
    /// Small, fast and fragile enemy.
    Mouse,
    /// Medium enemy with moderate hitpoints.
    Rabbit,
    /// Slow, heavy enemy that hits hard.
    Pig,
}

impl UnitTypeName {
    /// Every unit type in declaration order.
    pub const ALL: [UnitTypeName; 4] = [
        UnitTypeName::Prey,
        UnitTypeName::Mouse,
        UnitTypeName::Rabbit,
        UnitTypeName::Pig,
    ];

    /// Template describing the unit type.
    #[must_use]
    pub const fn unit_type(self) -> &'static UnitType {
        match self {
            UnitTypeName::Prey => &PREY,
            UnitTypeName::Mouse => &MOUSE,
            UnitTypeName::Rabbit => &RABBIT,
            UnitTypeName::Pig => &PIG,
        }
    }
}

/// RGB tint used by adapters when drawing a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitColor {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl UnitColor {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Data-only template shared by every unit of a type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitType {
    /// Name of the template.
    pub name: UnitTypeName,
    /// Speed in world units per simulation frame.
    pub move_speed: f32,
    /// Edge length of the unit's square footprint.
    pub size: f32,
    /// Mass used when resolving knockback.
    pub mass: f32,
    /// Display colour.
    pub color: UnitColor,
    /// Maximum hitpoints.
    pub hitpoints: f32,
    /// Points awarded for killing a unit of this type.
    pub score: u32,
    /// Weapons added to every fresh unit of this type.
    pub default_weapons: &'static [WeaponTypeName],
}

const PREY: UnitType = UnitType {
    name: UnitTypeName::Prey,
    move_speed: 0.2,
    size: 1.0,
    mass: 1.0,
    color: UnitColor::new(230, 230, 230),
    hitpoints: 10.0,
    score: 0,
    default_weapons: &[],
};

const MOUSE: UnitType = UnitType {
    name: UnitTypeName::Mouse,
    move_speed: 0.15,
    size: 0.6,
    mass: 0.5,
    color: UnitColor::new(140, 140, 150),
    hitpoints: 1.0,
    score: 1,
    default_weapons: &[WeaponTypeName::AnimalMelee],
};

const RABBIT: UnitType = UnitType {
    name: UnitTypeName::Rabbit,
    move_speed: 0.12,
    size: 0.8,
    mass: 1.0,
    color: UnitColor::new(200, 170, 120),
    hitpoints: 3.0,
    score: 3,
    default_weapons: &[WeaponTypeName::AnimalMelee],
};

const PIG: UnitType = UnitType {
    name: UnitTypeName::Pig,
    move_speed: 0.08,
    size: 1.4,
    mass: 3.0,
    color: UnitColor::new(240, 160, 170),
    hitpoints: 10.0,
    score: 10,
    default_weapons: &[WeaponTypeName::AnimalMelee],
};

/// Names every weapon template known to the simulation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeaponTypeName {
    /// Short-ranged wide swing available from the first round.
    Bat,
    /// Accurate single-shot firearm.
    Pistol,
    /// Wide spread firearm with a small clip.
    Shotgun,
    /// Natural attack carried by every enemy animal.
    AnimalMelee,
}

impl WeaponTypeName {
    /// Every weapon type in declaration order.
    pub const ALL: [WeaponTypeName; 4] = [
        WeaponTypeName::Bat,
        WeaponTypeName::Pistol,
        WeaponTypeName::Shotgun,
        WeaponTypeName::AnimalMelee,
    ];

    /// Template describing the weapon type.
    #[must_use]
    pub const fn weapon_type(self) -> &'static WeaponType {
        match self {
            WeaponTypeName::Bat => &BAT,
            WeaponTypeName::Pistol => &PISTOL,
            WeaponTypeName::Shotgun => &SHOTGUN,
            WeaponTypeName::AnimalMelee => &ANIMAL_MELEE,
        }
    }

    /// Upgrades that may be purchased for the weapon.
    #[must_use]
    pub const fn upgrades(self) -> &'static [WeaponUpgrade] {
        match self {
            WeaponTypeName::Bat => &BAT_UPGRADES,
            WeaponTypeName::Pistol => &PISTOL_UPGRADES,
            WeaponTypeName::Shotgun => &SHOTGUN_UPGRADES,
            WeaponTypeName::AnimalMelee => &[],
        }
    }

    /// Looks up the upgrade definition for a single stat.
    #[must_use]
    pub fn upgrade(self, stat: WeaponStat) -> Option<&'static WeaponUpgrade> {
        self.upgrades().iter().find(|upgrade| upgrade.stat == stat)
    }
}

/// Data-only template shared by every weapon of a type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponType {
    /// Name of the template.
    pub name: WeaponTypeName,
    /// Minimum time between two shots.
    pub cooldown: Duration,
    /// Rounds held by a full clip.
    pub clip_size: u32,
    /// Time a reload takes to complete.
    pub reload: Duration,
    /// Rounds restored by one completed reload.
    pub reload_rounds: u32,
    /// Damage dealt to every unit struck by a shot.
    pub damage: f32,
    /// Reach of the ray fan in world units.
    pub range: f32,
    /// Angular width of the ray fan in radians.
    pub spread: f32,
    /// Knockback force applied to struck units.
    pub force: f32,
    /// Points awarded per shot fired.
    pub score: u32,
    /// Points required to unlock the weapon.
    pub unlock_cost: u32,
}

const BAT: WeaponType = WeaponType {
    name: WeaponTypeName::Bat,
    cooldown: Duration::from_millis(400),
    clip_size: 1,
    reload: Duration::ZERO,
    reload_rounds: 1,
    damage: 2.0,
    range: 1.5,
    spread: PI / 2.0,
    force: 2.0,
    score: 0,
    unlock_cost: 0,
};

const PISTOL: WeaponType = WeaponType {
    name: WeaponTypeName::Pistol,
    cooldown: Duration::from_millis(250),
    clip_size: 8,
    reload: Duration::from_millis(1200),
    reload_rounds: 8,
    damage: 1.0,
    range: 8.0,
    spread: 0.05,
    force: 0.5,
    score: 1,
    unlock_cost: 25,
};

const SHOTGUN: WeaponType = WeaponType {
    name: WeaponTypeName::Shotgun,
    cooldown: Duration::from_millis(800),
    clip_size: 2,
    reload: Duration::from_millis(500),
    reload_rounds: 1,
    damage: 2.0,
    range: 6.0,
    spread: 0.6,
    force: 3.0,
    score: 2,
    unlock_cost: 60,
};

const ANIMAL_MELEE: WeaponType = WeaponType {
    name: WeaponTypeName::AnimalMelee,
    cooldown: Duration::from_millis(1000),
    clip_size: 1,
    reload: Duration::ZERO,
    reload_rounds: 1,
    damage: 0.0,
    range: 0.0,
    spread: PI / 4.0,
    force: 0.0,
    score: 0,
    unlock_cost: 0,
};

/// Weapon stats that upgrades can modify.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeaponStat {
    /// Damage per struck unit.
    Damage,
    /// Reach of the ray fan.
    Range,
    /// Knockback force.
    Force,
    /// Reload duration.
    Reload,
    /// Clip size.
    ClipSize,
}

impl WeaponStat {
    /// Every upgradable stat in declaration order.
    pub const ALL: [WeaponStat; 5] = [
        WeaponStat::Damage,
        WeaponStat::Range,
        WeaponStat::Force,
        WeaponStat::Reload,
        WeaponStat::ClipSize,
    ];
}

/// Delta applied once per purchased upgrade stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UpgradeStep {
    /// Adds a fixed amount per stack.
    Flat(f32),
    /// Adds a fraction of the base value per stack.
    Percent(f32),
}

/// Purchasable upgrade for one stat of one weapon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponUpgrade {
    /// Stat modified by the upgrade.
    pub stat: WeaponStat,
    /// Delta applied per stack.
    pub step: UpgradeStep,
    /// Points charged per stack.
    pub cost: u32,
    /// Maximum number of stacks.
    pub max_stacks: u32,
}

const fn upgrade(stat: WeaponStat, step: UpgradeStep, cost: u32, max_stacks: u32) -> WeaponUpgrade {
    WeaponUpgrade {
        stat,
        step,
        cost,
        max_stacks,
    }
}

const BAT_UPGRADES: [WeaponUpgrade; 3] = [
    upgrade(WeaponStat::Damage, UpgradeStep::Flat(1.0), 10, 5),
    upgrade(WeaponStat::Range, UpgradeStep::Percent(0.1), 8, 3),
    upgrade(WeaponStat::Force, UpgradeStep::Percent(0.25), 6, 4),
];

const PISTOL_UPGRADES: [WeaponUpgrade; 5] = [
    upgrade(WeaponStat::Damage, UpgradeStep::Flat(0.5), 12, 4),
    upgrade(WeaponStat::Range, UpgradeStep::Flat(1.0), 8, 4),
    upgrade(WeaponStat::Force, UpgradeStep::Percent(0.2), 6, 3),
    upgrade(WeaponStat::Reload, UpgradeStep::Percent(-0.15), 10, 4),
    upgrade(WeaponStat::ClipSize, UpgradeStep::Flat(2.0), 10, 5),
];

const SHOTGUN_UPGRADES: [WeaponUpgrade; 5] = [
    upgrade(WeaponStat::Damage, UpgradeStep::Flat(1.0), 15, 4),
    upgrade(WeaponStat::Range, UpgradeStep::Percent(0.1), 10, 3),
    upgrade(WeaponStat::Force, UpgradeStep::Percent(0.25), 8, 4),
    upgrade(WeaponStat::Reload, UpgradeStep::Percent(-0.1), 12, 4),
    upgrade(WeaponStat::ClipSize, UpgradeStep::Flat(1.0), 20, 4),
];

/// Applies `stacks` upgrade steps on top of `base`, never dropping below zero.
#[must_use]
pub fn upgraded_value(base: f32, step: UpgradeStep, stacks: u32) -> f32 {
    let stacks = stacks as f32;
    let value = match step {
        UpgradeStep::Flat(delta) => base + delta * stacks,
        UpgradeStep::Percent(fraction) => base + base * fraction * stacks,
    };
    value.max(0.0)
}

/// Number of purchased stacks per upgradable stat for one weapon.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    stacks: BTreeMap<WeaponStat, u32>,
}

impl UpgradeLevels {
    /// Creates an empty set of upgrade levels.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stacks: BTreeMap::new(),
        }
    }

    /// Number of stacks purchased for the stat.
    #[must_use]
    pub fn level(&self, stat: WeaponStat) -> u32 {
        self.stacks.get(&stat).copied().unwrap_or(0)
    }

    /// Adds one stack to the stat and returns the new level.
    pub fn increment(&mut self, stat: WeaponStat) -> u32 {
        let level = self.stacks.entry(stat).or_insert(0);
        *level += 1;
        *level
    }
}

/// Effective weapon stats after owner and upgrade adjustments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponStats {
    /// Damage per struck unit.
    pub damage: f32,
    /// Reach of the ray fan.
    pub range: f32,
    /// Knockback force.
    pub force: f32,
    /// Angular width of the ray fan.
    pub spread: f32,
    /// Minimum time between shots.
    pub cooldown: Duration,
    /// Reload duration.
    pub reload: Duration,
    /// Rounds restored per reload.
    pub reload_rounds: u32,
    /// Rounds held by a full clip.
    pub clip_size: u32,
}

impl WeaponType {
    /// Resolves the effective stats of the weapon when carried by `owner`.
    ///
    /// Animal melee derives its damage, range and force from the owner's
    /// body; every other weapon stacks the purchased upgrades.
    #[must_use]
    pub fn stats(&self, levels: &UpgradeLevels, owner: &UnitType) -> WeaponStats {
        if self.name == WeaponTypeName::AnimalMelee {
            let relative_speed = owner.move_speed / PREY.move_speed;
            return WeaponStats {
                damage: owner.mass,
                range: owner.size * 0.75,
                force: (owner.mass / 2.0) * (1.0 + relative_speed),
                spread: self.spread,
                cooldown: self.cooldown,
                reload: self.reload,
                reload_rounds: self.reload_rounds,
                clip_size: self.clip_size,
            };
        }

        let upgraded = |stat: WeaponStat, base: f32| match self.name.upgrade(stat) {
            Some(upgrade) => upgraded_value(base, upgrade.step, levels.level(stat)),
            None => base,
        };

        let reload = if levels.level(WeaponStat::Reload) == 0 {
            self.reload
        } else {
            Duration::from_secs_f32(upgraded(WeaponStat::Reload, self.reload.as_secs_f32()))
        };
        let clip_size = upgraded(WeaponStat::ClipSize, self.clip_size as f32).round() as u32;

        WeaponStats {
            damage: upgraded(WeaponStat::Damage, self.damage),
            range: upgraded(WeaponStat::Range, self.range),
            force: upgraded(WeaponStat::Force, self.force),
            spread: self.spread,
            cooldown: self.cooldown,
            reload,
            reload_rounds: self.reload_rounds,
            clip_size: clip_size.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_never_drop_below_zero() {
        assert_eq!(upgraded_value(1.0, UpgradeStep::Percent(-0.4), 5), 0.0);
        assert_eq!(upgraded_value(2.0, UpgradeStep::Flat(-1.0), 3), 0.0);
    }

    #[test]
    fn upgrades_stack_on_base() {
        assert_eq!(upgraded_value(8.0, UpgradeStep::Flat(1.0), 3), 11.0);
        assert!((upgraded_value(10.0, UpgradeStep::Percent(0.1), 2) - 12.0).abs() < 1e-5);
    }

    #[test]
    fn animal_melee_scales_with_owner_body() {
        let pig = UnitTypeName::Pig.unit_type();
        let stats = WeaponTypeName::AnimalMelee
            .weapon_type()
            .stats(&UpgradeLevels::new(), pig);

        assert_eq!(stats.damage, pig.mass);
        assert!((stats.range - pig.size * 0.75).abs() < 1e-6);
        let expected_force = (pig.mass / 2.0) * (1.0 + pig.move_speed / PREY.move_speed);
        assert!((stats.force - expected_force).abs() < 1e-6);
    }

    #[test]
    fn purchased_clip_upgrades_extend_the_clip() {
        let mut levels = UpgradeLevels::new();
        assert_eq!(levels.increment(WeaponStat::ClipSize), 1);
        assert_eq!(levels.increment(WeaponStat::ClipSize), 2);

        let stats = WeaponTypeName::Pistol
            .weapon_type()
            .stats(&levels, UnitTypeName::Prey.unit_type());

        assert_eq!(stats.clip_size, 12);
        assert_eq!(stats.reload, Duration::from_millis(1200));
    }

    #[test]
    fn every_enemy_carries_a_weapon() {
        for name in UnitTypeName::ALL {
            let unit_type = name.unit_type();
            assert_eq!(unit_type.name, name);
            if name != UnitTypeName::Prey {
                assert!(!unit_type.default_weapons.is_empty());
            }
        }
    }
}
