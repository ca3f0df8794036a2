//! Stateless preconditions that gate ability progress.

use prey_arena_core::{ActorId, UnitFlag, WeaponTypeName};

use crate::{ActorDirectory, Engine, UnitActor};

/// Boolean predicate over the current directory and engine state.
///
/// A check whose subject cannot be found fails rather than erroring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityCheck {
    /// The unit is registered.
    UnitExists {
        /// Unit to look up.
        unit: ActorId,
    },
    /// The unit's flag has the expected value.
    UnitFlag {
        /// Unit to inspect.
        unit: ActorId,
        /// Flag to read.
        flag: UnitFlag,
        /// Value required to pass.
        expected: bool,
    },
    /// The unit has a live weapon equipped.
    UnitHasWeaponEquipped {
        /// Unit to inspect.
        unit: ActorId,
    },
    /// The unit carries a weapon of the given type.
    UnitOwnsWeapon {
        /// Unit to inspect.
        unit: ActorId,
        /// Weapon type required.
        weapon: WeaponTypeName,
    },
    /// The weapon may fire again.
    WeaponOffCooldown {
        /// Weapon to inspect.
        weapon: ActorId,
    },
    /// The weapon is not in a reload cycle.
    WeaponNotReloading {
        /// Weapon to inspect.
        weapon: ActorId,
    },
    /// The weapon has at least one round loaded.
    WeaponClipNotEmpty {
        /// Weapon to inspect.
        weapon: ActorId,
    },
    /// The weapon has room for more rounds.
    WeaponClipNotFull {
        /// Weapon to inspect.
        weapon: ActorId,
    },
    /// The target's near edge lies within `range` of the unit's center.
    UnitInRange {
        /// Unit measuring the distance.
        unit: ActorId,
        /// Unit that must be reachable.
        target: ActorId,
        /// Maximum reach.
        range: f32,
    },
}

impl AbilityCheck {
    /// Evaluates the predicate.
    #[must_use]
    pub fn passes(&self, directory: &ActorDirectory, engine: &Engine) -> bool {
        match *self {
            AbilityCheck::UnitExists { unit } => directory.unit(unit).is_some(),
            AbilityCheck::UnitFlag {
                unit,
                flag,
                expected,
            } => directory
                .unit(unit)
                .is_some_and(|unit| unit.flags().get(flag) == expected),
            AbilityCheck::UnitHasWeaponEquipped { unit } => directory
                .unit(unit)
                .and_then(UnitActor::equipped_weapon)
                .is_some_and(|weapon| directory.weapon(weapon).is_some()),
            AbilityCheck::UnitOwnsWeapon { unit, weapon } => {
                directory.unit(unit).is_some_and(|unit| {
                    unit.weapons().iter().any(|owned| {
                        directory
                            .weapon(*owned)
                            .is_some_and(|owned| owned.weapon_type() == weapon)
                    })
                })
            }
            AbilityCheck::WeaponOffCooldown { weapon } => directory
                .weapon(weapon)
                .is_some_and(|weapon| !weapon.flags().on_cooldown),
            AbilityCheck::WeaponNotReloading { weapon } => directory
                .weapon(weapon)
                .is_some_and(|weapon| !weapon.flags().reloading),
            AbilityCheck::WeaponClipNotEmpty { weapon } => directory
                .weapon(weapon)
                .is_some_and(|weapon| !weapon.flags().clip_is_empty),
            AbilityCheck::WeaponClipNotFull { weapon } => directory
                .weapon(weapon)
                .is_some_and(|weapon| !weapon.flags().clip_is_full),
            AbilityCheck::UnitInRange {
                unit,
                target,
                range,
            } => match (engine.body(unit), engine.body(target)) {
                (Some(unit), Some(target)) => {
                    let radius = target.size.max_element() / 2.0;
                    unit.position.distance(target.position) - radius <= range
                }
                _ => false,
            },
        }
    }
}

/// Index of the first check that fails, evaluating no check after it.
pub fn first_failed_check<'a, I, F>(checks: I, mut passes: F) -> Option<usize>
where
    I: IntoIterator<Item = &'a AbilityCheck>,
    F: FnMut(&AbilityCheck) -> bool,
{
    checks.into_iter().position(|check| !passes(check))
}
