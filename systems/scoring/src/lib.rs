#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round and campaign scoring for Prey Arena.
//!
//! [`RoundScore`] accumulates kills and shots while a round runs, and
//! [`GameScore`] carries difficulty, spendable points, weapon unlocks,
//! loadout slots and upgrade levels across rounds.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use prey_arena_core::{UnitTypeName, UpgradeLevels, WeaponStat, WeaponTypeName};
use serde::Serialize;
use thiserror::Error;

/// Number of weapon slots in the player's loadout.
pub const WEAPON_SLOTS: usize = 2;

static NO_UPGRADES: UpgradeLevels = UpgradeLevels::new();

/// One row of a score breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreRow<N> {
    /// Unit or weapon type the row describes.
    pub name: N,
    /// Number of kills or shots.
    pub count: u32,
    /// Points earned by those kills or shots.
    pub score: u32,
}

/// Score accumulated during a single round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundScore {
    kills: BTreeMap<UnitTypeName, u32>,
    shots: BTreeMap<WeaponTypeName, u32>,
    start: Duration,
    end: Option<Duration>,
}

impl RoundScore {
    /// Creates an empty score for a round starting at `start`.
    #[must_use]
    pub fn new(start: Duration) -> Self {
        Self {
            kills: BTreeMap::new(),
            shots: BTreeMap::new(),
            start,
            end: None,
        }
    }

    /// Counts a kill of the provided unit type.
    pub fn record_kill(&mut self, unit_type: UnitTypeName) {
        *self.kills.entry(unit_type).or_insert(0) += 1;
    }

    /// Counts a shot fired with the provided weapon type.
    pub fn record_shot(&mut self, weapon: WeaponTypeName) {
        *self.shots.entry(weapon).or_insert(0) += 1;
    }

    /// Number of kills of a unit type.
    #[must_use]
    pub fn kills(&self, unit_type: UnitTypeName) -> u32 {
        self.kills.get(&unit_type).copied().unwrap_or(0)
    }

    /// Number of shots fired with a weapon type.
    #[must_use]
    pub fn shots(&self, weapon: WeaponTypeName) -> u32 {
        self.shots.get(&weapon).copied().unwrap_or(0)
    }

    /// Total kills across every unit type.
    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.kills.values().sum()
    }

    /// Total shots across every weapon type.
    #[must_use]
    pub fn total_shots(&self) -> u32 {
        self.shots.values().sum()
    }

    /// Points earned by kills of a unit type.
    #[must_use]
    pub fn kills_score(&self, unit_type: UnitTypeName) -> u32 {
        self.kills(unit_type) * unit_type.unit_type().score
    }

    /// Points earned by shots of a weapon type.
    #[must_use]
    pub fn shots_score(&self, weapon: WeaponTypeName) -> u32 {
        self.shots(weapon) * weapon.weapon_type().score
    }

    /// Points earned by every kill.
    #[must_use]
    pub fn total_kills_score(&self) -> u32 {
        UnitTypeName::ALL.iter().map(|name| self.kills_score(*name)).sum()
    }

    /// Points earned by every shot.
    #[must_use]
    pub fn total_shots_score(&self) -> u32 {
        WeaponTypeName::ALL.iter().map(|name| self.shots_score(*name)).sum()
    }

    /// Kill breakdown for enemy types, sorted by ascending count.
    #[must_use]
    pub fn kill_rows(&self) -> Vec<ScoreRow<UnitTypeName>> {
        let mut rows: Vec<_> = UnitTypeName::ALL
            .into_iter()
            .filter(|name| *name != UnitTypeName::Prey)
            .map(|name| ScoreRow {
                name,
                count: self.kills(name),
                score: self.kills_score(name),
            })
            .collect();
        rows.sort_by_key(|row| row.count);
        rows
    }

    /// Shot breakdown for player weapons, sorted by ascending count.
    #[must_use]
    pub fn shot_rows(&self) -> Vec<ScoreRow<WeaponTypeName>> {
        let mut rows: Vec<_> = WeaponTypeName::ALL
            .into_iter()
            .filter(|name| *name != WeaponTypeName::AnimalMelee)
            .map(|name| ScoreRow {
                name,
                count: self.shots(name),
                score: self.shots_score(name),
            })
            .collect();
        rows.sort_by_key(|row| row.count);
        rows
    }

    /// Marks the round as finished at `now`; later calls keep the first end.
    pub fn finish(&mut self, now: Duration) {
        if self.end.is_none() {
            self.end = Some(now);
        }
    }

    /// Reports whether the round has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Time the round lasted, or has lasted so far at `now`.
    #[must_use]
    pub fn duration(&self, now: Duration) -> Duration {
        self.end.unwrap_or(now).saturating_sub(self.start)
    }

    /// One point per whole second survived.
    #[must_use]
    pub fn duration_score(&self, now: Duration) -> u32 {
        u32::try_from(self.duration(now).as_secs()).unwrap_or(u32::MAX)
    }

    /// Kills, shots and survival points combined.
    #[must_use]
    pub fn total_score(&self, now: Duration) -> u32 {
        self.total_kills_score()
            .saturating_add(self.total_shots_score())
            .saturating_add(self.duration_score(now))
    }
}

/// Failures reported by loadout and upgrade management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    /// The weapon must be unlocked first.
    #[error("{0:?} is still locked")]
    WeaponLocked(WeaponTypeName),
    /// The weapon was already unlocked.
    #[error("{0:?} is already unlocked")]
    AlreadyUnlocked(WeaponTypeName),
    /// The weapon cannot be carried by the player.
    #[error("{0:?} is not available to the player")]
    NotPlayerWeapon(WeaponTypeName),
    /// The weapon offers no upgrade for the stat.
    #[error("{weapon:?} has no {stat:?} upgrade")]
    NoSuchUpgrade {
        /// Weapon that was asked about.
        weapon: WeaponTypeName,
        /// Stat that was asked about.
        stat: WeaponStat,
    },
    /// Every stack of the upgrade was already purchased.
    #[error("{weapon:?} {stat:?} is maxed out")]
    MaxedOut {
        /// Weapon that was asked about.
        weapon: WeaponTypeName,
        /// Stat that was asked about.
        stat: WeaponStat,
    },
    /// Not enough spendable points.
    #[error("requires {required} points but only {available} are available")]
    InsufficientPoints {
        /// Points the purchase costs.
        required: u32,
        /// Points currently spendable.
        available: u32,
    },
    /// The loadout has no slot with the provided index.
    #[error("loadout has no slot {0}")]
    NoSuchSlot(usize),
}

/// Score and progression persisted across rounds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameScore {
    round_scores: Vec<RoundScore>,
    difficulty: f32,
    spendable_points: u32,
    unlocked_weapons: BTreeSet<WeaponTypeName>,
    weapon_slots: [Option<WeaponTypeName>; WEAPON_SLOTS],
    weapon_upgrades: BTreeMap<WeaponTypeName, UpgradeLevels>,
}

impl Default for GameScore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameScore {
    /// Fresh campaign with the bat unlocked and equipped in the first slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            round_scores: Vec::new(),
            difficulty: 1.0,
            spendable_points: 0,
            unlocked_weapons: BTreeSet::from([WeaponTypeName::Bat]),
            weapon_slots: [Some(WeaponTypeName::Bat), None],
            weapon_upgrades: BTreeMap::new(),
        }
    }

    /// Opens a new round and scales the difficulty by `carryover`.
    ///
    /// Returns the zero-based index of the new round.
    pub fn start_round(&mut self, now: Duration, carryover: f32) -> usize {
        self.difficulty *= carryover;
        self.round_scores.push(RoundScore::new(now));
        self.round_scores.len() - 1
    }

    /// Closes the current round and awards its total as spendable points.
    ///
    /// Returns the round's total score, or `None` when no round is open.
    pub fn end_round(&mut self, now: Duration) -> Option<u32> {
        let round = self.round_scores.last_mut()?;
        if round.is_finished() {
            return None;
        }
        round.finish(now);
        let total = round.total_score(now);
        self.spendable_points = self.spendable_points.saturating_add(total);
        Some(total)
    }

    /// Score of the most recent round.
    #[must_use]
    pub fn current_round(&self) -> Option<&RoundScore> {
        self.round_scores.last()
    }

    /// Mutable score of the most recent round.
    pub fn current_round_mut(&mut self) -> Option<&mut RoundScore> {
        self.round_scores.last_mut()
    }

    /// Every round played so far, oldest first.
    #[must_use]
    pub fn round_scores(&self) -> &[RoundScore] {
        &self.round_scores
    }

    /// Multiplier applied to enemy population targets.
    #[must_use]
    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Raises the difficulty by `step`.
    pub fn raise_difficulty(&mut self, step: f32) {
        self.difficulty += step;
    }

    /// Points available for unlocks and upgrades.
    #[must_use]
    pub fn spendable_points(&self) -> u32 {
        self.spendable_points
    }

    /// Adds spendable points outside of round scoring.
    pub fn grant_points(&mut self, points: u32) {
        self.spendable_points = self.spendable_points.saturating_add(points);
    }

    /// Reports whether the weapon may be placed in a slot.
    #[must_use]
    pub fn is_unlocked(&self, weapon: WeaponTypeName) -> bool {
        self.unlocked_weapons.contains(&weapon)
    }

    /// Spends points to unlock a weapon.
    pub fn unlock_weapon(&mut self, weapon: WeaponTypeName) -> Result<(), ScoringError> {
        if weapon == WeaponTypeName::AnimalMelee {
            return Err(ScoringError::NotPlayerWeapon(weapon));
        }
        if self.is_unlocked(weapon) {
            return Err(ScoringError::AlreadyUnlocked(weapon));
        }
        self.spend(weapon.weapon_type().unlock_cost)?;
        let _ = self.unlocked_weapons.insert(weapon);
        Ok(())
    }

    /// Loadout slots, in slot order.
    #[must_use]
    pub fn weapon_slots(&self) -> &[Option<WeaponTypeName>] {
        &self.weapon_slots
    }

    /// Places an unlocked weapon in a slot, or clears the slot with `None`.
    pub fn assign_slot(
        &mut self,
        slot: usize,
        weapon: Option<WeaponTypeName>,
    ) -> Result<(), ScoringError> {
        if let Some(weapon) = weapon {
            if !self.is_unlocked(weapon) {
                return Err(ScoringError::WeaponLocked(weapon));
            }
        }
        let entry = self
            .weapon_slots
            .get_mut(slot)
            .ok_or(ScoringError::NoSuchSlot(slot))?;
        *entry = weapon;
        Ok(())
    }

    /// Upgrade levels purchased for a weapon.
    #[must_use]
    pub fn upgrade_levels(&self, weapon: WeaponTypeName) -> &UpgradeLevels {
        self.weapon_upgrades.get(&weapon).unwrap_or(&NO_UPGRADES)
    }

    /// Buys one stack of an upgrade and returns the new level.
    pub fn purchase_upgrade(
        &mut self,
        weapon: WeaponTypeName,
        stat: WeaponStat,
    ) -> Result<u32, ScoringError> {
        if !self.is_unlocked(weapon) {
            return Err(ScoringError::WeaponLocked(weapon));
        }
        let upgrade = weapon
            .upgrade(stat)
            .ok_or(ScoringError::NoSuchUpgrade { weapon, stat })?;
        if self.upgrade_levels(weapon).level(stat) >= upgrade.max_stacks {
            return Err(ScoringError::MaxedOut { weapon, stat });
        }
        self.spend(upgrade.cost)?;
        Ok(self
            .weapon_upgrades
            .entry(weapon)
            .or_default()
            .increment(stat))
    }

    fn spend(&mut self, cost: u32) -> Result<(), ScoringError> {
        if cost > self.spendable_points {
            return Err(ScoringError::InsufficientPoints {
                required: cost,
                available: self.spendable_points,
            });
        }
        self.spendable_points -= cost;
        Ok(())
    }
}
