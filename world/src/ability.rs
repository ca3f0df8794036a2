//! Single-cast actions guarded by checks and an optional channel delay.

use std::time::Duration;

use prey_arena_core::{
    ActorId, Message, MessageRoutingRules, OrderKind, UnitFlag, Vec2,
};
use tracing::debug;

use crate::{
    check::first_failed_check, context::Context, AbilityCheck, ActorDirectory, WorldError,
};

const EQUIP_CHANNEL: Duration = Duration::from_millis(150);

/// Lifecycle stage of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityStage {
    /// Not yet started.
    Init,
    /// Evaluating the checks.
    Check,
    /// A check failed; the owning order decides what happens next.
    CheckFailed,
    /// Waiting for the channel duration to elapse.
    Channel,
    /// Applying the effect.
    Apply,
    /// Finished; only a reset starts it again.
    Complete,
}

/// Atomic action driven by an order.
///
/// The check list is built once, at creation, from the caster's live state
/// such as the weapon it has equipped at that moment.
#[derive(Clone, Debug, PartialEq)]
pub struct Ability {
    kind: OrderKind,
    caster: ActorId,
    stage: AbilityStage,
    checks: Vec<AbilityCheck>,
    failed_check: Option<usize>,
    channel_duration: Duration,
    channel_start: Option<Duration>,
    weapon: Option<ActorId>,
}

impl Ability {
    /// Builds the ability for `kind` cast by `caster`.
    pub(crate) fn create(kind: OrderKind, caster: ActorId, directory: &ActorDirectory) -> Self {
        let weapon = directory
            .unit(caster)
            .and_then(|unit| unit.equipped_weapon())
            .filter(|weapon| directory.weapon(*weapon).is_some());
        let checks = build_checks(&kind, caster, weapon, directory);
        let channel_duration = match kind {
            OrderKind::EquipWeapon { .. } => EQUIP_CHANNEL,
            _ => Duration::ZERO,
        };

        Self {
            kind,
            caster,
            stage: AbilityStage::Init,
            checks,
            failed_check: None,
            channel_duration,
            channel_start: None,
            weapon,
        }
    }

    /// Action the ability performs.
    #[must_use]
    pub fn kind(&self) -> &OrderKind {
        &self.kind
    }

    /// Unit casting the ability.
    #[must_use]
    pub fn caster(&self) -> ActorId {
        self.caster
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> AbilityStage {
        self.stage
    }

    /// Checks evaluated before the effect applies, in evaluation order.
    #[must_use]
    pub fn checks(&self) -> &[AbilityCheck] {
        &self.checks
    }

    /// Check that failed during the most recent check pass.
    #[must_use]
    pub fn failed_check(&self) -> Option<&AbilityCheck> {
        self.checks.get(self.failed_check?)
    }

    /// Cast time between passing the checks and applying the effect.
    #[must_use]
    pub fn channel_duration(&self) -> Duration {
        self.channel_duration
    }

    /// Weapon captured when the ability was created.
    #[must_use]
    pub fn weapon(&self) -> Option<ActorId> {
        self.weapon
    }

    /// Returns the ability to [`AbilityStage::Init`].
    pub fn reset_progress(&mut self) {
        self.stage = AbilityStage::Init;
        self.failed_check = None;
        self.channel_start = None;
    }

    /// Advances through as many stages as the current state allows.
    ///
    /// Stops at [`AbilityStage::CheckFailed`], at an unfinished channel and at
    /// [`AbilityStage::Complete`]. The effect is applied at most once between
    /// resets.
    pub(crate) fn try_to_progress(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<AbilityStage, WorldError> {
        loop {
            match self.stage {
                AbilityStage::Init => self.stage = AbilityStage::Check,
                AbilityStage::Check => {
                    let directory = &*ctx.directory;
                    let engine = &*ctx.engine;
                    let failed =
                        first_failed_check(&self.checks, |check| check.passes(directory, engine));
                    if !directory.is_registered(self.caster) {
                        self.stage = AbilityStage::Complete;
                        continue;
                    }
                    match failed {
                        Some(index) => {
                            self.failed_check = Some(index);
                            self.stage = AbilityStage::CheckFailed;
                        }
                        None => self.stage = AbilityStage::Channel,
                    }
                }
                AbilityStage::CheckFailed => return Ok(AbilityStage::CheckFailed),
                AbilityStage::Channel => {
                    let now = ctx.now();
                    let started = *self.channel_start.get_or_insert(now);
                    if now.saturating_sub(started) < self.channel_duration {
                        return Ok(AbilityStage::Channel);
                    }
                    self.channel_start = None;
                    self.stage = AbilityStage::Apply;
                }
                AbilityStage::Apply => {
                    self.apply_effects(ctx)?;
                    self.stage = AbilityStage::Complete;
                }
                AbilityStage::Complete => return Ok(AbilityStage::Complete),
            }
        }
    }

    fn apply_effects(&self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        debug!(caster = %self.caster, kind = ?self.kind, "applying ability");
        let caster = MessageRoutingRules::to_actor(self.caster);

        match &self.kind {
            OrderKind::Attack { target } => {
                if let Some(weapon) = self.weapon {
                    ctx.publish(
                        Message::FireWeapon { target: *target },
                        MessageRoutingRules::to_actor(weapon),
                    );
                }
            }
            OrderKind::AttackUnit { target } => {
                let aim = ctx
                    .engine
                    .body(*target)
                    .ok_or(WorldError::MissingBody(*target))?
                    .position;
                if let Some(weapon) = self.weapon {
                    ctx.publish(
                        Message::FireWeapon { target: aim },
                        MessageRoutingRules::to_actor(weapon),
                    );
                }
            }
            OrderKind::MoveIntoAttackRange { target } | OrderKind::FollowUnit { target } => {
                let velocity = self.velocity_toward(*target, ctx)?;
                ctx.publish(
                    Message::ChangeVelocity {
                        velocity,
                        update_facing: true,
                    },
                    caster,
                );
            }
            OrderKind::MoveInDirection { direction } => {
                let speed = self.move_speed(ctx)?;
                ctx.publish(
                    Message::ChangeVelocity {
                        velocity: direction.unit_vector() * speed,
                        update_facing: true,
                    },
                    caster,
                );
            }
            OrderKind::FaceDirection { direction } => ctx.publish(
                Message::ChangeFacingAngle {
                    angle: direction.angle(),
                },
                caster,
            ),
            OrderKind::StopMoving => ctx.publish(
                Message::ChangeVelocity {
                    velocity: Vec2::ZERO,
                    update_facing: false,
                },
                caster,
            ),
            OrderKind::Reload => {
                if let Some(weapon) = self.weapon {
                    ctx.publish(Message::ReloadWeapon, MessageRoutingRules::to_actor(weapon));
                }
            }
            OrderKind::EquipWeapon { weapon } => {
                let owned = ctx.directory.unit(self.caster).and_then(|unit| {
                    unit.weapons().iter().copied().find(|owned| {
                        ctx.directory
                            .weapon(*owned)
                            .is_some_and(|owned| owned.weapon_type() == *weapon)
                    })
                });
                if let Some(owned) = owned {
                    ctx.publish(Message::EquipWeapon { weapon: owned }, caster);
                }
            }
        }
        Ok(())
    }

    fn move_speed(&self, ctx: &Context<'_>) -> Result<f32, WorldError> {
        ctx.directory
            .unit(self.caster)
            .map(|unit| unit.unit_type().move_speed)
            .ok_or(WorldError::MissingActor(self.caster))
    }

    /// Velocity that walks the caster one path node closer to the target.
    ///
    /// Falls back to a straight line when no route is known.
    fn velocity_toward(&self, target: ActorId, ctx: &mut Context<'_>) -> Result<Vec2, WorldError> {
        let speed = self.move_speed(ctx)?;
        let origin = ctx
            .engine
            .body(self.caster)
            .ok_or(WorldError::MissingBody(self.caster))?
            .position;
        let destination = ctx
            .engine
            .body(target)
            .ok_or(WorldError::MissingBody(target))?
            .position;

        let waypoint = match ctx.find_path(origin, destination) {
            Some(path) if path.len() > 1 => path[1],
            _ => destination,
        };
        Ok((waypoint - origin).normalize_or_zero() * speed)
    }
}

fn build_checks(
    kind: &OrderKind,
    caster: ActorId,
    weapon: Option<ActorId>,
    directory: &ActorDirectory,
) -> Vec<AbilityCheck> {
    let not_flagged = |flag| AbilityCheck::UnitFlag {
        unit: caster,
        flag,
        expected: false,
    };
    let equipped = AbilityCheck::UnitHasWeaponEquipped { unit: caster };

    match kind {
        OrderKind::Attack { .. } => {
            let mut checks = vec![not_flagged(UnitFlag::Dying), equipped];
            if let Some(weapon) = weapon {
                checks.push(AbilityCheck::WeaponOffCooldown { weapon });
                checks.push(AbilityCheck::WeaponClipNotEmpty { weapon });
            }
            checks
        }
        OrderKind::AttackUnit { target } => {
            let mut checks = vec![
                AbilityCheck::UnitExists { unit: *target },
                not_flagged(UnitFlag::Dying),
                equipped,
            ];
            if let Some(weapon) = weapon {
                checks.push(AbilityCheck::WeaponOffCooldown { weapon });
                checks.push(AbilityCheck::WeaponClipNotEmpty { weapon });
                if let Some(range) = directory.weapon(weapon).map(|w| w.stats().range) {
                    checks.push(AbilityCheck::UnitInRange {
                        unit: caster,
                        target: *target,
                        range,
                    });
                }
            }
            checks
        }
        OrderKind::MoveIntoAttackRange { target } => vec![
            AbilityCheck::UnitExists { unit: *target },
            not_flagged(UnitFlag::Impacted),
            equipped,
        ],
        OrderKind::FollowUnit { target } => vec![
            AbilityCheck::UnitExists { unit: *target },
            not_flagged(UnitFlag::Impacted),
        ],
        OrderKind::MoveInDirection { .. } | OrderKind::StopMoving => {
            vec![not_flagged(UnitFlag::Impacted)]
        }
        OrderKind::FaceDirection { .. } => Vec::new(),
        OrderKind::Reload => {
            let mut checks = vec![equipped];
            if let Some(weapon) = weapon {
                checks.push(AbilityCheck::WeaponOffCooldown { weapon });
                checks.push(AbilityCheck::WeaponClipNotFull { weapon });
                checks.push(AbilityCheck::WeaponNotReloading { weapon });
            }
            checks
        }
        OrderKind::EquipWeapon { weapon } => vec![AbilityCheck::UnitOwnsWeapon {
            unit: caster,
            weapon: *weapon,
        }],
    }
}
