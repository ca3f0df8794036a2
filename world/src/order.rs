//! Resumable orders that drive abilities and recover from failed checks.

use prey_arena_core::{ActorId, Message, MessageRoutingRules, OrderClass, OrderKind};
use tracing::{debug, warn};

use crate::{
    ability::{Ability, AbilityStage},
    context::Context,
    AbilityCheck, WorldError,
};

/// Lifecycle stage of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStage {
    /// Not yet started.
    Init,
    /// Driving its ability.
    InProgress,
    /// Driving a delegated child order.
    WaitingForChild,
    /// Finished; the unit drops it from its queue.
    Complete,
}

/// What an order does when its ability reports a failed check.
#[derive(Clone, Debug, PartialEq)]
enum FailurePolicy {
    /// Finish silently.
    Swallow,
    /// Run the checks again next frame.
    Retry,
    /// Run a child order until it completes, then retry.
    Delegate(OrderKind),
    /// Issue a new top-level order to the unit and finish.
    AutoChain(OrderKind),
}

fn failure_policy(kind: &OrderKind, check: &AbilityCheck) -> FailurePolicy {
    match (kind, check) {
        (OrderKind::Attack { .. }, AbilityCheck::WeaponClipNotEmpty { .. }) => {
            FailurePolicy::AutoChain(OrderKind::Reload)
        }
        (
            OrderKind::AttackUnit { .. },
            AbilityCheck::WeaponOffCooldown { .. } | AbilityCheck::WeaponClipNotEmpty { .. },
        ) => FailurePolicy::Retry,
        (OrderKind::AttackUnit { target }, AbilityCheck::UnitInRange { .. }) => {
            FailurePolicy::Delegate(OrderKind::MoveIntoAttackRange { target: *target })
        }
        (OrderKind::MoveInDirection { direction }, AbilityCheck::UnitFlag { .. }) => {
            FailurePolicy::Delegate(OrderKind::FaceDirection {
                direction: *direction,
            })
        }
        (
            OrderKind::StopMoving
            | OrderKind::FollowUnit { .. }
            | OrderKind::MoveIntoAttackRange { .. },
            AbilityCheck::UnitFlag { .. },
        ) => FailurePolicy::Retry,
        (OrderKind::Reload, AbilityCheck::WeaponOffCooldown { .. }) => FailurePolicy::Retry,
        _ => FailurePolicy::Swallow,
    }
}

/// Queued unit intent wrapping exactly one ability.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    kind: OrderKind,
    unit: ActorId,
    stage: OrderStage,
    ability: Option<Ability>,
    child: Option<Box<Order>>,
}

impl Order {
    /// Creates an order for `unit`; its ability is built when it starts.
    #[must_use]
    pub fn new(kind: OrderKind, unit: ActorId) -> Self {
        Self {
            kind,
            unit,
            stage: OrderStage::Init,
            ability: None,
            child: None,
        }
    }

    /// Intent of the order.
    #[must_use]
    pub fn kind(&self) -> &OrderKind {
        &self.kind
    }

    /// Unit carrying out the order.
    #[must_use]
    pub fn unit(&self) -> ActorId {
        self.unit
    }

    /// Queue discipline group.
    #[must_use]
    pub fn class(&self) -> OrderClass {
        self.kind.class()
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> OrderStage {
        self.stage
    }

    /// Reports whether the order finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stage == OrderStage::Complete
    }

    /// Live ability, once the order has started.
    #[must_use]
    pub fn ability(&self) -> Option<&Ability> {
        self.ability.as_ref()
    }

    /// Child order the order is waiting on.
    #[must_use]
    pub fn child(&self) -> Option<&Order> {
        self.child.as_deref()
    }

    /// Discards the ability and any child so the order starts over.
    pub fn reset_progress(&mut self) {
        self.stage = OrderStage::Init;
        self.ability = None;
        self.child = None;
    }

    /// Advances the order by one frame.
    pub(crate) fn try_to_progress(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<OrderStage, WorldError> {
        if self.stage == OrderStage::Init {
            self.ability = Some(Ability::create(self.kind.clone(), self.unit, &*ctx.directory));
            self.stage = OrderStage::InProgress;
        }

        match self.stage {
            OrderStage::InProgress => {
                if let Some(ability) = self.ability.as_mut() {
                    let stage = ability.try_to_progress(ctx)?;
                    self.handle_ability_progress(stage, ctx);
                }
            }
            OrderStage::WaitingForChild => {
                let finished = match self.child.as_mut() {
                    Some(child) => child.try_to_progress(ctx)? == OrderStage::Complete,
                    None => true,
                };
                if finished {
                    self.child = None;
                    if let Some(ability) = self.ability.as_mut() {
                        ability.reset_progress();
                    }
                    self.stage = OrderStage::InProgress;
                }
            }
            OrderStage::Init | OrderStage::Complete => {}
        }

        Ok(self.stage)
    }

    fn handle_ability_progress(&mut self, stage: AbilityStage, ctx: &mut Context<'_>) {
        match stage {
            AbilityStage::CheckFailed => {
                let Some(check) = self.ability.as_ref().and_then(Ability::failed_check).copied()
                else {
                    return;
                };
                self.handle_failed_check(&check, ctx);
            }
            AbilityStage::Complete => self.handle_completion(ctx),
            AbilityStage::Init
            | AbilityStage::Check
            | AbilityStage::Channel
            | AbilityStage::Apply => {}
        }
    }

    fn handle_failed_check(&mut self, check: &AbilityCheck, ctx: &mut Context<'_>) {
        if matches!(self.kind, OrderKind::AttackUnit { .. })
            && matches!(check, AbilityCheck::UnitHasWeaponEquipped { .. })
        {
            warn!(unit = %self.unit, "unit ordered to attack without an equipped weapon");
        }

        match failure_policy(&self.kind, check) {
            FailurePolicy::Swallow => self.stage = OrderStage::Complete,
            FailurePolicy::Retry => {
                if let Some(ability) = self.ability.as_mut() {
                    ability.reset_progress();
                }
            }
            FailurePolicy::Delegate(kind) => {
                debug!(unit = %self.unit, parent = ?self.kind, child = ?kind, "delegating order");
                self.child = Some(Box::new(Order::new(kind, self.unit)));
                self.stage = OrderStage::WaitingForChild;
            }
            FailurePolicy::AutoChain(kind) => {
                debug!(unit = %self.unit, follow_up = ?kind, "chaining order");
                ctx.publish(
                    Message::IssueOrder { order: kind },
                    MessageRoutingRules::to_actor(self.unit),
                );
                self.stage = OrderStage::Complete;
            }
        }
    }

    fn handle_completion(&mut self, ctx: &Context<'_>) {
        match self.kind.clone() {
            OrderKind::MoveInDirection { .. } | OrderKind::FollowUnit { .. } => {
                if let Some(ability) = self.ability.as_mut() {
                    ability.reset_progress();
                }
            }
            OrderKind::AttackUnit { .. } => self.reset_progress(),
            OrderKind::MoveIntoAttackRange { target } => {
                if self.target_in_range(target, ctx) {
                    self.stage = OrderStage::Complete;
                } else if let Some(ability) = self.ability.as_mut() {
                    ability.reset_progress();
                }
            }
            OrderKind::Attack { .. }
            | OrderKind::FaceDirection { .. }
            | OrderKind::StopMoving
            | OrderKind::Reload
            | OrderKind::EquipWeapon { .. } => self.stage = OrderStage::Complete,
        }
    }

    /// Reports whether the unit's equipped weapon reaches the target; a unit
    /// without a weapon counts as in range so the approach ends.
    fn target_in_range(&self, target: ActorId, ctx: &Context<'_>) -> bool {
        let range = ctx
            .directory
            .unit(self.unit)
            .and_then(|unit| unit.equipped_weapon())
            .and_then(|weapon| ctx.directory.weapon(weapon))
            .map(|weapon| weapon.stats().range);
        match range {
            Some(range) => AbilityCheck::UnitInRange {
                unit: self.unit,
                target,
                range,
            }
            .passes(&*ctx.directory, &*ctx.engine),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Game, UnitActor, WorldConfig};
    use prey_arena_core::{
        Direction, InputFrame, Team, UnitFlag, UnitTypeName, Vec2, WeaponTypeName,
    };

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

    fn progress(game: &mut Game, order: &mut Order) -> OrderStage {
        order
            .try_to_progress(&mut game.context())
            .expect("order progress")
    }

    fn count_mail(game: &Game, actor: ActorId, wanted: fn(&Message) -> bool) -> usize {
        game.directory()
            .mailbox(actor)
            .map_or(0, |mailbox| mailbox.iter().filter(|message| wanted(message)).count())
    }

    #[test]
    fn empty_clip_on_attack_chains_a_reload() {
        let policy = failure_policy(
            &OrderKind::Attack { target: Vec2::ONE },
            &AbilityCheck::WeaponClipNotEmpty {
                weapon: ActorId::new(2),
            },
        );
        assert_eq!(policy, FailurePolicy::AutoChain(OrderKind::Reload));
    }

    #[test]
    fn out_of_range_attacks_delegate_an_approach() {
        let target = ActorId::new(7);
        let policy = failure_policy(
            &OrderKind::AttackUnit { target },
            &AbilityCheck::UnitInRange {
                unit: ActorId::new(1),
                target,
                range: 1.0,
            },
        );
        assert_eq!(
            policy,
            FailurePolicy::Delegate(OrderKind::MoveIntoAttackRange { target })
        );
    }

    #[test]
    fn impacted_movement_turns_instead() {
        let policy = failure_policy(
            &OrderKind::MoveInDirection {
                direction: Direction::Left,
            },
            &AbilityCheck::UnitFlag {
                unit: ActorId::new(1),
                flag: UnitFlag::Impacted,
                expected: false,
            },
        );
        assert_eq!(
            policy,
            FailurePolicy::Delegate(OrderKind::FaceDirection {
                direction: Direction::Left
            })
        );
    }

    #[test]
    fn transient_conditions_are_retried() {
        let weapon = ActorId::new(3);
        let cooldown = AbilityCheck::WeaponOffCooldown { weapon };
        assert_eq!(
            failure_policy(&OrderKind::Reload, &cooldown),
            FailurePolicy::Retry
        );
        assert_eq!(
            failure_policy(
                &OrderKind::AttackUnit {
                    target: ActorId::new(9)
                },
                &cooldown
            ),
            FailurePolicy::Retry
        );
        assert_eq!(
            failure_policy(
                &OrderKind::StopMoving,
                &AbilityCheck::UnitFlag {
                    unit: ActorId::new(1),
                    flag: UnitFlag::Impacted,
                    expected: false,
                }
            ),
            FailurePolicy::Retry
        );
    }

    #[test]
    fn benign_failures_are_swallowed() {
        let unit = ActorId::new(1);
        assert_eq!(
            failure_policy(
                &OrderKind::Attack { target: Vec2::ZERO },
                &AbilityCheck::UnitHasWeaponEquipped { unit }
            ),
            FailurePolicy::Swallow
        );
        assert_eq!(
            failure_policy(
                &OrderKind::Reload,
                &AbilityCheck::WeaponClipNotFull { weapon: unit }
            ),
            FailurePolicy::Swallow
        );
        assert_eq!(
            failure_policy(
                &OrderKind::AttackUnit { target: unit },
                &AbilityCheck::UnitExists { unit }
            ),
            FailurePolicy::Swallow
        );
    }

    #[test]
    fn resetting_discards_ability_and_child() {
        let mut order = Order::new(OrderKind::StopMoving, ActorId::new(1));
        order.stage = OrderStage::WaitingForChild;
        order.child = Some(Box::new(Order::new(OrderKind::Reload, ActorId::new(1))));

        order.reset_progress();

        assert_eq!(order.stage(), OrderStage::Init);
        assert!(order.child().is_none());
        assert!(order.ability().is_none());
    }

    #[test]
    fn out_of_range_attacks_approach_then_resume() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (prey, _) = armed_prey(&mut game, WeaponTypeName::Bat);
        let pig = game.spawn_unit(UnitTypeName::Pig, Vec2::new(6.0, 0.0), Team::Enemy);
        let mut order = Order::new(OrderKind::AttackUnit { target: pig }, prey);

        assert_eq!(progress(&mut game, &mut order), OrderStage::WaitingForChild);
        assert_eq!(
            order.child().map(Order::kind),
            Some(&OrderKind::MoveIntoAttackRange { target: pig })
        );

        game.engine_mut().body_mut(pig).expect("pig body").position = Vec2::new(1.0, 0.0);

        assert_eq!(progress(&mut game, &mut order), OrderStage::InProgress);
        assert!(order.child().is_none());
        assert_eq!(
            order.ability().map(Ability::stage),
            Some(AbilityStage::Init)
        );
        assert_eq!(
            count_mail(&game, prey, |message| matches!(
                message,
                Message::ChangeVelocity { .. }
            )),
            1
        );
    }

    #[test]
    fn attacking_with_an_empty_clip_issues_a_reload() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (prey, pistol) = armed_prey(&mut game, WeaponTypeName::Pistol);
        game.directory_mut()
            .weapon_mut(pistol)
            .expect("pistol")
            .empty_clip();
        let mut order = Order::new(OrderKind::Attack { target: Vec2::X }, prey);

        assert_eq!(progress(&mut game, &mut order), OrderStage::Complete);
        assert!(game
            .directory()
            .mailbox(prey)
            .expect("prey mailbox")
            .contains(&Message::IssueOrder {
                order: OrderKind::Reload
            }));
        assert_eq!(
            count_mail(&game, pistol, |message| matches!(
                message,
                Message::FireWeapon { .. }
            )),
            0
        );
    }

    #[test]
    fn attack_unit_starts_over_after_every_swing() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let (prey, bat) = armed_prey(&mut game, WeaponTypeName::Bat);
        let pig = game.spawn_unit(UnitTypeName::Pig, Vec2::new(1.0, 0.0), Team::Enemy);
        let mut order = Order::new(OrderKind::AttackUnit { target: pig }, prey);
        let fired = |message: &Message| matches!(message, Message::FireWeapon { .. });

        assert_eq!(progress(&mut game, &mut order), OrderStage::Init);
        assert!(order.ability().is_none());
        assert_eq!(count_mail(&game, bat, fired), 1);

        assert_eq!(progress(&mut game, &mut order), OrderStage::Init);
        assert!(!order.is_complete());
        assert_eq!(count_mail(&game, bat, fired), 2);
    }

    #[test]
    fn following_steers_again_every_frame() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let prey = game.spawn_unit(UnitTypeName::Prey, Vec2::ZERO, Team::Player);
        let pig = game.spawn_unit(UnitTypeName::Pig, Vec2::new(5.0, 0.0), Team::Enemy);
        let mut order = Order::new(OrderKind::FollowUnit { target: prey }, pig);

        for _ in 0..3 {
            assert_eq!(progress(&mut game, &mut order), OrderStage::InProgress);
        }

        assert_eq!(
            count_mail(&game, pig, |message| matches!(
                message,
                Message::ChangeVelocity { .. }
            )),
            3
        );
    }

    #[test]
    fn following_a_missing_unit_gives_up() {
        let mut game = Game::new(WorldConfig::default()).expect("valid config");
        let pig = game.spawn_unit(UnitTypeName::Pig, Vec2::new(5.0, 0.0), Team::Enemy);
        let mut order = Order::new(
            OrderKind::FollowUnit {
                target: ActorId::new(9_999),
            },
            pig,
        );

        assert_eq!(progress(&mut game, &mut order), OrderStage::Complete);
    }
}
