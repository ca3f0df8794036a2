//! Turns adapter input edges into orders for the player unit.

use prey_arena_core::{
    ActorAlias, ActorId, ActorKind, Direction, InputFrame, InputKey, Message, MessageRoutingRules,
    OrderKind,
};
use tracing::trace;

use crate::{
    actor::{drain_mailbox, Actor},
    context::Context,
    ActorDirectory, WorldError,
};

/// Tracks held direction keys and forwards commands to the player unit.
#[derive(Debug)]
pub struct InputActor {
    id: ActorId,
    pending: Option<InputFrame>,
    held: Vec<Direction>,
    current: Option<Direction>,
}

impl InputActor {
    /// Registers the input actor under its alias.
    pub(crate) fn spawn(directory: &mut ActorDirectory) -> ActorId {
        let id = directory.register(ActorKind::Input);
        directory.register_alias(ActorAlias::InputActor, id);
        let input = Self {
            id,
            pending: None,
            held: Vec::new(),
            current: None,
        };
        directory.checkin(id, Actor::Input(input));
        id
    }

    /// Actor identifier.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Direction the player unit was last told to move in.
    #[must_use]
    pub fn current_direction(&self) -> Option<Direction> {
        self.current
    }

    /// Stores the edges to process on the next update.
    pub(crate) fn set_frame(&mut self, frame: InputFrame) {
        self.pending = Some(frame);
    }

    pub(crate) fn update(&mut self, ctx: &mut Context<'_>) -> Result<(), WorldError> {
        drain_mailbox(self.id, ctx, |_, _| Ok(()))?;

        let frame = self.pending.take().unwrap_or_default();
        for key in &frame.released {
            if let Some(direction) = direction_of(*key) {
                self.held.retain(|held| *held != direction);
            }
        }
        for key in &frame.pressed {
            if let Some(direction) = direction_of(*key) {
                if !self.held.contains(&direction) {
                    self.held.push(direction);
                }
            }
        }

        let Some(unit) = ctx.directory.alias(ActorAlias::PlayerUnitActor) else {
            self.current = None;
            return Ok(());
        };

        let direction = self.resolve_direction();
        if direction != self.current {
            self.current = direction;
            let order = match direction {
                Some(direction) => OrderKind::MoveInDirection { direction },
                None => OrderKind::StopMoving,
            };
            trace!(?order, "movement input");
            issue(ctx, unit, order);
        }

        if let Some(target) = frame.attack_target {
            issue(ctx, unit, OrderKind::Attack { target });
        }
        for key in &frame.pressed {
            match key {
                InputKey::Reload => issue(ctx, unit, OrderKind::Reload),
                InputKey::CycleWeapon => ctx.publish(
                    Message::CycleEquippedWeapon,
                    MessageRoutingRules::to_actor(unit),
                ),
                InputKey::EquipSlot(slot) => {
                    let weapon = ctx.score.weapon_slots().get(*slot).copied().flatten();
                    if let Some(weapon) = weapon {
                        issue(ctx, unit, OrderKind::EquipWeapon { weapon });
                    }
                }
                InputKey::Up | InputKey::Left | InputKey::Down | InputKey::Right => {}
            }
        }
        Ok(())
    }

    /// Newest held direction, combined with the most recent perpendicular
    /// key still held beneath it.
    fn resolve_direction(&self) -> Option<Direction> {
        let (last, rest) = self.held.split_last()?;
        let combo = rest
            .iter()
            .rev()
            .find_map(|earlier| last.combine(*earlier));
        Some(combo.unwrap_or(*last))
    }
}

fn direction_of(key: InputKey) -> Option<Direction> {
    match key {
        InputKey::Up => Some(Direction::Up),
        InputKey::Left => Some(Direction::Left),
        InputKey::Down => Some(Direction::Down),
        InputKey::Right => Some(Direction::Right),
        InputKey::Reload | InputKey::CycleWeapon | InputKey::EquipSlot(_) => None,
    }
}

fn issue(ctx: &mut Context<'_>, unit: ActorId, order: OrderKind) {
    ctx.publish(
        Message::IssueOrder { order },
        MessageRoutingRules::to_actor(unit),
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Game, Order, WorldConfig};
    use prey_arena_core::{Event, Vec2, WeaponTypeName};

    const FRAME: Duration = Duration::from_millis(16);

    fn calm_game() -> Game {
        let mut game = Game::new(WorldConfig {
            enemy_targets: Default::default(),
            ..WorldConfig::default()
        })
        .expect("valid config");
        let _ = game.start_round();
        game
    }

    fn head_order(game: &Game) -> Option<OrderKind> {
        let unit = game.directory().alias(ActorAlias::PlayerUnitActor)?;
        game.directory()
            .unit(unit)?
            .orders()
            .front()
            .map(Order::kind)
            .cloned()
    }

    fn moving(direction: Direction) -> Option<OrderKind> {
        Some(OrderKind::MoveInDirection { direction })
    }

    #[test]
    fn held_keys_combine_into_diagonals() {
        let mut game = calm_game();

        game.update(FRAME, &InputFrame::pressing([InputKey::Up]))
            .expect("up");
        assert_eq!(head_order(&game), moving(Direction::Up));

        game.update(FRAME, &InputFrame::pressing([InputKey::Left]))
            .expect("left");
        assert_eq!(head_order(&game), moving(Direction::UpLeft));

        game.update(FRAME, &InputFrame::releasing([InputKey::Up]))
            .expect("release up");
        assert_eq!(head_order(&game), moving(Direction::Left));

        game.update(FRAME, &InputFrame::releasing([InputKey::Left]))
            .expect("release left");
        assert_eq!(head_order(&game), None);
    }

    #[test]
    fn opposite_keys_fall_back_to_the_newest() {
        let mut game = calm_game();
        game.update(FRAME, &InputFrame::pressing([InputKey::Up, InputKey::Down]))
            .expect("frame");
        assert_eq!(head_order(&game), moving(Direction::Down));

        game.update(FRAME, &InputFrame::pressing([InputKey::Right]))
            .expect("frame");
        assert_eq!(head_order(&game), moving(Direction::DownRight));
    }

    #[test]
    fn clicking_fires_the_equipped_weapon() {
        let mut game = calm_game();
        let _ = game.drain_events();

        game.update(FRAME, &InputFrame::attacking(Vec2::new(1.0, 0.0)))
            .expect("frame");

        assert!(game.drain_events().iter().any(|event| matches!(
            event,
            Event::WeaponFired {
                weapon_type: WeaponTypeName::Bat,
                ..
            }
        )));
    }
}
