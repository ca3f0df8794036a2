//! Scripted stand-in for a human player.

use prey_arena_core::{InputFrame, InputKey, Vec2};
use prey_arena_world::{query, Game};

/// Fraction of the weapon range the autopilot closes to before stopping.
const ENGAGE_RANGE: f32 = 0.8;
/// Frames between attack clicks.
const ATTACK_INTERVAL: u64 = 6;
/// Share of the heading a component needs before its key is held.
const AXIS_THRESHOLD: f32 = 0.38;

/// Walks the prey toward the nearest enemy and clicks on it once in reach.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    held: Vec<InputKey>,
    frame: u64,
}

impl Autopilot {
    /// Input edges for the next frame.
    pub(crate) fn next_frame(&mut self, game: &Game) -> InputFrame {
        self.frame += 1;
        let Some(player) = query::player_unit(game) else {
            return self.hold(Vec::new());
        };
        let Some(enemy) = query::nearest_enemy(game, player.position) else {
            return self.hold(Vec::new());
        };

        let reach = player
            .equipped_weapon
            .map_or(0.0, |weapon| weapon.range * ENGAGE_RANGE);
        let offset = enemy.position - player.position;
        let in_reach = offset.length() <= reach;

        let mut frame = if in_reach {
            self.hold(Vec::new())
        } else {
            self.hold(keys_toward(offset))
        };
        if in_reach && self.frame % ATTACK_INTERVAL == 0 {
            frame.attack_target = Some(enemy.position);
        }
        frame
    }

    /// Presses and releases keys so that exactly `wanted` is held.
    fn hold(&mut self, wanted: Vec<InputKey>) -> InputFrame {
        let released: Vec<InputKey> = self
            .held
            .iter()
            .copied()
            .filter(|key| !wanted.contains(key))
            .collect();
        let pressed: Vec<InputKey> = wanted
            .iter()
            .copied()
            .filter(|key| !self.held.contains(key))
            .collect();
        self.held = wanted;
        InputFrame {
            pressed,
            released,
            attack_target: None,
        }
    }
}

fn keys_toward(offset: Vec2) -> Vec<InputKey> {
    let heading = offset.normalize_or_zero();
    let mut keys = Vec::new();
    if heading.x > AXIS_THRESHOLD {
        keys.push(InputKey::Right);
    } else if heading.x < -AXIS_THRESHOLD {
        keys.push(InputKey::Left);
    }
    if heading.y > AXIS_THRESHOLD {
        keys.push(InputKey::Up);
    } else if heading.y < -AXIS_THRESHOLD {
        keys.push(InputKey::Down);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_map_to_held_keys() {
        assert_eq!(keys_toward(Vec2::new(3.0, 0.1)), vec![InputKey::Right]);
        assert_eq!(
            keys_toward(Vec2::new(-2.0, -2.0)),
            vec![InputKey::Left, InputKey::Down]
        );
        assert!(keys_toward(Vec2::ZERO).is_empty());
    }

    #[test]
    fn only_key_changes_are_reported() {
        let mut autopilot = Autopilot::default();

        let first = autopilot.hold(vec![InputKey::Up, InputKey::Left]);
        assert_eq!(first.pressed, vec![InputKey::Up, InputKey::Left]);
        assert!(first.released.is_empty());

        let second = autopilot.hold(vec![InputKey::Left]);
        assert!(second.pressed.is_empty());
        assert_eq!(second.released, vec![InputKey::Up]);

        let third = autopilot.hold(Vec::new());
        assert_eq!(third.released, vec![InputKey::Left]);
    }
}
