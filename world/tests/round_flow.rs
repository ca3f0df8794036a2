use std::time::Duration;

use prey_arena_core::{Event, InputFrame, InputKey, Vec2};
use prey_arena_world::{query, Game, WorldConfig};

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn replaying_the_same_input_reproduces_the_round() {
    let first = replay(WorldConfig::default().with_seed(41));
    let second = replay(WorldConfig::default().with_seed(41));

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::WeaponFired { .. })));
}

#[test]
fn survival_time_becomes_spendable_points() {
    let mut game = Game::new(WorldConfig {
        enemy_targets: Default::default(),
        ..WorldConfig::default()
    })
    .expect("valid config");
    assert_eq!(game.start_round(), 0);

    // 125 frames of 16 ms make two seconds
    for _ in 0..125 {
        game.update(FRAME, &InputFrame::idle()).expect("frame");
    }
    let total = game.end_round().expect("round was running");

    assert_eq!(total, 2);
    assert_eq!(game.score().spendable_points(), 2);
    assert!(!game.is_round_active());
    assert!(query::units(&game).is_empty());
    assert!(game
        .drain_events()
        .contains(&Event::RoundEnded { round: 0, total_score: 2 }));
}

#[test]
fn carried_over_difficulty_shrinks_between_rounds() {
    let config = WorldConfig::default();
    let carryover = config.difficulty_carryover;
    let mut game = Game::new(config).expect("valid config");

    let _ = game.start_round();
    let first = game.score().difficulty();
    let _ = game.start_round();

    assert!((game.score().difficulty() - first * carryover).abs() < 1e-6);
    assert_eq!(game.score().round_scores().len(), 2);
    assert!(game.score().round_scores()[0].is_finished());
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    units: Vec<query::UnitSnapshot>,
    obstacles: usize,
}

fn replay(config: WorldConfig) -> ReplayOutcome {
    let mut game = Game::new(config).expect("valid config");
    let _ = game.start_round();

    let mut events = Vec::new();
    for frame in scripted_input() {
        game.update(FRAME, &frame).expect("frame");
        events.extend(game.drain_events());
    }

    ReplayOutcome {
        events,
        units: query::units(&game),
        obstacles: query::obstacle_footprints(&game).len(),
    }
}

fn scripted_input() -> Vec<InputFrame> {
    let mut frames = vec![InputFrame::pressing([InputKey::Right])];
    frames.extend((0..20).map(|_| InputFrame::idle()));
    frames.push(InputFrame::pressing([InputKey::Up]));
    frames.extend((0..20).map(|_| InputFrame::idle()));
    frames.push(InputFrame::releasing([InputKey::Right, InputKey::Up]));
    frames.push(InputFrame::attacking(Vec2::new(-1.0, 0.0)));
    frames.extend((0..40).map(|_| InputFrame::idle()));
    frames.push(InputFrame::pressing([InputKey::Reload]));
    frames.extend((0..20).map(|_| InputFrame::idle()));
    frames
}
