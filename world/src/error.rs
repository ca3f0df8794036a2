use prey_arena_core::{ActorAlias, ActorId, ActorKind};
use thiserror::Error;

/// Invariant violations that abort the simulation.
///
/// Ability checks exist so that none of these occur in correct operation;
/// when one surfaces it is propagated out of [`crate::Game::update`] untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// A required actor is not registered.
    #[error("actor {0} is not registered")]
    MissingActor(ActorId),
    /// A required alias is not registered.
    #[error("no actor is registered as {0:?}")]
    MissingAlias(ActorAlias),
    /// An actor exists but has a different kind than required.
    #[error("actor {actor} is not a {expected:?} actor")]
    UnexpectedKind {
        /// Actor that was looked up.
        actor: ActorId,
        /// Kind the caller required.
        expected: ActorKind,
    },
    /// A unit has no body in the engine.
    #[error("unit {0} has no physics body")]
    MissingBody(ActorId),
    /// A weapon was fired with an empty clip.
    #[error("weapon {0} fired with an empty clip")]
    ClipEmpty(ActorId),
    /// A weapon was fired while on cooldown.
    #[error("weapon {0} fired while on cooldown")]
    WeaponOnCooldown(ActorId),
}
