use std::time::Duration;

use prey_arena_core::{ActorAlias, ActorId, Message, MessageRoutingRules, Vec2};
use prey_arena_system_scoring::GameScore;

use crate::{actor::Actor, ActorDirectory, Engine, MessageBroker, WorldConfig};

/// Mutable view of the world handed to actors while they update.
pub(crate) struct Context<'a> {
    pub(crate) directory: &'a mut ActorDirectory,
    pub(crate) broker: &'a mut MessageBroker,
    pub(crate) engine: &'a mut Engine,
    pub(crate) score: &'a mut GameScore,
    pub(crate) config: &'a WorldConfig,
}

impl Context<'_> {
    /// Current simulation time.
    pub(crate) fn now(&self) -> Duration {
        self.engine.now()
    }

    /// Publishes a message; the recipient count is only interesting to tests.
    pub(crate) fn publish(&mut self, message: Message, rules: MessageRoutingRules) {
        let _ = self
            .broker
            .publish(self.directory, self.engine, message, &rules);
    }

    /// Publishes to whichever of the aliases are currently registered.
    pub(crate) fn publish_to_aliases(&mut self, message: Message, aliases: &[ActorAlias]) {
        let recipients: Vec<ActorId> = aliases
            .iter()
            .filter_map(|alias| self.directory.alias(*alias))
            .collect();
        if !recipients.is_empty() {
            self.publish(message, MessageRoutingRules::to(recipients));
        }
    }

    /// Asks the pathing actor for a route; `None` when there is no route or
    /// no pathing actor.
    pub(crate) fn find_path(&mut self, origin: Vec2, destination: Vec2) -> Option<Vec<Vec2>> {
        let engine = &*self.engine;
        self.directory
            .pathing_mut()?
            .get_path(origin, destination, engine)
    }

    /// Destroys an actor, cascading from units to their weapons and bodies.
    pub(crate) fn destroy_actor(&mut self, id: ActorId) {
        match self.directory.checkout(id) {
            Some(Actor::Unit(unit)) => unit.destroy(self),
            Some(_) | None => {
                let _ = self.directory.unregister(id);
            }
        }
    }
}
