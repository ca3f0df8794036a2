//! Registry of live actors, their mailboxes and their aliases.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use prey_arena_core::{ActorAlias, ActorId, ActorKind, Message};
use tracing::trace;

use crate::{
    actor::Actor, EnemyActor, InputActor, PathingActor, PlayerActor, UnitActor, WeaponActor,
    WorldActor, WorldError,
};

#[derive(Debug)]
struct ActorRecord {
    kind: ActorKind,
    mailbox: VecDeque<Message>,
    state: Option<Actor>,
}

/// Registry mapping actor identifiers to their state and mailboxes.
///
/// An actor's mailbox lives in the directory rather than in its state so that
/// messages can be enqueued while the actor itself is checked out for an
/// update. Identifiers are never reused within a directory.
#[derive(Debug, Default)]
pub struct ActorDirectory {
    records: BTreeMap<ActorId, ActorRecord>,
    aliases: HashMap<ActorAlias, ActorId>,
    kinds: BTreeMap<ActorKind, BTreeSet<ActorId>>,
    next_id: u32,
}

impl ActorDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an identifier for a new actor of `kind`.
    ///
    /// The record starts without state; the caller installs it with
    /// [`ActorDirectory::checkin`] once the actor knows its own id.
    pub(crate) fn register(&mut self, kind: ActorKind) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        let _ = self.records.insert(
            id,
            ActorRecord {
                kind,
                mailbox: VecDeque::new(),
                state: None,
            },
        );
        let _ = self.kinds.entry(kind).or_default().insert(id);
        trace!(actor = %id, ?kind, "registered actor");
        id
    }

    /// Points `alias` at an actor, replacing any previous holder.
    pub(crate) fn register_alias(&mut self, alias: ActorAlias, id: ActorId) {
        let _ = self.aliases.insert(alias, id);
    }

    /// Removes an actor together with its mailbox and every alias naming it.
    ///
    /// Returns `false` when the actor was not registered.
    pub(crate) fn unregister(&mut self, id: ActorId) -> bool {
        let Some(record) = self.records.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.kinds.get_mut(&record.kind) {
            let _ = ids.remove(&id);
        }
        self.aliases.retain(|_, holder| *holder != id);
        trace!(actor = %id, kind = ?record.kind, "unregistered actor");
        true
    }

    /// Unregisters every actor except the holders of the preserved aliases.
    ///
    /// Returns the number of actors removed.
    pub(crate) fn reset_actors(&mut self, preserve: &[ActorAlias]) -> usize {
        let kept: BTreeSet<ActorId> = preserve
            .iter()
            .filter_map(|alias| self.alias(*alias))
            .collect();
        let doomed: Vec<ActorId> = self
            .records
            .keys()
            .copied()
            .filter(|id| !kept.contains(id))
            .collect();
        for id in &doomed {
            let _ = self.unregister(*id);
        }
        doomed.len()
    }

    /// Reports whether the actor is registered.
    #[must_use]
    pub fn is_registered(&self, id: ActorId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of registered actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether no actor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every registered actor in ascending identifier order.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.records.keys().copied()
    }

    /// Kind of a registered actor.
    #[must_use]
    pub fn kind_of(&self, id: ActorId) -> Option<ActorKind> {
        self.records.get(&id).map(|record| record.kind)
    }

    /// Snapshot of the actors of a kind in ascending identifier order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: ActorKind) -> Vec<ActorId> {
        self.kinds
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Actor currently holding an alias.
    #[must_use]
    pub fn alias(&self, alias: ActorAlias) -> Option<ActorId> {
        self.aliases.get(&alias).copied()
    }

    /// Actor holding an alias that must exist.
    pub fn require_alias(&self, alias: ActorAlias) -> Result<ActorId, WorldError> {
        self.alias(alias).ok_or(WorldError::MissingAlias(alias))
    }

    /// Messages waiting in an actor's mailbox.
    #[must_use]
    pub fn mailbox(&self, id: ActorId) -> Option<&VecDeque<Message>> {
        self.records.get(&id).map(|record| &record.mailbox)
    }

    /// Enqueues a message; returns `false` when the actor is not registered.
    pub(crate) fn deliver(&mut self, id: ActorId, message: Message) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.mailbox.push_back(message);
                true
            }
            None => false,
        }
    }

    /// Takes the oldest message from an actor's mailbox.
    pub(crate) fn pop_message(&mut self, id: ActorId) -> Option<Message> {
        self.records.get_mut(&id)?.mailbox.pop_front()
    }

    /// Takes an actor's state out of the directory for an update.
    pub(crate) fn checkout(&mut self, id: ActorId) -> Option<Actor> {
        self.records.get_mut(&id)?.state.take()
    }

    /// Returns checked-out state; it is dropped when the actor was
    /// unregistered in the meantime.
    pub(crate) fn checkin(&mut self, id: ActorId, actor: Actor) {
        if let Some(record) = self.records.get_mut(&id) {
            record.state = Some(actor);
        }
    }

    fn state(&self, id: ActorId) -> Option<&Actor> {
        self.records.get(&id)?.state.as_ref()
    }

    fn state_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.records.get_mut(&id)?.state.as_mut()
    }

    /// Unit state, when the actor is a unit that is not mid-update.
    #[must_use]
    pub fn unit(&self, id: ActorId) -> Option<&UnitActor> {
        match self.state(id)? {
            Actor::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    pub(crate) fn unit_mut(&mut self, id: ActorId) -> Option<&mut UnitActor> {
        match self.state_mut(id)? {
            Actor::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Weapon state, when the actor is a weapon that is not mid-update.
    #[must_use]
    pub fn weapon(&self, id: ActorId) -> Option<&WeaponActor> {
        match self.state(id)? {
            Actor::Weapon(weapon) => Some(weapon),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn weapon_mut(&mut self, id: ActorId) -> Option<&mut WeaponActor> {
        match self.state_mut(id)? {
            Actor::Weapon(weapon) => Some(weapon),
            _ => None,
        }
    }

    /// Player actor registered under [`ActorAlias::PlayerActor`].
    #[must_use]
    pub fn player(&self) -> Option<&PlayerActor> {
        match self.state(self.alias(ActorAlias::PlayerActor)?)? {
            Actor::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Enemy director registered under [`ActorAlias::EnemyActor`].
    #[must_use]
    pub fn enemy(&self) -> Option<&EnemyActor> {
        match self.state(self.alias(ActorAlias::EnemyActor)?)? {
            Actor::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Sector streamer registered under [`ActorAlias::WorldActor`].
    #[must_use]
    pub fn world(&self) -> Option<&WorldActor> {
        match self.state(self.alias(ActorAlias::WorldActor)?)? {
            Actor::World(world) => Some(world),
            _ => None,
        }
    }

    /// Path service registered under [`ActorAlias::PathingActor`].
    #[must_use]
    pub fn pathing(&self) -> Option<&PathingActor> {
        match self.state(self.alias(ActorAlias::PathingActor)?)? {
            Actor::Pathing(pathing) => Some(pathing),
            _ => None,
        }
    }

    pub(crate) fn pathing_mut(&mut self) -> Option<&mut PathingActor> {
        let id = self.alias(ActorAlias::PathingActor)?;
        match self.state_mut(id)? {
            Actor::Pathing(pathing) => Some(pathing),
            _ => None,
        }
    }

    pub(crate) fn input_mut(&mut self) -> Option<&mut InputActor> {
        let id = self.alias(ActorAlias::InputActor)?;
        match self.state_mut(id)? {
            Actor::Input(input) => Some(input),
            _ => None,
        }
    }
}
