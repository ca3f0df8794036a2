//! Rule-based message routing between actors.

use prey_arena_core::{ActorId, ActorKind, Message, MessageRoutingRules};
use tracing::trace;

use crate::{ActorDirectory, Engine};

/// Resolves routing rules against the directory and fills mailboxes.
///
/// Delivery is immediate: a recipient sees the message on its next drain,
/// which may still happen later in the current frame.
#[derive(Debug, Default)]
pub struct MessageBroker {
    published: u64,
    delivered: u64,
}

impl MessageBroker {
    /// Creates a broker with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `message` on every actor that passes `rules`.
    ///
    /// Returns the number of recipients.
    pub fn publish(
        &mut self,
        directory: &mut ActorDirectory,
        engine: &Engine,
        message: Message,
        rules: &MessageRoutingRules,
    ) -> usize {
        let recipients = Self::recipients(directory, engine, rules);
        for id in &recipients {
            let _ = directory.deliver(*id, message.clone());
        }

        self.published += 1;
        self.delivered += recipients.len() as u64;
        trace!(?message, recipients = recipients.len(), "published message");
        recipients.len()
    }

    /// Actors that would receive a message published with `rules`.
    ///
    /// Candidates come from the explicit id list when present, otherwise from
    /// the requested kind, otherwise from the units when segments are given,
    /// otherwise from every registered actor. Each supplied filter is then
    /// applied in turn. Rules without any filter select nobody.
    #[must_use]
    pub fn recipients(
        directory: &ActorDirectory,
        engine: &Engine,
        rules: &MessageRoutingRules,
    ) -> Vec<ActorId> {
        if rules.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<ActorId> = if let Some(ids) = &rules.actor_ids {
            let mut ids: Vec<ActorId> = ids
                .iter()
                .copied()
                .filter(|id| directory.is_registered(*id))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        } else if let Some(kind) = rules.actor_kind {
            directory.ids_of_kind(kind)
        } else if rules.intersecting.is_some() {
            directory.ids_of_kind(ActorKind::Unit)
        } else {
            directory.ids().collect()
        };

        if let Some(kind) = rules.actor_kind {
            candidates.retain(|id| directory.kind_of(*id) == Some(kind));
        }

        if let Some(segments) = &rules.intersecting {
            candidates.retain(|id| {
                engine.body(*id).is_some_and(|body| {
                    let footprint = body.footprint();
                    segments
                        .iter()
                        .any(|segment| footprint.intersects_segment(segment))
                })
            });
        }

        if let Some(excluded) = &rules.exclude_actor_ids {
            candidates.retain(|id| !excluded.contains(id));
        }

        candidates
    }

    /// Number of publish calls handled.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Number of mailbox deliveries performed.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
