//! Live, incrementally maintained entity sets.
//!
//! A [`Subscription`] pairs a [`Filter`] with the set of live entities that
//! currently match it. The world owns every subscription in a
//! [`SubscriptionIndex`], which also keeps a reverse index from component kind
//! to the subscriptions whose filter mentions that kind. A component mutation
//! therefore re-tests the mutated entity against the handful of subscriptions
//! that could care, never the whole list and never the whole world.

use std::collections::{BTreeSet, HashMap};

use cinder_component::{ComponentTypeId, Entity, Filter};

/// Handle to a subscription owned by a [`World`](crate::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) usize);

impl SubscriptionId {
    /// Position of the subscription in registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A filter plus the entities that currently satisfy it.
///
/// Iteration is in ascending entity order.
#[derive(Debug, Clone)]
pub struct Subscription {
    filter: Filter,
    entities: BTreeSet<Entity>,
}

impl Subscription {
    /// The filter this subscription tracks.
    #[must_use]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Returns `true` if `entity` currently matches.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Number of matching entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if nothing matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over matching entities.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Copy the matching entities out, so the caller can mutate the world
    /// while walking them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Entity> {
        self.entities.iter().copied().collect()
    }

    fn apply(&mut self, entity: Entity, matched: bool) {
        if matched {
            self.entities.insert(entity);
        } else {
            self.entities.remove(&entity);
        }
    }
}

/// Every subscription in a world plus the kind → subscription reverse index.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionIndex {
    subscriptions: Vec<Subscription>,
    by_kind: HashMap<ComponentTypeId, Vec<SubscriptionId>>,
    /// Subscriptions an entity with no components satisfies.
    match_empty: Vec<SubscriptionId>,
}

impl SubscriptionIndex {
    /// Register `filter`, seeded with `seed` (the entities that match it right
    /// now).
    pub(crate) fn insert(
        &mut self,
        filter: Filter,
        seed: impl IntoIterator<Item = Entity>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.subscriptions.len());
        for kind in filter.kinds() {
            self.by_kind.entry(kind).or_default().push(id);
        }
        if filter.matches_empty() {
            self.match_empty.push(id);
        }
        self.subscriptions.push(Subscription {
            filter,
            entities: seed.into_iter().collect(),
        });
        id
    }

    /// Look up a filter already registered here.
    pub(crate) fn find(&self, filter: &Filter) -> Option<SubscriptionId> {
        self.subscriptions
            .iter()
            .position(|s| &s.filter == filter)
            .map(SubscriptionId)
    }

    pub(crate) fn get(&self, id: SubscriptionId) -> &Subscription {
        &self.subscriptions[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Re-test `entity` against the subscriptions that mention `kind`.
    /// `has` reports the entity's current component set.
    pub(crate) fn refresh(
        &mut self,
        kind: ComponentTypeId,
        entity: Entity,
        has: impl Fn(ComponentTypeId) -> bool,
    ) {
        let Some(interested) = self.by_kind.get(&kind) else {
            return;
        };
        for id in interested {
            let sub = &mut self.subscriptions[id.0];
            let matched = sub.filter.matches(&has);
            sub.apply(entity, matched);
        }
    }

    /// Admit a freshly created, component-less entity.
    pub(crate) fn admit(&mut self, entity: Entity) {
        for id in &self.match_empty {
            self.subscriptions[id.0].entities.insert(entity);
        }
    }

    /// Drop `entity` from every subscription.
    pub(crate) fn evict(&mut self, entity: Entity) {
        for sub in &mut self.subscriptions {
            sub.entities.remove(&entity);
        }
    }
}
