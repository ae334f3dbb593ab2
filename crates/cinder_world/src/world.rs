//! The component store.
//!
//! The [`World`] owns entity allocation, one [`ComponentMap`] per component
//! kind, every live subscription, the singleton resources, and the clock.
//! It is the only shared state in the engine; systems receive it by `&mut`
//! from the [`Scheduler`](crate::Scheduler) and never keep it between calls.
//!
//! ## Membership maintenance
//!
//! ```text
//! add_component / remove_component (kind K, entity E)
//!   └─ if E's presence of K changed:
//!        for each subscription S whose filter mentions K:
//!            S.contains(E) = S.filter.matches(kinds(E))
//! ```
//!
//! `add_subscription` is the only operation that scans every live entity.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use cinder_component::map::{downcast_mut, downcast_ref};
use cinder_component::{
    Component, ComponentMap, ComponentTypeId, Entity, EntityAllocator, ErasedMap, Filter,
};
use tracing::{debug, trace};

use crate::error::WorldError;
use crate::subscription::{Subscription, SubscriptionId, SubscriptionIndex};

/// The canonical entity/component state.
pub struct World {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Entities issued and not yet removed.
    alive: HashSet<Entity>,
    /// One type-erased map per component kind, created on first insert.
    maps: HashMap<ComponentTypeId, Box<dyn ErasedMap>>,
    /// Live subscriptions and the kind → subscription index.
    subscriptions: SubscriptionIndex,
    /// Singleton values not tied to an entity.
    resources: HashMap<TypeId, Box<dyn Any>>,
    /// Set while systems are updating; subscriptions are fixed then.
    subscriptions_frozen: bool,
    /// Delta for the tick in progress, after any time scaling.
    time_delta: Duration,
    /// Sum of every completed tick's delta.
    elapsed: Duration,
    /// Number of ticks started.
    tick: u64,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            alive: HashSet::new(),
            maps: HashMap::new(),
            subscriptions: SubscriptionIndex::default(),
            resources: HashMap::new(),
            subscriptions_frozen: false,
            time_delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            tick: 0,
        }
    }

    // -- Entity lifecycle --

    /// Allocate a fresh, never-before-issued entity.
    ///
    /// The entity has no components, so it immediately joins every
    /// subscription whose filter only forbids kinds.
    pub fn new_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.alive.insert(entity);
        self.subscriptions.admit(entity);
        trace!(entity = entity.id(), "entity created");
        entity
    }

    /// Remove an entity from every component map and every subscription.
    ///
    /// Components are dropped here, which releases whatever they own.
    /// Returns `false` if the entity was not alive; calling this twice is
    /// harmless.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.alive.remove(&entity) {
            return false;
        }
        for map in self.maps.values_mut() {
            map.purge(entity);
        }
        self.subscriptions.evict(entity);
        debug!(entity = entity.id(), "entity removed");
        true
    }

    /// Returns `true` if the entity has been issued and not removed.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.alive.len()
    }

    /// Number of entities ever issued, live or not.
    #[must_use]
    pub fn entities_issued(&self) -> u64 {
        self.allocator.count()
    }

    // -- Component operations --

    /// Attach `value` to `entity`, replacing any existing `T`.
    ///
    /// When this gives the entity a kind it did not hold, every subscription
    /// whose filter mentions `T` re-tests the entity. Returns a reference to
    /// the stored component so callers can finish initialising it in place.
    ///
    /// # Errors
    ///
    /// [`WorldError::DeadEntity`] if the entity was removed or never issued;
    /// [`WorldError::KindCollision`] if another type already claimed `T`'s name.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, WorldError> {
        if !self.is_alive(entity) {
            return Err(WorldError::DeadEntity(entity));
        }

        let kind = T::component_type_id();
        let map = self
            .maps
            .entry(kind)
            .or_insert_with(|| Box::new(ComponentMap::<T>::new()));
        let typed = downcast_mut::<T>(map.as_mut()).ok_or(WorldError::KindCollision {
            name: T::type_name(),
        })?;

        if typed.insert(entity, value).is_none() {
            trace!(entity = entity.id(), component = T::type_name(), "component added");
            self.refresh(kind, entity);
        }

        self.component_map_mut::<T>()
            .and_then(|m| m.get_mut(entity))
            .ok_or(WorldError::DeadEntity(entity))
    }

    /// Detach and return `entity`'s `T`.
    ///
    /// Absent components and dead entities are a no-op returning `None`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let kind = T::component_type_id();
        let removed = self.component_map_mut::<T>()?.remove(entity)?;
        trace!(entity = entity.id(), component = T::type_name(), "component removed");
        self.refresh(kind, entity);
        Some(removed)
    }

    /// Look up `entity`'s `T`. `None` means "not there (yet)", never an error.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.component_map::<T>()?.get(entity)
    }

    /// Mutable lookup. Mutating a component in place never changes
    /// subscription membership.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.component_map_mut::<T>()?.get_mut(entity)
    }

    /// Returns `true` if `entity` holds a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.has_kind(T::component_type_id(), entity)
    }

    /// Returns `true` if `entity` holds a component of `kind`.
    #[must_use]
    pub fn has_kind(&self, kind: ComponentTypeId, entity: Entity) -> bool {
        self.maps.get(&kind).is_some_and(|m| m.contains(entity))
    }

    /// The typed map for `T`, if any `T` was ever added.
    #[must_use]
    pub fn component_map<T: Component>(&self) -> Option<&ComponentMap<T>> {
        downcast_ref::<T>(self.maps.get(&T::component_type_id())?.as_ref())
    }

    fn component_map_mut<T: Component>(&mut self) -> Option<&mut ComponentMap<T>> {
        downcast_mut::<T>(self.maps.get_mut(&T::component_type_id())?.as_mut())
    }

    /// Names of every component kind `entity` holds, sorted.
    #[must_use]
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .maps
            .values()
            .filter(|m| m.contains(entity))
            .map(|m| m.kind_name())
            .collect();
        names.sort_unstable();
        names
    }

    fn refresh(&mut self, kind: ComponentTypeId, entity: Entity) {
        let maps = &self.maps;
        self.subscriptions.refresh(kind, entity, |k| {
            maps.get(&k).is_some_and(|m| m.contains(entity))
        });
    }

    // -- Subscriptions --

    /// Register a live filter and seed it with one scan of the live entities.
    ///
    /// Registering a filter equal to an existing one returns the existing
    /// subscription.
    ///
    /// # Panics
    ///
    /// Panics if called while the scheduler is running system updates:
    /// a system's subscriptions are created in `init` and fixed afterwards.
    pub fn add_subscription(&mut self, filter: Filter) -> SubscriptionId {
        assert!(
            !self.subscriptions_frozen,
            "subscriptions must be created during System::init, not during update"
        );

        if let Some(id) = self.subscriptions.find(&filter) {
            return id;
        }

        let seed = self.matching(&filter);
        let id = self.subscriptions.insert(filter, seed);
        debug!(
            subscription = id.index(),
            seeded = self.subscriptions.get(id).len(),
            "subscription added"
        );
        id
    }

    /// The subscription behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different world.
    #[must_use]
    pub fn subscription(&self, id: SubscriptionId) -> &Subscription {
        self.subscriptions.get(id)
    }

    /// Snapshot of the entities currently matching `id`, safe to iterate while
    /// mutating the world.
    #[must_use]
    pub fn entities(&self, id: SubscriptionId) -> Vec<Entity> {
        self.subscriptions.get(id).snapshot()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Evaluate `filter` against every live entity, in ascending order.
    ///
    /// This is the brute-force counterpart of a subscription.
    #[must_use]
    pub fn matching(&self, filter: &Filter) -> Vec<Entity> {
        let mut out: Vec<Entity> = self
            .alive
            .iter()
            .copied()
            .filter(|&e| filter.matches(|k| self.has_kind(k, e)))
            .collect();
        out.sort_unstable();
        out
    }

    pub(crate) fn freeze_subscriptions(&mut self, frozen: bool) {
        self.subscriptions_frozen = frozen;
    }

    // -- Resources --

    /// Insert a resource, replacing any existing resource of the same type.
    pub fn insert_resource<R: 'static>(&mut self, value: R) {
        self.resources.insert(TypeId::of::<R>(), Box::new(value));
    }

    /// Shared reference to a resource, if present.
    #[must_use]
    pub fn get_resource<R: 'static>(&self) -> Option<&R> {
        self.resources
            .get(&TypeId::of::<R>())
            .and_then(|r| r.downcast_ref::<R>())
    }

    /// Mutable reference to a resource, if present.
    pub fn get_resource_mut<R: 'static>(&mut self) -> Option<&mut R> {
        self.resources
            .get_mut(&TypeId::of::<R>())
            .and_then(|r| r.downcast_mut::<R>())
    }

    /// Remove a resource, taking ownership.
    ///
    /// Use this to borrow a resource and the world at the same time: take it,
    /// work, then [`insert_resource`](Self::insert_resource) it back.
    pub fn take_resource<R: 'static>(&mut self) -> Option<R> {
        self.resources
            .remove(&TypeId::of::<R>())
            .and_then(|r| r.downcast::<R>().ok())
            .map(|b| *b)
    }

    /// Returns `true` if a resource of type `R` is present.
    #[must_use]
    pub fn has_resource<R: 'static>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<R>())
    }

    // -- Time --

    /// The delta of the tick in progress, after any time scaling applied by
    /// systems that ran earlier this tick.
    #[must_use]
    pub fn time_delta(&self) -> Duration {
        self.time_delta
    }

    /// Overwrite this tick's delta. Systems that run later in the tick see the
    /// new value.
    pub fn set_time_delta(&mut self, delta: Duration) {
        self.time_delta = delta;
    }

    /// Total (scaled) time of all completed ticks.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of ticks started so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn begin_tick(&mut self, delta: Duration) {
        self.tick += 1;
        self.time_delta = delta;
    }

    pub(crate) fn end_tick(&mut self) {
        self.elapsed += self.time_delta;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.alive.len())
            .field("component_kinds", &self.maps.len())
            .field("subscriptions", &self.subscriptions.len())
            .field("resources", &self.resources.len())
            .field("tick", &self.tick)
            .finish()
    }
}
