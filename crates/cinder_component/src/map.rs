//! Typed storage for one component kind.
//!
//! A [`ComponentMap<T>`] maps entities to their `T` component. The world keeps
//! one map per kind behind the object-safe [`ErasedMap`] trait, so it can
//! purge an entity from every map without knowing the concrete types, and
//! recovers the typed map with a downcast when a caller names `T`.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;

/// Storage for every `T` component in the world, keyed by entity.
#[derive(Debug)]
pub struct ComponentMap<T: Component> {
    values: HashMap<Entity, T>,
}

impl<T: Component> ComponentMap<T> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Insert `value` for `entity`, returning the value it replaced.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.values.insert(entity, value)
    }

    /// Remove and return the component for `entity`. Absent is not an error.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.values.remove(&entity)
    }

    /// Look up the component for `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.values.get(&entity)
    }

    /// Look up the component for `entity` mutably.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.values.get_mut(&entity)
    }

    /// Returns `true` if `entity` has this component.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.values.contains_key(&entity)
    }

    /// Number of entities holding this component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no entity holds this component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(entity, component)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.values.iter().map(|(e, v)| (*e, v))
    }
}

impl<T: Component> Default for ComponentMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a [`ComponentMap`] with its component type erased.
pub trait ErasedMap: Any + Send + Sync {
    /// The kind stored in this map.
    fn kind(&self) -> ComponentTypeId;

    /// The kind's human-readable name.
    fn kind_name(&self) -> &'static str;

    /// Returns `true` if `entity` has a component in this map.
    fn contains(&self, entity: Entity) -> bool;

    /// Drop the component for `entity`, returning whether one was present.
    fn purge(&mut self, entity: Entity) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedMap for ComponentMap<T> {
    fn kind(&self) -> ComponentTypeId {
        T::component_type_id()
    }

    fn kind_name(&self) -> &'static str {
        T::type_name()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.values.contains_key(&entity)
    }

    fn purge(&mut self, entity: Entity) -> bool {
        self.values.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Recover the typed map behind an [`ErasedMap`].
///
/// Returns `None` when the erased map stores a different Rust type, which can
/// only happen if two component types share a `type_name`.
#[must_use]
pub fn downcast_ref<T: Component>(map: &dyn ErasedMap) -> Option<&ComponentMap<T>> {
    map.as_any().downcast_ref::<ComponentMap<T>>()
}

/// Mutable variant of [`downcast_ref`].
pub fn downcast_mut<T: Component>(map: &mut dyn ErasedMap) -> Option<&mut ComponentMap<T>> {
    map.as_any_mut().downcast_mut::<ComponentMap<T>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tag(u32);

    impl Component for Tag {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    #[test]
    fn test_insert_overwrites() {
        let mut map = ComponentMap::new();
        let e = Entity(1);
        assert!(map.insert(e, Tag(1)).is_none());
        assert_eq!(map.insert(e, Tag(2)), Some(Tag(1)));
        assert_eq!(map.get(e), Some(&Tag(2)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut map: ComponentMap<Tag> = ComponentMap::new();
        assert!(map.remove(Entity(7)).is_none());
        assert!(map.remove(Entity(7)).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn test_erased_roundtrip() {
        let mut map = ComponentMap::new();
        map.insert(Entity(3), Tag(9));

        let mut boxed: Box<dyn ErasedMap> = Box::new(map);
        assert_eq!(boxed.kind(), Tag::component_type_id());
        assert_eq!(boxed.kind_name(), "Tag");
        assert!(boxed.contains(Entity(3)));

        let typed = downcast_mut::<Tag>(boxed.as_mut()).unwrap();
        typed.get_mut(Entity(3)).unwrap().0 = 10;
        assert_eq!(downcast_ref::<Tag>(boxed.as_ref()).unwrap().get(Entity(3)), Some(&Tag(10)));

        assert!(boxed.purge(Entity(3)));
        assert!(!boxed.purge(Entity(3)));
        assert_eq!(boxed.len(), 0);
    }
}
