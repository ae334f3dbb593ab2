//! Component-presence filters.
//!
//! A [`Filter`] declares which component kinds an entity must hold, must not
//! hold, and must hold at least one of. Systems build their filters once, at
//! init time, and hand them to the world as subscriptions; the world uses
//! [`Filter::mentions`] to decide which subscriptions a mutation can affect.

use std::collections::BTreeSet;

use crate::component::{Component, ComponentTypeId};

/// An immutable predicate over the set of component kinds an entity holds.
///
/// An entity matches when:
///
/// 1. it holds every kind in `required`,
/// 2. it holds none of the kinds in `forbidden`,
/// 3. if `require_one` is non-empty, it holds at least one kind from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    required: BTreeSet<ComponentTypeId>,
    forbidden: BTreeSet<ComponentTypeId>,
    require_one: BTreeSet<ComponentTypeId>,
}

impl Filter {
    /// Start building a filter.
    #[must_use]
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// Kinds an entity must hold.
    #[must_use]
    pub fn required(&self) -> &BTreeSet<ComponentTypeId> {
        &self.required
    }

    /// Kinds an entity must not hold.
    #[must_use]
    pub fn forbidden(&self) -> &BTreeSet<ComponentTypeId> {
        &self.forbidden
    }

    /// Kinds of which an entity must hold at least one (ignored when empty).
    #[must_use]
    pub fn require_one(&self) -> &BTreeSet<ComponentTypeId> {
        &self.require_one
    }

    /// Evaluate the filter. `has` answers whether the entity under test holds
    /// a given kind.
    pub fn matches(&self, has: impl Fn(ComponentTypeId) -> bool) -> bool {
        if !self.required.iter().all(|k| has(*k)) {
            return false;
        }
        if self.forbidden.iter().any(|k| has(*k)) {
            return false;
        }
        self.require_one.is_empty() || self.require_one.iter().any(|k| has(*k))
    }

    /// Returns `true` if adding or removing `kind` can change this filter's
    /// verdict.
    #[must_use]
    pub fn mentions(&self, kind: ComponentTypeId) -> bool {
        self.required.contains(&kind)
            || self.forbidden.contains(&kind)
            || self.require_one.contains(&kind)
    }

    /// Every kind referenced by the filter, each once.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.required
            .iter()
            .chain(&self.forbidden)
            .chain(&self.require_one)
            .copied()
    }

    /// Returns `true` if an entity with no components matches.
    #[must_use]
    pub fn matches_empty(&self) -> bool {
        self.required.is_empty() && self.require_one.is_empty()
    }
}

/// Builder for [`Filter`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    filter: Filter,
}

impl FilterBuilder {
    /// Require component `T`.
    #[must_use]
    pub fn require<T: Component>(self) -> Self {
        self.require_id(T::component_type_id())
    }

    /// Forbid component `T`.
    #[must_use]
    pub fn forbid<T: Component>(self) -> Self {
        self.forbid_id(T::component_type_id())
    }

    /// Add `T` to the require-one set.
    #[must_use]
    pub fn require_one<T: Component>(self) -> Self {
        self.require_one_id(T::component_type_id())
    }

    /// Require a kind by id.
    #[must_use]
    pub fn require_id(mut self, kind: ComponentTypeId) -> Self {
        self.filter.required.insert(kind);
        self
    }

    /// Forbid a kind by id.
    #[must_use]
    pub fn forbid_id(mut self, kind: ComponentTypeId) -> Self {
        self.filter.forbidden.insert(kind);
        self
    }

    /// Add a kind to the require-one set by id.
    #[must_use]
    pub fn require_one_id(mut self, kind: ComponentTypeId) -> Self {
        self.filter.require_one.insert(kind);
        self
    }

    /// Forbid every kind in `kinds`.
    #[must_use]
    pub fn forbid_all(mut self, kinds: impl IntoIterator<Item = ComponentTypeId>) -> Self {
        self.filter.forbidden.extend(kinds);
        self
    }

    /// Add every kind in `kinds` to the require-one set.
    #[must_use]
    pub fn require_any_of(mut self, kinds: impl IntoIterator<Item = ComponentTypeId>) -> Self {
        self.filter.require_one.extend(kinds);
        self
    }

    /// Finish the filter.
    ///
    /// The three kind sets must be pairwise disjoint; overlapping sets are a
    /// programming error and trip a debug assertion.
    #[must_use]
    pub fn build(self) -> Filter {
        let f = &self.filter;
        debug_assert!(
            f.required.is_disjoint(&f.forbidden)
                && f.required.is_disjoint(&f.require_one)
                && f.forbidden.is_disjoint(&f.require_one),
            "filter kind sets must be disjoint: {f:?}"
        );
        self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ComponentTypeId {
        ComponentTypeId(n)
    }

    fn holding(kinds: &[u64]) -> impl Fn(ComponentTypeId) -> bool + '_ {
        move |k| kinds.contains(&k.0)
    }

    #[test]
    fn test_required_and_forbidden() {
        // "has a path but no type yet"
        let f = Filter::builder().require_id(id(1)).forbid_id(id(2)).build();

        assert!(f.matches(holding(&[1])));
        assert!(f.matches(holding(&[1, 3])));
        assert!(!f.matches(holding(&[1, 2])));
        assert!(!f.matches(holding(&[3])));
    }

    #[test]
    fn test_require_one() {
        let f = Filter::builder()
            .require_any_of([id(4), id(5)])
            .build();

        assert!(!f.matches(holding(&[])));
        assert!(f.matches(holding(&[4])));
        assert!(f.matches(holding(&[5, 9])));
        assert!(!f.matches(holding(&[9])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let f = Filter::builder().build();
        assert!(f.matches_empty());
        assert!(f.matches(holding(&[])));
        assert!(f.matches(holding(&[1, 2, 3])));
    }

    #[test]
    fn test_forbid_only_matches_empty_entity() {
        let f = Filter::builder().forbid_id(id(1)).build();
        assert!(f.matches_empty());
        assert!(f.matches(holding(&[])));
        assert!(!f.matches(holding(&[1])));
    }

    #[test]
    fn test_mentions_and_kinds() {
        let f = Filter::builder()
            .require_id(id(1))
            .forbid_all([id(2), id(3)])
            .require_one_id(id(4))
            .build();

        for k in 1..=4 {
            assert!(f.mentions(id(k)));
        }
        assert!(!f.mentions(id(5)));
        assert_eq!(f.kinds().count(), 4);
        assert!(!f.matches_empty());
    }

    #[test]
    #[should_panic(expected = "disjoint")]
    #[cfg(debug_assertions)]
    fn test_overlapping_sets_rejected() {
        let _ = Filter::builder().require_id(id(1)).forbid_id(id(1)).build();
    }
}
