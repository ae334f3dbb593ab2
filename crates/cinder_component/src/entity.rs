//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight `u64` identifier with no inherent data.
//! Entity IDs are issued by the world's allocator and are never reused.

use serde::{Deserialize, Serialize};

/// A unique entity identifier.
///
/// Entities are pure identifiers; they carry no data of their own. Components
/// are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The null / invalid entity sentinel.
    pub const INVALID: Entity = Entity(0);

    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity IDs.
///
/// IDs are never recycled: a stale `Entity` cannot alias a newer one.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. IDs start at 1 (0 is reserved for [`Entity::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh entity ID.
    pub fn allocate(&mut self) -> Entity {
        let id = self.next_id;
        self.next_id += 1;
        Entity(id)
    }

    /// Returns the number of entities allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }

    /// Returns `true` if `entity` was issued by this allocator.
    #[must_use]
    pub fn issued(&self, entity: Entity) -> bool {
        entity.is_valid() && entity.0 < self.next_id
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
