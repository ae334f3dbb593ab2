//! Core [`Component`] trait and component-kind identity.
//!
//! Every piece of data stored in the world must implement [`Component`]. The
//! trait requires `Send + Sync + 'static` so a component can own external
//! resources (open archives, byte streams) without tying the world to one
//! thread model.
//!
//! ## Kind identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. It is the token the filter engine indexes
//! on: filters, subscriptions and the world's map registry all speak in
//! `ComponentTypeId`s rather than Rust types.

/// A unique identifier for a component kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The core component trait.
///
/// Components are pure data. A kind is named once, here, and that name is the
/// source of its [`ComponentTypeId`]; two Rust types must not share a name.
///
/// # Examples
///
/// ```rust
/// use cinder_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component kind.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    ///
    /// The default implementation hashes [`Component::type_name()`] with
    /// FNV-1a 64-bit.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}
