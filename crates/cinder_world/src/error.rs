//! World-level error types.

use cinder_component::Entity;

/// Errors returned by [`World`](crate::World) and [`Scheduler`](crate::Scheduler)
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity was never issued or has already been removed.
    #[error("{0} is not alive")]
    DeadEntity(Entity),

    /// Two distinct Rust types declared the same component name.
    #[error("component name `{name}` is already bound to another type")]
    KindCollision {
        /// The clashing component name.
        name: &'static str,
    },

    /// A tick configuration with a non-positive or non-finite rate.
    #[error("tick rate must be a positive number of ticks per second, got {0}")]
    InvalidTickRate(f64),
}
