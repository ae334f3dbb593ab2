//! # cinder_math
//!
//! Re-exports [`glam`] for linear algebra and defines the 2D spatial
//! components that implement [`Component`](cinder_component::Component).
//!
//! Positions are screen-space and double precision.

pub mod components;

pub use glam::{DVec2, IVec2, Vec2};

pub use components::{Position, Velocity};
