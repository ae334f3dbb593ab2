//! # cinder_systems
//!
//! Systems that sit beside the asset pipeline:
//!
//! - [`TimeScaleSystem`] rescales the tick delta. Register it first.
//! - [`MovementSystem`] applies [`Velocity`](cinder_math::Velocity) to
//!   [`Position`](cinder_math::Position).
//! - [`LoadProgress`] counts files in each pipeline stage and drives the
//!   loading overlay.

pub mod movement;
pub mod progress;
pub mod time_scale;

pub use movement::MovementSystem;
pub use progress::{LoadProgress, LoadStatus, StageCounts};
pub use time_scale::TimeScaleSystem;
