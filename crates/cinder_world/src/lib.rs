//! # cinder_world
//!
//! The reactive half of the substrate: the [`World`] component store, the
//! incrementally maintained [`Subscription`] sets, the [`System`] contract, and
//! the single-threaded [`Scheduler`] that drives it all.
//!
//! Systems never talk to each other. A pipeline is built by having one system
//! add a component that moves an entity into another system's subscription.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod subscription;
pub mod system;
pub mod world;

pub use config::TickConfig;
pub use error::WorldError;
pub use scheduler::Scheduler;
pub use subscription::{Subscription, SubscriptionId};
pub use system::{System, SystemId};
pub use world::World;
