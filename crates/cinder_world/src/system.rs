//! The [`System`] trait.
//!
//! A system is a unit of per-tick behaviour. It is registered once with a
//! [`Scheduler`](crate::Scheduler), which immediately calls
//! [`System::init`], the only place it may create subscriptions, and then
//! calls [`System::update`] once per tick for as long as the system is active.
//!
//! Systems never call each other. They communicate by adding and removing
//! components, which moves entities in and out of other systems'
//! subscriptions.

use std::any::Any;

use crate::world::World;

/// Per-tick behaviour bound to zero or more subscriptions.
pub trait System: Any {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Called exactly once, at registration. Create subscriptions here.
    fn init(&mut self, world: &mut World);

    /// Called once per tick while the system is active.
    fn update(&mut self, world: &mut World);

    /// Called once when the scheduler shuts down, in reverse registration
    /// order.
    fn shutdown(&mut self, _world: &mut World) {}
}

/// Handle to a system registered with a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub(crate) usize);

impl SystemId {
    /// Position in registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}
