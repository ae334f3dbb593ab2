//! Moves every entity with a position and a velocity.

use cinder_component::Filter;
use cinder_math::{Position, Velocity};
use cinder_world::{SubscriptionId, System, World};
use tracing::info;

/// Adds [`Velocity`] to [`Position`] once per tick, whatever the tick delta.
#[derive(Debug, Default)]
pub struct MovementSystem {
    moving: Option<SubscriptionId>,
}

impl MovementSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing movement system");
        self.moving = Some(world.add_subscription(
            Filter::builder()
                .require::<Position>()
                .require::<Velocity>()
                .build(),
        ));
    }

    fn update(&mut self, world: &mut World) {
        let Some(moving) = self.moving else { return };
        for entity in world.entities(moving) {
            let Some(&Velocity(v)) = world.get_component::<Velocity>(entity) else {
                continue;
            };
            if let Some(position) = world.get_component_mut::<Position>(entity) {
                position.translate(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cinder_world::Scheduler;

    use super::*;

    fn mover(world: &mut World) -> cinder_component::Entity {
        let e = world.new_entity();
        world.add_component(e, Position::new(10.0, 10.0)).unwrap();
        world.add_component(e, Velocity::new(1.0, -1.0)).unwrap();
        e
    }

    #[test]
    fn test_one_tick_applies_velocity_once() {
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(MovementSystem::new());
        let e = mover(scheduler.world_mut());

        scheduler.tick(Duration::from_millis(500));
        assert_eq!(
            scheduler.world().get_component::<Position>(e),
            Some(&Position::new(11.0, 9.0))
        );
    }

    #[test]
    fn test_no_active_systems_leaves_positions() {
        let mut scheduler = Scheduler::new(World::new());
        let id = scheduler.register(MovementSystem::new());
        scheduler.set_active(id, false);
        let e = mover(scheduler.world_mut());

        scheduler.tick(Duration::from_millis(16));
        assert_eq!(
            scheduler.world().get_component::<Position>(e),
            Some(&Position::new(10.0, 10.0))
        );
    }

    #[test]
    fn test_entities_without_velocity_stay_put() {
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(MovementSystem::new());
        let world = scheduler.world_mut();
        let still = world.new_entity();
        world.add_component(still, Position::new(1.0, 2.0)).unwrap();
        let e = mover(world);

        scheduler.tick(Duration::ZERO);
        scheduler
            .world_mut()
            .remove_component::<Velocity>(e)
            .unwrap();
        scheduler.tick(Duration::ZERO);

        let world = scheduler.world();
        assert_eq!(world.get_component::<Position>(still), Some(&Position::new(1.0, 2.0)));
        assert_eq!(world.get_component::<Position>(e), Some(&Position::new(11.0, 9.0)));
    }
}
