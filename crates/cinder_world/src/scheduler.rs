//! System registration and the tick loop.
//!
//! One tick:
//!
//! 1. Advance the tick counter and set the world's time delta.
//! 2. Freeze subscription creation.
//! 3. Call `update` on every active system, in registration order. A
//!    time-scale system registered first rescales the delta for the rest.
//! 4. Unfreeze and fold the (scaled) delta into elapsed time.
//!
//! Everything runs on the calling thread. A component written during tick N is
//! seen by systems registered after the writer in tick N, and by everyone in
//! tick N + 1.

use std::any::Any;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::TickConfig;
use crate::error::WorldError;
use crate::system::{System, SystemId};
use crate::world::World;

/// A registered system and its active flag.
struct SystemSlot {
    system: Box<dyn System>,
    active: bool,
}

/// Owns the [`World`] and the ordered list of systems that update it.
pub struct Scheduler {
    world: World,
    systems: Vec<SystemSlot>,
}

impl Scheduler {
    /// Create a scheduler driving `world`.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            world,
            systems: Vec::new(),
        }
    }

    /// Register a system: run its `init` now and mark it active.
    pub fn register<S: System>(&mut self, mut system: S) -> SystemId {
        let id = SystemId(self.systems.len());
        info!(system = system.name(), index = id.index(), "initializing system");
        system.init(&mut self.world);
        self.systems.push(SystemSlot {
            system: Box::new(system),
            active: true,
        });
        id
    }

    /// Activate or deactivate a system. Inactive systems are skipped entirely.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn set_active(&mut self, id: SystemId, active: bool) -> bool {
        let Some(slot) = self.systems.get_mut(id.0) else {
            return false;
        };
        if slot.active != active {
            debug!(system = slot.system.name(), active, "system toggled");
        }
        slot.active = active;
        true
    }

    /// Returns `true` if the system exists and is active.
    #[must_use]
    pub fn is_active(&self, id: SystemId) -> bool {
        self.systems.get(id.0).is_some_and(|s| s.active)
    }

    /// The first registered system of type `S`.
    #[must_use]
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems.iter().find_map(|slot| {
            let any: &dyn Any = slot.system.as_ref();
            any.downcast_ref::<S>()
        })
    }

    /// Mutable access to the first registered system of type `S`.
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.iter_mut().find_map(|slot| {
            let any: &mut dyn Any = slot.system.as_mut();
            any.downcast_mut::<S>()
        })
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of active systems.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.systems.iter().filter(|s| s.active).count()
    }

    /// Names of the registered systems, in registration order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Run one tick with the given external delta.
    pub fn tick(&mut self, delta: Duration) {
        self.world.begin_tick(delta);

        debug!(
            tick = self.world.tick(),
            dt = delta.as_secs_f64(),
            active = self.active_count(),
            "tick start"
        );

        self.world.freeze_subscriptions(true);
        for slot in &mut self.systems {
            if slot.active {
                slot.system.update(&mut self.world);
            }
        }
        self.world.freeze_subscriptions(false);

        self.world.end_tick();
    }

    /// Run the fixed-timestep loop for `config.max_ticks` ticks (forever when
    /// zero). Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidTickRate`] if the configured rate is unusable.
    pub fn run(&mut self, config: &TickConfig) -> Result<u64, WorldError> {
        self.run_until(config, |_| false)
    }

    /// Like [`run`](Self::run), but also stops after any tick at which `stop`
    /// returns `true`.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidTickRate`] if the configured rate is unusable.
    pub fn run_until(
        &mut self,
        config: &TickConfig,
        mut stop: impl FnMut(&World) -> bool,
    ) -> Result<u64, WorldError> {
        let tick_duration = config.tick_duration()?;
        let mut tick_count = 0u64;

        info!(
            tick_rate = config.tick_rate,
            max_ticks = config.max_ticks,
            systems = self.systems.len(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration);
            tick_count += 1;

            if config.max_ticks > 0 && tick_count >= config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }
            if stop(&self.world) {
                info!(ticks = tick_count, "tick loop stopped");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick = self.world.tick(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        Ok(tick_count)
    }

    /// Tear down every system in reverse registration order and hand back the
    /// world.
    pub fn shutdown(mut self) -> World {
        while let Some(mut slot) = self.systems.pop() {
            debug!(system = slot.system.name(), "shutting down system");
            slot.system.shutdown(&mut self.world);
        }
        self.world
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("world", &self.world)
            .field("systems", &self.system_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cinder_component::{Component, Entity, Filter};

    use super::*;
    use crate::subscription::SubscriptionId;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Counter(u32);
    impl Component for Counter {
        fn type_name() -> &'static str {
            "Counter"
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Marked;
    impl Component for Marked {
        fn type_name() -> &'static str {
            "Marked"
        }
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    /// Records each lifecycle call into a shared log.
    struct Recorder {
        name: &'static str,
        log: Log,
        inits: u32,
        updates: u32,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                inits: 0,
                updates: 0,
            }
        }
    }

    impl System for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }
        fn init(&mut self, _world: &mut World) {
            self.inits += 1;
        }
        fn update(&mut self, _world: &mut World) {
            self.updates += 1;
            self.log.borrow_mut().push(self.name);
        }
        fn shutdown(&mut self, _world: &mut World) {
            self.log.borrow_mut().push("shutdown");
        }
    }

    /// Marks every counter entity, then increments marked ones.
    struct Marker {
        counters: Option<SubscriptionId>,
    }

    impl System for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }
        fn init(&mut self, world: &mut World) {
            self.counters = Some(world.add_subscription(
                Filter::builder().require::<Counter>().forbid::<Marked>().build(),
            ));
        }
        fn update(&mut self, world: &mut World) {
            let Some(sub) = self.counters else { return };
            for e in world.entities(sub) {
                world.add_component(e, Marked).unwrap();
            }
        }
    }

    struct Incrementer {
        marked: Option<SubscriptionId>,
    }

    impl System for Incrementer {
        fn name(&self) -> &'static str {
            "incrementer"
        }
        fn init(&mut self, world: &mut World) {
            self.marked = Some(world.add_subscription(
                Filter::builder().require::<Counter>().require::<Marked>().build(),
            ));
        }
        fn update(&mut self, world: &mut World) {
            let Some(sub) = self.marked else { return };
            for e in world.entities(sub) {
                if let Some(c) = world.get_component_mut::<Counter>(e) {
                    c.0 += 1;
                }
            }
        }
    }

    struct LateSubscriber;

    impl System for LateSubscriber {
        fn name(&self) -> &'static str {
            "late"
        }
        fn init(&mut self, _world: &mut World) {}
        fn update(&mut self, world: &mut World) {
            world.add_subscription(Filter::builder().build());
        }
    }

    fn counter_world() -> (World, Entity) {
        let mut world = World::new();
        let e = world.new_entity();
        world.add_component(e, Counter(0)).unwrap();
        (world, e)
    }

    #[test]
    fn test_register_runs_init_once_and_activates() {
        let log = Log::default();
        let mut scheduler = Scheduler::new(World::new());
        let id = scheduler.register(Recorder::new("a", &log));

        assert!(scheduler.is_active(id));
        assert_eq!(scheduler.system::<Recorder>().unwrap().inits, 1);

        scheduler.tick(Duration::from_millis(16));
        scheduler.tick(Duration::from_millis(16));
        let recorder = scheduler.system::<Recorder>().unwrap();
        assert_eq!(recorder.inits, 1);
        assert_eq!(recorder.updates, 2);
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let log = Log::default();
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(Recorder::new("first", &log));
        scheduler.register(Recorder::new("second", &log));
        scheduler.register(Recorder::new("third", &log));

        scheduler.tick(Duration::ZERO);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
        assert_eq!(scheduler.system_names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_inactive_systems_are_skipped() {
        let log = Log::default();
        let mut scheduler = Scheduler::new(World::new());
        let a = scheduler.register(Recorder::new("a", &log));
        scheduler.register(Recorder::new("b", &log));

        assert!(scheduler.set_active(a, false));
        scheduler.tick(Duration::ZERO);
        assert_eq!(*log.borrow(), vec!["b"]);
        assert_eq!(scheduler.active_count(), 1);

        scheduler.set_active(a, true);
        scheduler.tick(Duration::ZERO);
        assert_eq!(*log.borrow(), vec!["b", "a", "b"]);

        assert!(!scheduler.set_active(SystemId(99), true));
        assert!(!scheduler.is_active(SystemId(99)));
    }

    #[test]
    fn test_producer_before_consumer_sees_same_tick() {
        let (world, e) = counter_world();
        let mut scheduler = Scheduler::new(world);
        scheduler.register(Marker { counters: None });
        scheduler.register(Incrementer { marked: None });

        scheduler.tick(Duration::ZERO);
        assert_eq!(scheduler.world().get_component::<Counter>(e), Some(&Counter(1)));
    }

    #[test]
    fn test_consumer_before_producer_sees_next_tick() {
        let (world, e) = counter_world();
        let mut scheduler = Scheduler::new(world);
        scheduler.register(Incrementer { marked: None });
        scheduler.register(Marker { counters: None });

        scheduler.tick(Duration::ZERO);
        assert_eq!(scheduler.world().get_component::<Counter>(e), Some(&Counter(0)));
        scheduler.tick(Duration::ZERO);
        assert_eq!(scheduler.world().get_component::<Counter>(e), Some(&Counter(1)));
    }

    #[test]
    fn test_time_accounting() {
        let mut scheduler = Scheduler::new(World::new());
        scheduler.tick(Duration::from_millis(10));
        scheduler.tick(Duration::from_millis(15));
        assert_eq!(scheduler.world().tick(), 2);
        assert_eq!(scheduler.world().time_delta(), Duration::from_millis(15));
        assert_eq!(scheduler.world().elapsed(), Duration::from_millis(25));
    }

    #[test]
    #[should_panic(expected = "System::init")]
    fn test_subscribing_during_update_panics() {
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(LateSubscriber);
        scheduler.tick(Duration::ZERO);
    }

    #[test]
    fn test_run_limited_ticks() {
        let log = Log::default();
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(Recorder::new("a", &log));

        let ran = scheduler.run(&TickConfig::new(1000.0, 5)).unwrap();
        assert_eq!(ran, 5);
        assert_eq!(scheduler.world().tick(), 5);
        assert_eq!(log.borrow().len(), 5);
    }

    #[test]
    fn test_run_until_stops_early() {
        let mut scheduler = Scheduler::new(World::new());
        let ran = scheduler
            .run_until(&TickConfig::new(1000.0, 0), |w| w.tick() == 3)
            .unwrap();
        assert_eq!(ran, 3);
    }

    #[test]
    fn test_run_rejects_bad_rate() {
        let mut scheduler = Scheduler::new(World::new());
        assert!(matches!(
            scheduler.run(&TickConfig::new(-1.0, 1)),
            Err(WorldError::InvalidTickRate(_))
        ));
    }

    #[test]
    fn test_shutdown_reverse_order_returns_world() {
        let log = Log::default();
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(Recorder::new("a", &log));
        scheduler.register(Recorder::new("b", &log));
        let e = scheduler.world_mut().new_entity();

        let world = scheduler.shutdown();
        assert_eq!(*log.borrow(), vec!["shutdown", "shutdown"]);
        assert!(world.is_alive(e));
    }
}
