//! When to stop ticking.
//!
//! A run ends once nothing is left to load, or once the stage counts have not
//! moved for a number of ticks. Files whose type has no parser registered stay
//! in the unparsed stage forever, so waiting for `loading == false` alone
//! never ends for them.

use tracing::warn;

use cinder_systems::{LoadStatus, StageCounts};
use cinder_world::World;

#[derive(Debug)]
pub struct Settle {
    limit: u64,
    last: Option<StageCounts>,
    idle: u64,
}

impl Settle {
    /// Give up after `limit` ticks without stage movement (0 waits forever).
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            last: None,
            idle: 0,
        }
    }

    /// Feed one tick's world; `true` means the run should stop.
    pub fn done(&mut self, world: &World) -> bool {
        let Some(status) = world.get_resource::<LoadStatus>() else {
            return false;
        };
        if !status.loading {
            return true;
        }

        if self.last == Some(status.counts) {
            self.idle += 1;
        } else {
            self.last = Some(status.counts);
            self.idle = 0;
        }

        if self.limit > 0 && self.idle >= self.limit {
            warn!(
                idle_ticks = self.idle,
                untyped = status.counts.untyped,
                unhandled = status.counts.unhandled,
                unparsed = status.counts.unparsed,
                "loading stalled, no system consumes the remaining files"
            );
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(unparsed: usize, loaded: usize) -> LoadStatus {
        let counts = StageCounts {
            unparsed,
            loaded,
            ..StageCounts::default()
        };
        LoadStatus {
            counts,
            loading: counts.pending() > 0,
            ..LoadStatus::default()
        }
    }

    #[test]
    fn test_stops_when_loading_ends() {
        let mut world = World::new();
        let mut settle = Settle::new(0);
        assert!(!settle.done(&world));

        world.insert_resource(status(0, 3));
        assert!(settle.done(&world));
    }

    #[test]
    fn test_stops_after_idle_limit() {
        let mut world = World::new();
        let mut settle = Settle::new(3);
        world.insert_resource(status(1, 1));

        assert!(!settle.done(&world));
        assert!(!settle.done(&world));
        assert!(!settle.done(&world));
        assert!(settle.done(&world));
    }

    #[test]
    fn test_movement_resets_idle_count() {
        let mut world = World::new();
        let mut settle = Settle::new(2);
        world.insert_resource(status(2, 1));
        assert!(!settle.done(&world));
        assert!(!settle.done(&world));

        world.insert_resource(status(1, 2));
        assert!(!settle.done(&world));
        assert!(!settle.done(&world));
        assert!(settle.done(&world));
    }

    #[test]
    fn test_zero_limit_waits() {
        let mut world = World::new();
        let mut settle = Settle::new(0);
        world.insert_resource(status(1, 1));
        for _ in 0..100 {
            assert!(!settle.done(&world));
        }
    }
}
