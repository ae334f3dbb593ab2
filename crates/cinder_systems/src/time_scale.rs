//! Scales the tick delta seen by every later system.

use cinder_world::{System, World};
use tracing::{debug, info};

/// Multiplies the world's time delta by a scale factor.
///
/// Register it before anything that reads
/// [`World::time_delta`](cinder_world::World::time_delta).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScaleSystem {
    scale: f64,
}

impl TimeScaleSystem {
    #[must_use]
    pub fn new(scale: f64) -> Self {
        let mut system = Self { scale: 1.0 };
        system.set_scale(scale);
        system
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Negative and non-finite factors clamp to zero.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }
}

impl Default for TimeScaleSystem {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl System for TimeScaleSystem {
    fn name(&self) -> &'static str {
        "time_scale"
    }

    fn init(&mut self, _world: &mut World) {
        info!(scale = self.scale, "initializing time scale");
    }

    fn update(&mut self, world: &mut World) {
        let scaled = world.time_delta().mul_f64(self.scale);
        debug!(scale = self.scale, dt = scaled.as_secs_f64(), "time scaled");
        world.set_time_delta(scaled);
    }
}
