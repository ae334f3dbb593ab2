//! Tick loop configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Configuration for [`Scheduler::run`](crate::Scheduler::run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Create a config running `max_ticks` ticks at `tick_rate` Hz.
    #[must_use]
    pub fn new(tick_rate: f64, max_ticks: u64) -> Self {
        Self {
            tick_rate,
            max_ticks,
        }
    }

    /// The fixed delta fed to every tick.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidTickRate`] unless the rate is finite, positive,
    /// and yields a representable period.
    pub fn tick_duration(&self) -> Result<Duration, WorldError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(WorldError::InvalidTickRate(self.tick_rate));
        }
        Duration::try_from_secs_f64(1.0 / self.tick_rate)
            .map_err(|_| WorldError::InvalidTickRate(self.tick_rate))
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TickConfig::default();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.max_ticks, 0);
    }

    #[test]
    fn test_tick_duration() {
        let config = TickConfig::new(50.0, 1);
        assert_eq!(config.tick_duration().unwrap(), Duration::from_millis(20));
        assert!(TickConfig::new(0.0, 1).tick_duration().is_err());
        assert!(TickConfig::new(f64::NAN, 1).tick_duration().is_err());
    }

    #[test]
    fn test_tiny_rate_is_rejected() {
        let err = TickConfig::new(1e-30, 1).tick_duration().unwrap_err();
        assert!(matches!(err, WorldError::InvalidTickRate(rate) if rate == 1e-30));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TickConfig = serde_json::from_str(r#"{ "max_ticks": 5 }"#).unwrap();
        assert_eq!(config, TickConfig::new(60.0, 5));
    }
}
