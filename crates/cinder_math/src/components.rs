//! 2D spatial components.
//!
//! [`Position`] places an entity in screen space; [`Velocity`] is the
//! per-tick displacement the movement system applies to it.

use cinder_component::Component;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Screen-space location.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position(pub DVec2);

impl Position {
    pub const ORIGIN: Self = Self(DVec2::ZERO);

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    /// Move by `offset`.
    pub fn translate(&mut self, offset: DVec2) {
        self.0 += offset;
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Displacement applied to [`Position`] once per tick.
///
/// Units are pixels per tick, not per second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub DVec2);

impl Velocity {
    pub const ZERO: Self = Self(DVec2::ZERO);

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}
