//! Leaf presence that finishes its steps after fixed durations.
//!
//! Stands in for an animation clip: when its core fans out `appearing`, the
//! [`TimedPresence`] counts `appear_duration` seconds and then reports the
//! step complete, and likewise for `disappearing`. Instant transitions stop
//! the countdown.

use bevy_ecs::prelude::*;

use crate::components::timer::Timer;

#[derive(Component, Debug, Clone)]
pub struct TimedPresence {
    /// Seconds from `appearing` until the step is reported complete.
    pub appear_duration: f32,
    /// Seconds from `disappearing` until the step is reported complete.
    pub disappear_duration: f32,
    pub(crate) timer: Timer,
}

impl TimedPresence {
    pub fn new(appear_duration: f32, disappear_duration: f32) -> Self {
        Self {
            appear_duration,
            disappear_duration,
            timer: Timer::new(),
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}
