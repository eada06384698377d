//! Cancellable one-shot countdown used by timed presences and sequences.
//!
//! A [`Timer`] is not a component on its own: it lives inside the components
//! that need delays ([`PresenceSequence`](crate::components::presencesequence::PresenceSequence),
//! [`TimedPresence`](crate::components::timedpresence::TimedPresence)) and is
//! advanced explicitly with [`Timer::update`] by the owning system. The owner
//! decides what "firing" means by checking the returned flag.
//!
//! # Epochs
//!
//! Every [`run`](Timer::run) and [`stop`](Timer::stop) bumps an epoch counter.
//! Frame updates capture the epoch of each running timer before invoking any
//! callback, and skip timers whose epoch moved in the meantime. That way a
//! timer stopped or restarted by an earlier callback in the same frame can
//! never fire with stale state.

/// Countdown that fires once after `duration` seconds of accumulated updates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timer {
    /// Seconds the current run lasts.
    pub duration: f32,
    /// Seconds accumulated since the current run started.
    pub elapsed: f32,
    running: bool,
    epoch: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the countdown.
    pub fn run(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
        self.elapsed = 0.0;
        self.running = true;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Cancel the countdown. Stopping an idle timer still invalidates its epoch.
    pub fn stop(&mut self) {
        self.running = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Advance by `dt` seconds. Returns `true` exactly once, on the update
    /// where the accumulated time reaches the duration.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.running = false;
            return true;
        }
        false
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Seconds left before the timer fires, `None` when idle.
    pub fn remaining(&self) -> Option<f32> {
        self.running
            .then(|| (self.duration - self.elapsed).max(0.0))
    }
}
