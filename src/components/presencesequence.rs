//! Timed cascade over an ordered list of other presences.
//!
//! A [`PresenceSequence`] is a presence that, when its core tells it to
//! appear, starts the listed targets one after another with a delay between
//! steps, and reports its own step complete once every target is visible.
//! Disappearing mirrors this, optionally walking the list backwards.
//!
//! # Timing
//!
//! ```text
//! start_appearing ──appear_delay──▶ targets[0] ──appear_step_delay──▶ targets[1] ── ... ▶ targets[n-1]
//! ```
//!
//! All four timers are advanced by
//! [`update_presence_timers`](crate::systems::time::update_presence_timers).
//! Starting one direction stops both timers of the other direction.
//!
//! Stepping is frame-granular: a timer started during an update only counts
//! from the next one, so each update advances the cascade by at most one
//! step. A zero `appear_delay` still costs one update. Leftover time is not
//! carried over, so one update of `2 * appear_step_delay` starts `targets[0]`
//! only. The "one step per delay" ordering holds when updates are no longer
//! than the step delay.
//!
//! # Related
//!
//! - [`crate::systems::sequence`] – step logic and completion checks

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::presence::ListenerId;
use crate::components::timer::Timer;

/// Delay configuration for a sequence, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceTiming {
    pub appear_delay: f32,
    pub disappear_delay: f32,
    pub appear_step_delay: f32,
    pub disappear_step_delay: f32,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            appear_delay: 0.0,
            disappear_delay: 0.0,
            appear_step_delay: 0.1,
            disappear_step_delay: 0.1,
        }
    }
}

/// Which of the four sequence timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceTimer {
    AppearDelay,
    AppearStep,
    DisappearDelay,
    DisappearStep,
}

impl SequenceTimer {
    pub const ALL: [SequenceTimer; 4] = [
        SequenceTimer::AppearDelay,
        SequenceTimer::AppearStep,
        SequenceTimer::DisappearDelay,
        SequenceTimer::DisappearStep,
    ];
}

/// Listener handles a sequence holds on one of its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TargetSubscription {
    pub target: Entity,
    pub appeared: ListenerId,
    pub hidden: ListenerId,
}

#[derive(Component, Debug, Clone)]
pub struct PresenceSequence {
    pub(crate) targets: Vec<Entity>,
    pub timing: SequenceTiming,
    /// Walk the list from the end when disappearing.
    pub reverse_on_disappear: bool,
    pub(crate) appear_step: usize,
    pub(crate) disappear_step: usize,
    pub(crate) appear_delay: Timer,
    pub(crate) appear_step_delay: Timer,
    pub(crate) disappear_delay: Timer,
    pub(crate) disappear_step_delay: Timer,
    pub(crate) subscriptions: Vec<TargetSubscription>,
    /// Bumped whenever stepping restarts or settles; a step that sees it
    /// change while its target reacts does not schedule the next one.
    pub(crate) cycle: u64,
}

impl Default for PresenceSequence {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PresenceSequence {
    pub fn new(targets: Vec<Entity>) -> Self {
        Self {
            targets,
            timing: SequenceTiming::default(),
            reverse_on_disappear: false,
            appear_step: 0,
            disappear_step: 0,
            appear_delay: Timer::new(),
            appear_step_delay: Timer::new(),
            disappear_delay: Timer::new(),
            disappear_step_delay: Timer::new(),
            subscriptions: Vec::new(),
            cycle: 0,
        }
    }

    /// Builder: set all delays at once.
    pub fn with_timing(mut self, timing: SequenceTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: walk the targets backwards when disappearing.
    pub fn with_reverse_on_disappear(mut self, reverse: bool) -> Self {
        self.reverse_on_disappear = reverse;
        self
    }

    pub fn targets(&self) -> &[Entity] {
        &self.targets
    }

    pub fn appear_step(&self) -> usize {
        self.appear_step
    }

    pub fn disappear_step(&self) -> usize {
        self.disappear_step
    }

    pub fn timer(&self, which: SequenceTimer) -> &Timer {
        match which {
            SequenceTimer::AppearDelay => &self.appear_delay,
            SequenceTimer::AppearStep => &self.appear_step_delay,
            SequenceTimer::DisappearDelay => &self.disappear_delay,
            SequenceTimer::DisappearStep => &self.disappear_step_delay,
        }
    }

    pub(crate) fn timer_mut(&mut self, which: SequenceTimer) -> &mut Timer {
        match which {
            SequenceTimer::AppearDelay => &mut self.appear_delay,
            SequenceTimer::AppearStep => &mut self.appear_step_delay,
            SequenceTimer::DisappearDelay => &mut self.disappear_delay,
            SequenceTimer::DisappearStep => &mut self.disappear_step_delay,
        }
    }

    /// True while any of the four timers is counting.
    pub fn has_pending_timer(&self) -> bool {
        SequenceTimer::ALL
            .iter()
            .any(|which| self.timer(*which).is_running())
    }

    pub(crate) fn stop_appear_timers(&mut self) {
        self.appear_delay.stop();
        self.appear_step_delay.stop();
    }

    pub(crate) fn stop_disappear_timers(&mut self) {
        self.disappear_delay.stop();
        self.disappear_step_delay.stop();
    }

    pub(crate) fn stop_all_timers(&mut self) {
        self.stop_appear_timers();
        self.stop_disappear_timers();
    }

    pub(crate) fn last_index(&self) -> usize {
        self.targets.len().saturating_sub(1)
    }
}
