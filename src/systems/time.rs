//! Time update systems.
//!
//! [`update_world_time`] advances the shared
//! [`WorldTime`](crate::resources::worldtime::WorldTime) resource once per
//! frame, applying `time_scale` to the provided delta.
//! [`update_presence_timers`] advances every sequence and timed presence
//! timer and runs what fires.
use bevy_ecs::prelude::*;

use crate::components::presencesequence::{PresenceSequence, SequenceTimer};
use crate::components::timedpresence::TimedPresence;
use crate::resources::worldtime::WorldTime;
use crate::systems::sequence::fire_timer;
use crate::systems::timedpresence::fire_timed;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled frame delta in seconds. The system
/// applies the current `time_scale` and writes both `elapsed` and `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.get_resource_or_insert_with(WorldTime::default);
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Advance every presence timer by `dt` seconds.
///
/// The set of running timers is captured before anything fires. A timer
/// started during this call waits for the next one, and a timer stopped or
/// restarted by an earlier callback is skipped.
pub fn update_presence_timers(world: &mut World, dt: f32) {
    let mut sequences = world.query::<(Entity, &PresenceSequence)>();
    let armed: Vec<(Entity, SequenceTimer, u32)> = sequences
        .iter(world)
        .flat_map(|(entity, seq)| {
            SequenceTimer::ALL
                .into_iter()
                .filter(move |which| seq.timer(*which).is_running())
                .map(move |which| (entity, which, seq.timer(which).epoch()))
        })
        .collect();

    let mut timed_query = world.query::<(Entity, &TimedPresence)>();
    let timed: Vec<(Entity, u32)> = timed_query
        .iter(world)
        .filter(|(_, timed)| timed.timer.is_running())
        .map(|(entity, timed)| (entity, timed.timer.epoch()))
        .collect();

    for (entity, which, epoch) in armed {
        let fired = match world.get_mut::<PresenceSequence>(entity) {
            Some(mut seq) if seq.timer(which).epoch() == epoch => seq.timer_mut(which).update(dt),
            _ => false,
        };
        if fired {
            fire_timer(world, entity, which);
        }
    }

    for (entity, epoch) in timed {
        let fired = match world.get_mut::<TimedPresence>(entity) {
            Some(mut t) if t.timer.epoch() == epoch => t.timer.update(dt),
            _ => false,
        };
        if fired {
            fire_timed(world, entity);
        }
    }
}

/// Exclusive system: advance presence timers by this frame's `WorldTime::delta`.
pub fn presence_timer_system(world: &mut World) {
    let dt = world
        .get_resource::<WorldTime>()
        .map(|time| time.delta)
        .unwrap_or(0.0);
    update_presence_timers(world, dt);
}
