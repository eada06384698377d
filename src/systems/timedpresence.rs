//! Timed presence reactions.
//!
//! A [`TimedPresence`] arms its timer when its core fans out `appearing` or
//! `disappearing` and reports the step complete when the timer runs out.
//! Instant transitions stop the timer before notifying.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::presence::{PresenceEventKind, PresenceState};
use crate::components::timedpresence::TimedPresence;
use crate::systems::presence::{complete_appearing, complete_disappearing, presence_state, raise};

pub(crate) fn timed_appearing(world: &mut World, entity: Entity) {
    raise(world, entity, PresenceEventKind::Appearing);
    arm(world, entity, PresenceState::Appearing);
}

pub(crate) fn timed_disappearing(world: &mut World, entity: Entity) {
    raise(world, entity, PresenceEventKind::Disappearing);
    arm(world, entity, PresenceState::Disappearing);
}

/// Arm the timer unless a listener already moved the presence on.
fn arm(world: &mut World, entity: Entity, expected: PresenceState) {
    if presence_state(world, entity) != Some(expected) {
        return;
    }
    if let Some(mut timed) = world.get_mut::<TimedPresence>(entity) {
        let duration = match expected {
            PresenceState::Appearing => timed.appear_duration,
            _ => timed.disappear_duration,
        };
        timed.timer.run(duration);
    }
}

pub(crate) fn timed_settled(world: &mut World, entity: Entity, kind: PresenceEventKind) {
    if let Some(mut timed) = world.get_mut::<TimedPresence>(entity) {
        timed.timer.stop();
    }
    raise(world, entity, kind);
}

/// Report the running step complete.
pub fn fire_timed(world: &mut World, entity: Entity) {
    match presence_state(world, entity) {
        Some(PresenceState::Appearing) => {
            debug!("timed presence {:?} finished appearing", entity);
            complete_appearing(world, entity);
        }
        Some(PresenceState::Disappearing) => {
            debug!("timed presence {:?} finished disappearing", entity);
            complete_disappearing(world, entity);
        }
        _ => {}
    }
}
