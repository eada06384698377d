//! Sequence stepping.
//!
//! A sequence reacts to its core's fan-out by walking its target list:
//!
//! - `appearing`: wait `appear_delay`, then start each target with
//!   `appear_step_delay` between them. The sequence reports its own step
//!   complete once every target is `visible`.
//! - `disappearing`: the same with the disappear delays, walking backwards
//!   when `reverse_on_disappear` is set. Completes once every target is
//!   `hidden`.
//! - `appeared` / `disappeared` / hide: stop all timers and push the instant
//!   transition to every target.
//!
//! Completion is detected by re-scanning the whole target list every time any
//! target reaches `visible` or `hidden`, so duplicate notifications and
//! targets added or removed mid-cascade cannot confuse it.
//!
//! Timers are advanced by [`update_presence_timers`](crate::systems::time::update_presence_timers),
//! which calls [`fire_timer`] for every timer that runs out.

use bevy_ecs::hierarchy::Children;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::presence::{Presence, PresenceEventKind, PresenceState};
use crate::components::presencecore::PresenceHost;
use crate::components::presencesequence::{PresenceSequence, SequenceTimer, TargetSubscription};
use crate::systems::presence::{
    self, appear_instantly, complete_appearing, complete_disappearing, disappear_instantly,
    hide_instantly, presence_state, raise, start_appearing, start_disappearing,
};

fn cycle_of(world: &World, seq: Entity) -> Option<u64> {
    world.get::<PresenceSequence>(seq).map(|s| s.cycle)
}

/// Stop the timers of one direction and start a new stepping cycle.
fn restart_cycle(world: &mut World, seq: Entity, stop: fn(&mut PresenceSequence)) -> Option<u64> {
    let mut s = world.get_mut::<PresenceSequence>(seq)?;
    stop(&mut *s);
    s.cycle += 1;
    Some(s.cycle)
}

// =============================================================================
// Fan-out reactions
// =============================================================================

pub(crate) fn sequence_appearing(world: &mut World, seq: Entity) {
    let Some(cycle) = restart_cycle(world, seq, PresenceSequence::stop_disappear_timers) else {
        return;
    };
    raise(world, seq, PresenceEventKind::Appearing);
    if cycle_of(world, seq) != Some(cycle) {
        return;
    }
    let Some((empty, delay)) = world
        .get::<PresenceSequence>(seq)
        .map(|s| (s.targets.is_empty(), s.timing.appear_delay))
    else {
        return;
    };
    if empty {
        complete_appearing(world, seq);
    } else if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.appear_delay.run(delay);
    }
}

pub(crate) fn sequence_disappearing(world: &mut World, seq: Entity) {
    let Some(cycle) = restart_cycle(world, seq, PresenceSequence::stop_appear_timers) else {
        return;
    };
    raise(world, seq, PresenceEventKind::Disappearing);
    if cycle_of(world, seq) != Some(cycle) {
        return;
    }
    let Some((empty, delay)) = world
        .get::<PresenceSequence>(seq)
        .map(|s| (s.targets.is_empty(), s.timing.disappear_delay))
    else {
        return;
    };
    if empty {
        complete_disappearing(world, seq);
    } else if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.disappear_delay.run(delay);
    }
}

/// Instant transition: `kind` is `Appeared`, `Disappeared` or `Hidden`.
pub(crate) fn sequence_settled(world: &mut World, seq: Entity, kind: PresenceEventKind) {
    let Some(cycle) = restart_cycle(world, seq, PresenceSequence::stop_all_timers) else {
        return;
    };
    let targets = world
        .get::<PresenceSequence>(seq)
        .map(|s| s.targets.clone())
        .unwrap_or_default();
    for target in targets {
        if cycle_of(world, seq) != Some(cycle) {
            return;
        }
        match kind {
            PresenceEventKind::Appeared => appear_instantly(world, target),
            PresenceEventKind::Disappeared => disappear_instantly(world, target),
            _ => hide_instantly(world, target),
        }
    }
    if cycle_of(world, seq) != Some(cycle) {
        return;
    }

    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        let last = s.last_index();
        match (kind, s.reverse_on_disappear) {
            (PresenceEventKind::Appeared, true) => {
                s.appear_step = last;
                s.disappear_step = last;
            }
            (PresenceEventKind::Appeared, false) => s.appear_step = last,
            (_, true) => {
                s.appear_step = 0;
                s.disappear_step = 0;
            }
            (_, false) => s.disappear_step = last,
        }
    }
    raise(world, seq, kind);
}

// =============================================================================
// Timers
// =============================================================================

/// Continue the cascade after `which` ran out.
pub fn fire_timer(world: &mut World, seq: Entity, which: SequenceTimer) {
    debug!("sequence {:?}: {:?} fired", seq, which);
    match which {
        SequenceTimer::AppearDelay => begin_appear_steps(world, seq),
        SequenceTimer::AppearStep => next_step_appear(world, seq),
        SequenceTimer::DisappearDelay => begin_disappear_steps(world, seq),
        SequenceTimer::DisappearStep => next_step_disappear(world, seq),
    }
}

fn begin_appear_steps(world: &mut World, seq: Entity) {
    let Some((targets, reverse, synced)) = world
        .get::<PresenceSequence>(seq)
        .map(|s| (s.targets.clone(), s.reverse_on_disappear, s.appear_step))
    else {
        return;
    };
    if targets.is_empty() {
        check_appeared(world, seq);
        return;
    }
    // Reverse mode resumes where the last reverse disappear stopped.
    let start = if reverse {
        let first_pending = targets
            .iter()
            .position(|t| !presence_state(world, *t).is_some_and(PresenceState::is_heading_visible))
            .unwrap_or(targets.len() - 1);
        synced.min(first_pending).min(targets.len() - 1)
    } else {
        0
    };
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.stop_disappear_timers();
        s.appear_step = start;
    }
    trigger_step_appear(world, seq);
}

fn trigger_step_appear(world: &mut World, seq: Entity) {
    let Some((target, cycle, is_last, delay)) = world.get::<PresenceSequence>(seq).and_then(|s| {
        let target = *s.targets.get(s.appear_step)?;
        Some((
            target,
            s.cycle,
            s.appear_step >= s.last_index(),
            s.timing.appear_step_delay,
        ))
    }) else {
        check_appeared(world, seq);
        return;
    };

    debug!("sequence {:?}: appear target {:?}", seq, target);
    start_appearing(world, target);

    if cycle_of(world, seq) == Some(cycle) {
        if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
            if is_last {
                s.appear_step_delay.stop();
            } else {
                s.appear_step_delay.run(delay);
            }
        }
    }
    check_appeared(world, seq);
}

fn next_step_appear(world: &mut World, seq: Entity) {
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.appear_step = (s.appear_step + 1).min(s.last_index());
        if s.reverse_on_disappear {
            s.disappear_step = s.appear_step;
        }
    }
    trigger_step_appear(world, seq);
}

fn begin_disappear_steps(world: &mut World, seq: Entity) {
    let Some((targets, reverse, synced)) = world
        .get::<PresenceSequence>(seq)
        .map(|s| (s.targets.clone(), s.reverse_on_disappear, s.disappear_step))
    else {
        return;
    };
    if targets.is_empty() {
        check_hidden(world, seq);
        return;
    }
    let start = if reverse {
        let last_shown = targets
            .iter()
            .rposition(|t| presence_state(world, *t).is_some_and(|state| state != PresenceState::Hidden))
            .unwrap_or(0);
        synced.max(last_shown).min(targets.len() - 1)
    } else {
        0
    };
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.stop_appear_timers();
        s.disappear_step = start;
    }
    trigger_step_disappear(world, seq);
}

fn trigger_step_disappear(world: &mut World, seq: Entity) {
    let Some((target, cycle, at_boundary, delay)) =
        world.get::<PresenceSequence>(seq).and_then(|s| {
            let target = *s.targets.get(s.disappear_step)?;
            let boundary = if s.reverse_on_disappear { 0 } else { s.last_index() };
            Some((
                target,
                s.cycle,
                s.disappear_step == boundary,
                s.timing.disappear_step_delay,
            ))
        })
    else {
        check_hidden(world, seq);
        return;
    };

    debug!("sequence {:?}: disappear target {:?}", seq, target);
    start_disappearing(world, target);

    if cycle_of(world, seq) == Some(cycle) {
        if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
            if at_boundary {
                s.disappear_step_delay.stop();
            } else {
                s.disappear_step_delay.run(delay);
            }
        }
    }
    check_hidden(world, seq);
}

fn next_step_disappear(world: &mut World, seq: Entity) {
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        if s.reverse_on_disappear {
            s.disappear_step = s.disappear_step.saturating_sub(1);
            s.appear_step = s.disappear_step;
        } else {
            s.disappear_step = (s.disappear_step + 1).min(s.last_index());
        }
    }
    trigger_step_disappear(world, seq);
}

// =============================================================================
// Completion
// =============================================================================

/// Targets that still exist. Despawned targets no longer hold up completion.
fn live_target_states(world: &World, seq: Entity) -> Vec<PresenceState> {
    world
        .get::<PresenceSequence>(seq)
        .map(|s| {
            s.targets
                .iter()
                .filter_map(|t| presence_state(world, *t))
                .collect()
        })
        .unwrap_or_default()
}

fn check_appeared(world: &mut World, seq: Entity) {
    if presence_state(world, seq) != Some(PresenceState::Appearing) {
        return;
    }
    if live_target_states(world, seq)
        .iter()
        .all(|state| *state == PresenceState::Visible)
    {
        debug!("sequence {:?}: all targets visible", seq);
        complete_appearing(world, seq);
    }
}

fn check_hidden(world: &mut World, seq: Entity) {
    if presence_state(world, seq) != Some(PresenceState::Disappearing) {
        return;
    }
    if live_target_states(world, seq)
        .iter()
        .all(|state| *state == PresenceState::Hidden)
    {
        debug!("sequence {:?}: all targets hidden", seq);
        complete_disappearing(world, seq);
    }
}

// =============================================================================
// Targets
// =============================================================================

fn subscribe_target(world: &mut World, seq: Entity, target: Entity) {
    let already = world
        .get::<PresenceSequence>(seq)
        .is_none_or(|s| s.subscriptions.iter().any(|sub| sub.target == target));
    if already {
        return;
    }
    let Some(appeared) = presence::subscribe(
        world,
        target,
        PresenceEventKind::Appeared,
        move |world: &mut World, _: Entity| check_appeared(world, seq),
    ) else {
        return;
    };
    let Some(hidden) = presence::subscribe(
        world,
        target,
        PresenceEventKind::Hidden,
        move |world: &mut World, _: Entity| check_hidden(world, seq),
    ) else {
        presence::unsubscribe(world, target, appeared);
        return;
    };
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.subscriptions.push(TargetSubscription {
            target,
            appeared,
            hidden,
        });
    }
}

fn unsubscribe_target(world: &mut World, seq: Entity, target: Entity) {
    let removed = world.get_mut::<PresenceSequence>(seq).and_then(|mut s| {
        let index = s.subscriptions.iter().position(|sub| sub.target == target)?;
        Some(s.subscriptions.remove(index))
    });
    if let Some(sub) = removed {
        presence::unsubscribe(world, sub.target, sub.appeared);
        presence::unsubscribe(world, sub.target, sub.hidden);
    }
}

/// Listen for every target reaching `visible` or `hidden`.
pub(crate) fn subscribe_targets(world: &mut World, seq: Entity) {
    let targets = world
        .get::<PresenceSequence>(seq)
        .map(|s| s.targets.clone())
        .unwrap_or_default();
    for target in targets {
        subscribe_target(world, seq, target);
    }
}

pub(crate) fn unsubscribe_targets(world: &mut World, seq: Entity) {
    let subscriptions = world
        .get_mut::<PresenceSequence>(seq)
        .map(|mut s| std::mem::take(&mut s.subscriptions))
        .unwrap_or_default();
    for sub in subscriptions {
        presence::unsubscribe(world, sub.target, sub.appeared);
        presence::unsubscribe(world, sub.target, sub.hidden);
    }
}

fn is_listening(world: &World, seq: Entity) -> bool {
    world
        .get::<Presence>(seq)
        .is_some_and(|presence| presence.is_setup)
}

/// Replace the target list.
pub fn set_sequence_targets(world: &mut World, seq: Entity, targets: Vec<Entity>) {
    if world.get::<PresenceSequence>(seq).is_none() {
        return;
    }
    unsubscribe_targets(world, seq);
    if let Some(mut s) = world.get_mut::<PresenceSequence>(seq) {
        s.appear_step = s.appear_step.min(targets.len().saturating_sub(1));
        s.disappear_step = s.disappear_step.min(targets.len().saturating_sub(1));
        s.targets = targets;
    }
    if is_listening(world, seq) {
        subscribe_targets(world, seq);
    }
    check_appeared(world, seq);
    check_hidden(world, seq);
}

/// Append `target` unless it is already listed.
pub fn add_sequence_target(world: &mut World, seq: Entity, target: Entity) {
    let added = world.get_mut::<PresenceSequence>(seq).is_some_and(|mut s| {
        if s.targets.contains(&target) {
            return false;
        }
        s.targets.push(target);
        true
    });
    if added && is_listening(world, seq) {
        subscribe_target(world, seq, target);
    }
}

/// Drop `target` from the list. A cascade waiting on it is re-checked.
pub fn remove_sequence_target(world: &mut World, seq: Entity, target: Entity) {
    let removed = world.get_mut::<PresenceSequence>(seq).is_some_and(|mut s| {
        let Some(index) = s.targets.iter().position(|t| *t == target) else {
            return false;
        };
        s.targets.remove(index);
        let last = s.last_index();
        s.appear_step = s.appear_step.min(last);
        s.disappear_step = s.disappear_step.min(last);
        true
    });
    if !removed {
        return;
    }
    unsubscribe_target(world, seq, target);
    check_appeared(world, seq);
    check_hidden(world, seq);
}

/// Drop `target` from every sequence that lists it.
pub(crate) fn release_target(world: &mut World, target: Entity) {
    let mut query = world.query::<(Entity, &PresenceSequence)>();
    let listing: Vec<Entity> = query
        .iter(world)
        .filter(|(seq, s)| *seq != target && s.targets.contains(&target))
        .map(|(seq, _)| seq)
        .collect();
    for seq in listing {
        debug!("sequence {:?}: target {:?} despawned", seq, target);
        remove_sequence_target(world, seq, target);
    }
}

/// Nearest presence in each branch below the sequence's object.
///
/// Depth first, in child order. A node that hosts a core contributes that
/// core; otherwise its first presence child. Descent stops at the first hit
/// and presence entities themselves are never descended into.
pub fn collect_sequence_targets(world: &World, seq: Entity) -> Vec<Entity> {
    let Some(object) = world.get::<Presence>(seq).map(|presence| presence.object) else {
        return Vec::new();
    };
    let mut targets = Vec::new();
    let mut stack: Vec<Entity> = child_objects(world, object);
    stack.reverse();
    while let Some(node) = stack.pop() {
        if let Some(found) = presence_on(world, node) {
            targets.push(found);
            continue;
        }
        let mut children = child_objects(world, node);
        children.reverse();
        stack.extend(children);
    }
    targets
}

/// Replace the target list with [`collect_sequence_targets`].
pub fn populate_sequence(world: &mut World, seq: Entity) {
    let targets = collect_sequence_targets(world, seq);
    debug!("sequence {:?}: collected {} targets", seq, targets.len());
    set_sequence_targets(world, seq, targets);
}

fn child_objects(world: &World, node: Entity) -> Vec<Entity> {
    world
        .get::<Children>(node)
        .map(|children| {
            children
                .iter()
                .filter(|child| world.get::<Presence>(*child).is_none())
                .collect()
        })
        .unwrap_or_default()
}

fn presence_on(world: &World, node: Entity) -> Option<Entity> {
    if let Some(core) = world.get::<PresenceHost>(node).map(|host| host.core) {
        if world.get::<Presence>(core).is_some() {
            return Some(core);
        }
    }
    world.get::<Children>(node).and_then(|children| {
        children.iter().find(|child| {
            world
                .get::<Presence>(*child)
                .is_some_and(|presence| presence.object == node)
        })
    })
}
