//! Presence coordination: setup, fan-out and the completion barrier.
//!
//! Every public trigger takes any presence entity, lazily sets it up, and
//! routes the request to the presence's core. The core fans the transition
//! out to its members and tracks who still owes a completion:
//!
//! ```text
//! start_appearing(e) ─▶ core: progress = {members}
//!                        ├─▶ member_appearing(m1) ... m1 finishes ─▶ complete_appearing(m1) ─┐
//!                        └─▶ member_appearing(m2) ... m2 finishes ─▶ complete_appearing(m2) ─┤
//!                                                                    progress empty ◀────────┘
//!                        core_appear_instantly ─▶ member_appeared(mN) ─▶ Appeared on core
//! ```
//!
//! All functions are synchronous and re-entrant. Listeners invoked from inside
//! a fan-out may trigger further transitions; a per-core epoch lets an outer
//! fan-out notice that it was superseded and stop.
//!
//! Calls naming a despawned entity or an entity without [`Presence`] are no-ops.

use std::sync::Arc;

use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use smallvec::SmallVec;

use crate::components::presence::{
    ListenerId, Presence, PresenceEventKind, PresenceListener, PresenceState,
};
use crate::components::presencecore::{Dormant, HidePolicy, InitialPresence, PresenceCore, PresenceHost};
use crate::components::presencesequence::PresenceSequence;
use crate::components::timedpresence::TimedPresence;
use crate::events::presence::{ActivateEvent, PresenceEvent};
use crate::resources::diagnostics::{PresenceDiagnostic, report};
use crate::resources::presenceconfig::PresenceConfig;
use crate::systems::sequence;
use crate::systems::timedpresence;

// =============================================================================
// Queries
// =============================================================================

pub fn presence_state(world: &World, entity: Entity) -> Option<PresenceState> {
    world.get::<Presence>(entity).map(|presence| presence.state)
}

/// `state != Hidden`. False for non-presences.
pub fn is_visible(world: &World, entity: Entity) -> bool {
    presence_state(world, entity).is_some_and(PresenceState::is_visible)
}

/// `state` is `Appearing` or `Visible`. False for non-presences.
pub fn is_heading_visible(world: &World, entity: Entity) -> bool {
    presence_state(world, entity).is_some_and(PresenceState::is_heading_visible)
}

/// The core a presence routes to, once set up.
pub fn core_of(world: &World, entity: Entity) -> Option<Entity> {
    world
        .get::<Presence>(entity)
        .and_then(|presence| presence.core)
        .filter(|core| is_core(world, *core))
}

pub fn is_core(world: &World, entity: Entity) -> bool {
    world.get::<PresenceCore>(entity).is_some() && world.get::<Presence>(entity).is_some()
}

fn members_of(world: &World, core: Entity) -> Vec<Entity> {
    world
        .get::<PresenceCore>(core)
        .map(|c| c.members.clone())
        .unwrap_or_default()
}

fn is_member(world: &World, core: Entity, entity: Entity) -> bool {
    world
        .get::<PresenceCore>(core)
        .is_some_and(|c| c.members.contains(&entity))
}

fn in_epoch(world: &World, core: Entity, epoch: u64) -> bool {
    world
        .get::<PresenceCore>(core)
        .is_some_and(|c| c.epoch == epoch)
}

// =============================================================================
// Spawning
// =============================================================================

/// Spawn a core presence for `object` and set it up immediately.
pub fn spawn_core(world: &mut World, object: Entity, core: PresenceCore) -> Entity {
    let entity = world.spawn((Presence::new(object), core, ChildOf(object))).id();
    setup_presence(world, entity);
    entity
}

/// Spawn a plain presence for `object`. It is set up lazily.
pub fn spawn_presence(world: &mut World, object: Entity) -> Entity {
    world.spawn((Presence::new(object), ChildOf(object))).id()
}

/// Spawn a presence that completes its steps after fixed durations.
pub fn spawn_timed_presence(
    world: &mut World,
    object: Entity,
    appear_duration: f32,
    disappear_duration: f32,
) -> Entity {
    world
        .spawn((
            Presence::new(object),
            TimedPresence::new(appear_duration, disappear_duration),
            ChildOf(object),
        ))
        .id()
}

/// Spawn a sequence presence for `object`. It is set up lazily.
pub fn spawn_sequence(world: &mut World, object: Entity, sequence: PresenceSequence) -> Entity {
    world
        .spawn((Presence::new(object), sequence, ChildOf(object)))
        .id()
}

// =============================================================================
// Listeners
// =============================================================================

/// Register a synchronous listener for one lifecycle event of `entity`.
pub fn subscribe(
    world: &mut World,
    entity: Entity,
    kind: PresenceEventKind,
    listener: impl Fn(&mut World, Entity) + Send + Sync + 'static,
) -> Option<ListenerId> {
    let mut presence = world.get_mut::<Presence>(entity)?;
    Some(presence.listeners.subscribe(kind, Arc::new(listener)))
}

pub fn unsubscribe(world: &mut World, entity: Entity, id: ListenerId) -> bool {
    world
        .get_mut::<Presence>(entity)
        .is_some_and(|mut presence| presence.listeners.unsubscribe(id))
}

/// Register a listener called when `core` activates its object.
pub fn subscribe_activate(
    world: &mut World,
    core: Entity,
    listener: impl Fn(&mut World, Entity) + Send + Sync + 'static,
) -> Option<ListenerId> {
    let mut core = world.get_mut::<PresenceCore>(core)?;
    Some(core.subscribe_activate(Arc::new(listener)))
}

pub fn unsubscribe_activate(world: &mut World, core: Entity, id: ListenerId) -> bool {
    world
        .get_mut::<PresenceCore>(core)
        .is_some_and(|mut core| core.unsubscribe_activate(id))
}

/// Set the state matching `kind` and notify observers and listeners.
pub(crate) fn raise(world: &mut World, entity: Entity, kind: PresenceEventKind) {
    let listeners = {
        let Some(mut presence) = world.get_mut::<Presence>(entity) else {
            return;
        };
        presence.state = kind.state();
        presence.listeners.snapshot(kind)
    };
    debug!("presence {:?}: {:?}", entity, kind);
    world.trigger(PresenceEvent { entity, kind });
    for listener in listeners {
        listener(world, entity);
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Resolve the core and register with it. Runs once per presence; later
/// calls return immediately.
pub fn setup_presence(world: &mut World, entity: Entity) {
    let object = {
        let Some(mut presence) = world.get_mut::<Presence>(entity) else {
            return;
        };
        if presence.is_setup {
            return;
        }
        presence.is_setup = true;
        presence.object
    };

    if world.get::<PresenceCore>(entity).is_some() {
        setup_core(world, entity, object);
        return;
    }

    let Some(core) = resolve_core(world, entity, object) else {
        warn!(
            "presence {:?} has no object {:?} to attach a core to",
            entity, object
        );
        if let Some(mut presence) = world.get_mut::<Presence>(entity) {
            presence.is_setup = false;
        }
        return;
    };
    if world.get::<PresenceSequence>(entity).is_some() {
        sequence::subscribe_targets(world, entity);
    }
    add_member(world, core, entity);
}

/// Set up every presence that has not been set up yet, cores first.
///
/// Run once per frame so freshly spawned presences settle even if nothing
/// triggers them.
pub fn setup_pending_presences(world: &mut World) {
    let mut query = world.query::<(Entity, &Presence, Has<PresenceCore>)>();
    let mut pending: Vec<(Entity, bool)> = query
        .iter(world)
        .filter(|(_, presence, _)| !presence.is_setup)
        .map(|(entity, _, is_core)| (entity, is_core))
        .collect();
    pending.sort_by_key(|(_, is_core)| !*is_core);
    for (entity, _) in pending {
        setup_presence(world, entity);
    }
}

fn setup_core(world: &mut World, core: Entity, object: Entity) {
    let hosted = world.get::<PresenceHost>(object).map(|host| host.core);
    match hosted {
        Some(existing) if existing != core && is_core(world, existing) => {
            report(
                world,
                PresenceDiagnostic::DuplicateCore {
                    object,
                    existing,
                    duplicate: core,
                },
            );
        }
        _ => {
            if let Ok(mut object_mut) = world.get_entity_mut(object) {
                object_mut.insert(PresenceHost { core });
            }
        }
    }

    let initial = world
        .get::<PresenceCore>(core)
        .map(|c| c.initial)
        .unwrap_or_default();
    let state = {
        let Some(mut presence) = world.get_mut::<Presence>(core) else {
            return;
        };
        presence.core = Some(core);
        presence.state
    };
    debug!("core {:?} set up for object {:?}", core, object);

    if state == PresenceState::Created {
        match initial {
            InitialPresence::Hidden => hide_fan_out(world, core),
            InitialPresence::Visible => core_appear_instantly(world, core),
        }
    }
}

/// Find the core for a presence: explicit wiring, then the object's host
/// record, then any core parented to the object. Spawns one from
/// [`PresenceConfig`] as a last resort.
fn resolve_core(world: &mut World, entity: Entity, object: Entity) -> Option<Entity> {
    let explicit = world
        .get::<Presence>(entity)
        .and_then(|presence| presence.core)
        .filter(|core| is_core(world, *core));
    let hosted = || {
        world
            .get::<PresenceHost>(object)
            .map(|host| host.core)
            .filter(|core| is_core(world, *core))
    };
    let attached = || {
        world.get::<Children>(object).and_then(|children| {
            children.iter().find(|child| {
                is_core(world, *child)
                    && world
                        .get::<Presence>(*child)
                        .is_some_and(|presence| presence.object == object)
            })
        })
    };

    let core = match explicit.or_else(hosted).or_else(attached) {
        Some(core) => core,
        None => {
            if world.get_entity(object).is_err() {
                return None;
            }
            let template = world
                .get_resource::<PresenceConfig>()
                .map(PresenceConfig::core)
                .unwrap_or_default();
            let core = world
                .spawn((Presence::new(object), template, ChildOf(object)))
                .id();
            debug!("created core {:?} for object {:?}", core, object);
            core
        }
    };

    if let Some(mut presence) = world.get_mut::<Presence>(entity) {
        presence.core = Some(core);
    }
    Some(core)
}

// =============================================================================
// Membership
// =============================================================================

/// Register `member` with `core` and bring it up to the core's current phase.
///
/// While a transition is open the member joins the barrier. Re-adding a
/// registered member does nothing.
pub fn add_member(world: &mut World, core: Entity, member: Entity) {
    if core == member || !is_core(world, core) || world.get::<Presence>(member).is_none() {
        return;
    }
    setup_presence(world, core);

    let epoch = {
        let Some(mut c) = world.get_mut::<PresenceCore>(core) else {
            return;
        };
        if c.members.contains(&member) {
            return;
        }
        c.members.push(member);
        c.epoch
    };
    let newly_setup = {
        let Some(mut presence) = world.get_mut::<Presence>(member) else {
            return;
        };
        presence.core = Some(core);
        let newly_setup = !presence.is_setup;
        presence.is_setup = true;
        newly_setup
    };
    if newly_setup && world.get::<PresenceSequence>(member).is_some() {
        sequence::subscribe_targets(world, member);
    }

    let Some(state) = presence_state(world, core) else {
        return;
    };
    debug!("core {:?} added member {:?} while {}", core, member, state);

    match state {
        PresenceState::Appearing => {
            join_barrier(world, core, member);
            member_appearing(world, member);
        }
        PresenceState::Visible => {
            member_appearing(world, member);
            if in_epoch(world, core, epoch) && is_member(world, core, member) {
                member_appeared(world, member);
            }
        }
        PresenceState::Disappearing => {
            join_barrier(world, core, member);
            member_disappearing(world, member);
        }
        PresenceState::Hidden | PresenceState::Created => member_hide(world, member),
    }
}

fn join_barrier(world: &mut World, core: Entity, member: Entity) {
    if let Some(mut c) = world.get_mut::<PresenceCore>(core) {
        if let Some(progress) = c.progress.as_mut() {
            progress.insert(member);
        }
    }
}

/// Unregister `member`. If it was holding up a transition, the transition
/// is re-checked. Removing a non-member does nothing.
pub fn remove_member(world: &mut World, core: Entity, member: Entity) {
    {
        let Some(mut c) = world.get_mut::<PresenceCore>(core) else {
            return;
        };
        let Some(index) = c.members.iter().position(|m| *m == member) else {
            return;
        };
        c.members.remove(index);
        if let Some(progress) = c.progress.as_mut() {
            progress.remove(&member);
        }
    }
    debug!("core {:?} removed member {:?}", core, member);
    detach(world, member, core);
    check_completion(world, core);
}

/// Forget the core; the next trigger re-resolves it.
fn detach(world: &mut World, member: Entity, core: Entity) {
    let was_attached = {
        let Some(mut presence) = world.get_mut::<Presence>(member) else {
            return;
        };
        if presence.core != Some(core) {
            return;
        }
        presence.core = None;
        presence.is_setup = false;
        true
    };
    if was_attached && world.get::<PresenceSequence>(member).is_some() {
        sequence::unsubscribe_targets(world, member);
    }
}

/// Unregister a presence and despawn it.
///
/// Despawning a core detaches its members and clears the object's host
/// record; despawning a member releases it from any open barrier. Sequences
/// listing the presence as a target drop it and re-check completion.
pub fn despawn_presence(world: &mut World, entity: Entity) {
    let Some((object, core)) = world
        .get::<Presence>(entity)
        .map(|presence| (presence.object, presence.core))
    else {
        return;
    };

    if is_core(world, entity) {
        for member in members_of(world, entity) {
            detach(world, member, entity);
        }
        if world
            .get::<PresenceHost>(object)
            .is_some_and(|host| host.core == entity)
        {
            if let Ok(mut object_mut) = world.get_entity_mut(object) {
                object_mut.remove::<PresenceHost>();
            }
        }
    } else if let Some(core) = core {
        remove_member(world, core, entity);
    }
    if world.get::<PresenceSequence>(entity).is_some() {
        sequence::unsubscribe_targets(world, entity);
    }
    sequence::release_target(world, entity);
    world.despawn(entity);
}

/// Despawn `object` with everything below it, unregistering every presence
/// attached to it or to its descendants first.
pub fn despawn_object(world: &mut World, object: Entity) {
    let mut subtree = vec![object];
    let mut cursor = 0;
    while cursor < subtree.len() {
        if let Some(children) = world.get::<Children>(subtree[cursor]) {
            subtree.extend(children.iter());
        }
        cursor += 1;
    }

    let mut query = world.query::<(Entity, &Presence, Has<PresenceCore>)>();
    let mut presences: Vec<(Entity, bool)> = query
        .iter(world)
        .filter(|(_, presence, _)| subtree.contains(&presence.object))
        .map(|(entity, _, is_core)| (entity, is_core))
        .collect();
    // Cores first so members are detached instead of completing barriers.
    presences.sort_by_key(|(_, is_core)| !*is_core);
    for (entity, _) in presences {
        despawn_presence(world, entity);
    }

    if world.get_entity(object).is_ok() {
        info!("despawning object {:?}", object);
        world.despawn(object);
    }
}

// =============================================================================
// Public triggers
// =============================================================================

fn routed_core(world: &mut World, entity: Entity) -> Option<Entity> {
    setup_presence(world, entity);
    core_of(world, entity)
}

/// Ask the object of `entity` to appear. No-op while appearing or visible.
pub fn start_appearing(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        core_start_appearing(world, core);
    }
}

/// Ask the object of `entity` to disappear. No-op while disappearing or hidden.
pub fn start_disappearing(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        core_start_disappearing(world, core);
    }
}

/// Report that `entity` finished its appearing step.
pub fn complete_appearing(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        complete_appear_step(world, core, entity);
    }
}

/// Report that `entity` finished its disappearing step.
pub fn complete_disappearing(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        complete_disappear_step(world, core, entity);
    }
}

/// Jump the object of `entity` to visible, raising `appearing` first if needed.
pub fn appear_instantly(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        core_appear_instantly(world, core);
    }
}

/// Jump the object of `entity` to hidden, raising `disappearing` first if needed.
pub fn disappear_instantly(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        core_disappear_instantly(world, core);
    }
}

/// Force the object of `entity` to hidden from any state, dropping any
/// transition in flight.
pub fn hide_instantly(world: &mut World, entity: Entity) {
    if let Some(core) = routed_core(world, entity) {
        core_hide(world, core);
    }
}

// =============================================================================
// Core transitions
// =============================================================================

/// Set the core's state and open a new epoch.
fn begin_transition(world: &mut World, core: Entity, state: PresenceState) -> Option<u64> {
    world.get_mut::<Presence>(core)?.state = state;
    let mut c = world.get_mut::<PresenceCore>(core)?;
    c.epoch += 1;
    Some(c.epoch)
}

fn clear_progress(world: &mut World, core: Entity) {
    if let Some(mut c) = world.get_mut::<PresenceCore>(core) {
        c.progress = None;
    }
}

fn open_barrier(world: &mut World, core: Entity, members: &[Entity]) {
    if let Some(mut c) = world.get_mut::<PresenceCore>(core) {
        c.progress = Some(members.iter().copied().collect());
    }
}

fn core_start_appearing(world: &mut World, core: Entity) {
    let Some(state) = presence_state(world, core) else {
        return;
    };
    if state.is_heading_visible() {
        return;
    }
    let members = members_of(world, core);
    if members.is_empty() {
        core_appear_instantly(world, core);
        return;
    }
    open_barrier(world, core, &members);
    fan_out_appearing(world, core);
}

/// Enter `appearing`: activate, notify the core's own listeners, then every
/// member. Returns the epoch of this transition.
fn fan_out_appearing(world: &mut World, core: Entity) -> Option<u64> {
    let members = members_of(world, core);
    let epoch = begin_transition(world, core, PresenceState::Appearing)?;
    activate(world, core);
    if !in_epoch(world, core, epoch) {
        return None;
    }
    raise(world, core, PresenceEventKind::Appearing);
    for member in members {
        if !in_epoch(world, core, epoch) {
            return None;
        }
        if is_member(world, core, member) {
            member_appearing(world, member);
        }
    }
    Some(epoch)
}

pub(crate) fn core_appear_instantly(world: &mut World, core: Entity) {
    let Some(state) = presence_state(world, core) else {
        return;
    };
    if state == PresenceState::Visible {
        return;
    }
    if state != PresenceState::Appearing {
        clear_progress(world, core);
        match fan_out_appearing(world, core) {
            Some(epoch) if in_epoch(world, core, epoch) => {}
            _ => return,
        }
    }

    let Some(epoch) = begin_transition(world, core, PresenceState::Visible) else {
        return;
    };
    clear_progress(world, core);
    for member in members_of(world, core) {
        if !in_epoch(world, core, epoch) {
            return;
        }
        if is_member(world, core, member) {
            member_appeared(world, member);
        }
    }
    if in_epoch(world, core, epoch) {
        raise(world, core, PresenceEventKind::Appeared);
    }
}

fn core_start_disappearing(world: &mut World, core: Entity) {
    let Some(state) = presence_state(world, core) else {
        return;
    };
    if matches!(
        state,
        PresenceState::Disappearing | PresenceState::Hidden | PresenceState::Created
    ) {
        return;
    }
    let members = members_of(world, core);
    if members.is_empty() {
        core_disappear_instantly(world, core);
        return;
    }
    open_barrier(world, core, &members);
    fan_out_disappearing(world, core);
}

fn fan_out_disappearing(world: &mut World, core: Entity) -> Option<u64> {
    let members = members_of(world, core);
    let epoch = begin_transition(world, core, PresenceState::Disappearing)?;
    raise(world, core, PresenceEventKind::Disappearing);
    for member in members {
        if !in_epoch(world, core, epoch) {
            return None;
        }
        if is_member(world, core, member) {
            member_disappearing(world, member);
        }
    }
    Some(epoch)
}

pub(crate) fn core_disappear_instantly(world: &mut World, core: Entity) {
    let Some(state) = presence_state(world, core) else {
        return;
    };
    if state == PresenceState::Hidden {
        return;
    }
    if state != PresenceState::Disappearing {
        clear_progress(world, core);
        match fan_out_disappearing(world, core) {
            Some(epoch) if in_epoch(world, core, epoch) => {}
            _ => return,
        }
    }

    let Some(epoch) = begin_transition(world, core, PresenceState::Hidden) else {
        return;
    };
    clear_progress(world, core);
    for member in members_of(world, core) {
        if !in_epoch(world, core, epoch) {
            return;
        }
        if is_member(world, core, member) {
            member_disappeared(world, member);
        }
    }
    if !in_epoch(world, core, epoch) {
        return;
    }
    raise(world, core, PresenceEventKind::Disappeared);
    if in_epoch(world, core, epoch) {
        hide_fan_out(world, core);
    }
}

fn core_hide(world: &mut World, core: Entity) {
    if presence_state(world, core) == Some(PresenceState::Hidden) {
        return;
    }
    hide_fan_out(world, core);
}

/// Enter `hidden` unconditionally: hide every member, notify, then apply the
/// hide policy to the object.
fn hide_fan_out(world: &mut World, core: Entity) {
    let members = members_of(world, core);
    let Some(epoch) = begin_transition(world, core, PresenceState::Hidden) else {
        return;
    };
    clear_progress(world, core);
    for member in members {
        if !in_epoch(world, core, epoch) {
            return;
        }
        if is_member(world, core, member) {
            member_hide(world, member);
        }
    }
    if !in_epoch(world, core, epoch) {
        return;
    }
    raise(world, core, PresenceEventKind::Hidden);
    if in_epoch(world, core, epoch) {
        deactivate(world, core);
    }
}

// =============================================================================
// Barrier
// =============================================================================

fn complete_appear_step(world: &mut World, core: Entity, entity: Entity) {
    if presence_state(world, core) == Some(PresenceState::Appearing) {
        complete_step(world, core, entity);
    }
}

fn complete_disappear_step(world: &mut World, core: Entity, entity: Entity) {
    if presence_state(world, core) == Some(PresenceState::Disappearing) {
        complete_step(world, core, entity);
    }
}

/// The core finishes through the instant paths, never by reporting to itself.
fn complete_step(world: &mut World, core: Entity, entity: Entity) {
    if entity == core {
        return;
    }
    if let Some(mut c) = world.get_mut::<PresenceCore>(core) {
        if let Some(progress) = c.progress.as_mut() {
            progress.remove(&entity);
        }
    }
    check_completion(world, core);
}

/// Finalise the open transition once nobody is left in the barrier.
fn check_completion(world: &mut World, core: Entity) {
    let done = {
        let Some(mut c) = world.get_mut::<PresenceCore>(core) else {
            return;
        };
        let done = c.progress.as_ref().is_some_and(|progress| progress.is_empty());
        if done {
            c.progress = None;
        }
        done
    };
    if !done {
        return;
    }
    match presence_state(world, core) {
        Some(PresenceState::Appearing) => core_appear_instantly(world, core),
        Some(PresenceState::Disappearing) => core_disappear_instantly(world, core),
        _ => {}
    }
}

// =============================================================================
// Member fan-out targets
// =============================================================================

pub(crate) fn member_appearing(world: &mut World, member: Entity) {
    if world.get::<PresenceSequence>(member).is_some() {
        sequence::sequence_appearing(world, member);
    } else if world.get::<TimedPresence>(member).is_some() {
        timedpresence::timed_appearing(world, member);
    } else {
        raise(world, member, PresenceEventKind::Appearing);
    }
}

pub(crate) fn member_appeared(world: &mut World, member: Entity) {
    if world.get::<PresenceSequence>(member).is_some() {
        sequence::sequence_settled(world, member, PresenceEventKind::Appeared);
    } else if world.get::<TimedPresence>(member).is_some() {
        timedpresence::timed_settled(world, member, PresenceEventKind::Appeared);
    } else {
        raise(world, member, PresenceEventKind::Appeared);
    }
}

pub(crate) fn member_disappearing(world: &mut World, member: Entity) {
    if world.get::<PresenceSequence>(member).is_some() {
        sequence::sequence_disappearing(world, member);
    } else if world.get::<TimedPresence>(member).is_some() {
        timedpresence::timed_disappearing(world, member);
    } else {
        raise(world, member, PresenceEventKind::Disappearing);
    }
}

pub(crate) fn member_disappeared(world: &mut World, member: Entity) {
    if world.get::<PresenceSequence>(member).is_some() {
        sequence::sequence_settled(world, member, PresenceEventKind::Disappeared);
    } else if world.get::<TimedPresence>(member).is_some() {
        timedpresence::timed_settled(world, member, PresenceEventKind::Disappeared);
    } else {
        raise(world, member, PresenceEventKind::Disappeared);
    }
}

pub(crate) fn member_hide(world: &mut World, member: Entity) {
    if world.get::<PresenceSequence>(member).is_some() {
        sequence::sequence_settled(world, member, PresenceEventKind::Hidden);
    } else if world.get::<TimedPresence>(member).is_some() {
        timedpresence::timed_settled(world, member, PresenceEventKind::Hidden);
    } else {
        raise(world, member, PresenceEventKind::Hidden);
    }
}

// =============================================================================
// Object activation
// =============================================================================

/// Activate the object if the core does not already hold it active.
fn activate(world: &mut World, core: Entity) {
    let listeners: SmallVec<[PresenceListener; 2]> = {
        let Some(mut c) = world.get_mut::<PresenceCore>(core) else {
            return;
        };
        if c.active {
            return;
        }
        c.active = true;
        c.activate_listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    };
    let Some(object) = world.get::<Presence>(core).map(|presence| presence.object) else {
        return;
    };
    if let Ok(mut object_mut) = world.get_entity_mut(object) {
        object_mut.remove::<Dormant>();
    }
    debug!("core {:?} activated object {:?}", core, object);
    world.trigger(ActivateEvent { object, core });
    for listener in listeners {
        listener(world, core);
    }
}

/// Apply the core's [`HidePolicy`] after it reached `hidden`.
fn deactivate(world: &mut World, core: Entity) {
    let Some((policy, active)) = world
        .get::<PresenceCore>(core)
        .map(|c| (c.policy, c.active))
    else {
        return;
    };
    let Some(object) = world.get::<Presence>(core).map(|presence| presence.object) else {
        return;
    };

    match policy {
        HidePolicy::KeepActive => {}
        HidePolicy::Destroy if active => despawn_object(world, object),
        HidePolicy::Deactivate | HidePolicy::Destroy => {
            if let Some(mut c) = world.get_mut::<PresenceCore>(core) {
                c.active = false;
            }
            if let Ok(mut object_mut) = world.get_entity_mut(object) {
                object_mut.insert(Dormant);
            }
        }
    }
}
