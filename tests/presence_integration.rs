//! Integration tests for presence cores: fan-out, the completion barrier,
//! membership changes and hide policies.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test presence_integration
//! ```

use std::sync::{Arc, Mutex};

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use apparition::components::presence::{Presence, PresenceEventKind, PresenceState};
use apparition::components::presencecore::{
    Dormant, HidePolicy, InitialPresence, PresenceCore, PresenceHost,
};
use apparition::components::timedpresence::TimedPresence;
use apparition::events::presence::{ActivateEvent, PresenceEvent};
use apparition::resources::diagnostics::{PresenceDiagnostic, PresenceDiagnostics};
use apparition::resources::presenceconfig::PresenceConfig;
use apparition::systems::presence::{
    add_member, appear_instantly, complete_appearing, complete_disappearing, core_of, despawn_object,
    despawn_presence, disappear_instantly, hide_instantly, is_heading_visible, is_visible,
    presence_state, remove_member, setup_pending_presences, setup_presence, spawn_core,
    spawn_presence, spawn_timed_presence, start_appearing, start_disappearing, subscribe,
    subscribe_activate, unsubscribe,
};
use apparition::systems::time::update_presence_timers;

type Log = Arc<Mutex<Vec<(Entity, PresenceEventKind)>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Record every lifecycle event of `entity` into `log`.
fn record(world: &mut World, entity: Entity, log: &Log) {
    for kind in PresenceEventKind::ALL {
        let log = log.clone();
        subscribe(world, entity, kind, move |_: &mut World, e: Entity| {
            log.lock().unwrap().push((e, kind));
        });
    }
}

fn events_of(log: &Log, entity: Entity) -> Vec<PresenceEventKind> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(e, _)| *e == entity)
        .map(|(_, kind)| *kind)
        .collect()
}

fn state(world: &World, entity: Entity) -> PresenceState {
    presence_state(world, entity).unwrap()
}

fn pending(world: &World, core: Entity) -> Option<usize> {
    world.get::<PresenceCore>(core).unwrap().pending()
}

/// Object with a set-up core and `n` set-up plain members.
fn object_with_members(world: &mut World, policy: HidePolicy, n: usize) -> (Entity, Entity, Vec<Entity>) {
    let object = world.spawn_empty().id();
    let core = spawn_core(world, object, PresenceCore::new(policy));
    let members: Vec<Entity> = (0..n).map(|_| spawn_presence(world, object)).collect();
    world.flush();
    for member in &members {
        setup_presence(world, *member);
    }
    (object, core, members)
}

// =============================================================================
// Setup
// =============================================================================

#[test]
fn core_setup_hides_and_records_host() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let core = spawn_core(&mut world, object, PresenceCore::new(HidePolicy::Deactivate));

    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert_eq!(world.get::<PresenceHost>(object).unwrap().core, core);
    assert!(world.get::<Dormant>(object).is_some());
    assert_eq!(core_of(&world, core), Some(core));
}

#[test]
fn core_with_visible_initial_state_starts_visible() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let core = spawn_core(
        &mut world,
        object,
        PresenceCore::new(HidePolicy::Deactivate).with_initial(InitialPresence::Visible),
    );

    assert_eq!(state(&world, core), PresenceState::Visible);
    assert!(world.get::<Dormant>(object).is_none());
    assert!(world.get::<PresenceCore>(core).unwrap().is_active());
}

#[test]
fn setup_is_idempotent() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    setup_presence(&mut world, members[0]);
    setup_presence(&mut world, members[0]);
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members(), &members[..]);
    assert_eq!(state(&world, members[0]), PresenceState::Hidden);
}

#[test]
fn first_trigger_sets_up_lazily_and_creates_core() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let presence = spawn_presence(&mut world, object);
    world.flush();
    assert_eq!(state(&world, presence), PresenceState::Created);

    start_appearing(&mut world, presence);

    let core = core_of(&world, presence).expect("core created on first trigger");
    assert_ne!(core, presence);
    assert_eq!(world.get::<PresenceHost>(object).unwrap().core, core);
    assert_eq!(state(&world, core), PresenceState::Appearing);
    assert_eq!(state(&world, presence), PresenceState::Appearing);
}

#[test]
fn implicit_core_uses_config_defaults() {
    let mut world = World::new();
    let mut config = PresenceConfig::new();
    config.hide_policy = HidePolicy::KeepActive;
    world.insert_resource(config);

    let object = world.spawn_empty().id();
    let presence = spawn_presence(&mut world, object);
    world.flush();
    setup_presence(&mut world, presence);

    let core = core_of(&world, presence).unwrap();
    assert_eq!(
        world.get::<PresenceCore>(core).unwrap().policy,
        HidePolicy::KeepActive
    );
}

#[test]
fn explicit_core_wiring_wins_over_object_lookup() {
    let mut world = World::new();
    let shared_object = world.spawn_empty().id();
    let shared = spawn_core(&mut world, shared_object, PresenceCore::default());
    let object = world.spawn_empty().id();
    let presence = world
        .spawn((Presence::with_core(object, shared), ChildOf(object)))
        .id();
    world.flush();

    start_appearing(&mut world, presence);

    assert_eq!(core_of(&world, presence), Some(shared));
    assert!(world.get::<PresenceHost>(object).is_none());
    assert_eq!(state(&world, shared), PresenceState::Appearing);
}

#[test]
fn setup_pending_presences_finds_existing_core() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let member = spawn_presence(&mut world, object);
    let core = world
        .spawn((
            Presence::new(object),
            PresenceCore::new(HidePolicy::Deactivate),
            ChildOf(object),
        ))
        .id();
    world.flush();

    setup_pending_presences(&mut world);

    assert_eq!(core_of(&world, member), Some(core));
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members(), &[member]);
    assert_eq!(state(&world, member), PresenceState::Hidden);
}

#[test]
fn duplicate_core_is_reported_and_runs_standalone() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let first = spawn_core(&mut world, object, PresenceCore::default());
    let second = spawn_core(&mut world, object, PresenceCore::default());

    let diagnostics = world.resource::<PresenceDiagnostics>();
    assert_eq!(diagnostics.entries.len(), 1);
    assert_eq!(
        diagnostics.entries[0],
        PresenceDiagnostic::DuplicateCore {
            object,
            existing: first,
            duplicate: second,
        }
    );
    assert_eq!(world.get::<PresenceHost>(object).unwrap().core, first);

    start_appearing(&mut world, second);
    assert_eq!(state(&world, second), PresenceState::Visible);
    assert_eq!(state(&world, first), PresenceState::Hidden);
}

// =============================================================================
// Zero members
// =============================================================================

#[test]
fn core_without_members_completes_instantly_without_progress() {
    let mut world = World::new();
    let (_, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 0);
    let log = new_log();
    record(&mut world, core, &log);

    start_appearing(&mut world, core);
    assert_eq!(pending(&world, core), None);
    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(
        events_of(&log, core),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );

    start_disappearing(&mut world, core);
    assert_eq!(pending(&world, core), None);
    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert_eq!(
        events_of(&log, core)[2..],
        [
            PresenceEventKind::Disappearing,
            PresenceEventKind::Disappeared,
            PresenceEventKind::Hidden
        ]
    );
}

// =============================================================================
// Barrier
// =============================================================================

#[test]
fn core_waits_for_every_member() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    let log = new_log();
    record(&mut world, core, &log);
    for member in &members {
        record(&mut world, *member, &log);
    }

    start_appearing(&mut world, core);
    assert_eq!(state(&world, core), PresenceState::Appearing);
    assert_eq!(pending(&world, core), Some(2));
    assert!(members.iter().all(|m| state(&world, *m) == PresenceState::Appearing));

    complete_appearing(&mut world, members[0]);
    assert_eq!(state(&world, core), PresenceState::Appearing);
    assert_eq!(pending(&world, core), Some(1));
    assert!(!events_of(&log, core).contains(&PresenceEventKind::Appeared));

    complete_appearing(&mut world, members[1]);
    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(pending(&world, core), None);
    assert!(members.iter().all(|m| state(&world, *m) == PresenceState::Visible));

    // Members hear `appeared` before the core does.
    let order = log.lock().unwrap().clone();
    let core_appeared = order
        .iter()
        .position(|entry| *entry == (core, PresenceEventKind::Appeared))
        .unwrap();
    for member in &members {
        let member_appeared = order
            .iter()
            .position(|entry| *entry == (*member, PresenceEventKind::Appeared))
            .unwrap();
        assert!(member_appeared < core_appeared);
    }
}

#[test]
fn start_appearing_twice_fires_once() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    let log = new_log();
    record(&mut world, core, &log);
    record(&mut world, members[0], &log);

    start_appearing(&mut world, core);
    start_appearing(&mut world, members[0]);
    complete_appearing(&mut world, members[0]);
    start_appearing(&mut world, core);

    assert_eq!(
        events_of(&log, core),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
    assert_eq!(
        events_of(&log, members[0]),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
}

#[test]
fn redundant_completions_are_ignored() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);

    start_appearing(&mut world, core);
    complete_appearing(&mut world, members[0]);
    complete_appearing(&mut world, members[0]);
    complete_disappearing(&mut world, members[1]);
    complete_appearing(&mut world, core);

    assert_eq!(state(&world, core), PresenceState::Appearing);
    assert_eq!(pending(&world, core), Some(1));
    assert!(world.get::<PresenceCore>(core).unwrap().is_pending(members[1]));
}

#[test]
fn disappearing_waits_then_hides() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    appear_instantly(&mut world, core);
    let log = new_log();
    record(&mut world, core, &log);

    start_disappearing(&mut world, members[1]);
    assert_eq!(state(&world, core), PresenceState::Disappearing);
    assert_eq!(pending(&world, core), Some(2));
    assert!(world.get::<Dormant>(object).is_none());

    complete_disappearing(&mut world, members[0]);
    complete_disappearing(&mut world, members[1]);

    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert!(members.iter().all(|m| state(&world, *m) == PresenceState::Hidden));
    assert_eq!(
        events_of(&log, core),
        vec![
            PresenceEventKind::Disappearing,
            PresenceEventKind::Disappeared,
            PresenceEventKind::Hidden
        ]
    );
    assert!(world.get::<Dormant>(object).is_some());
}

#[test]
fn start_disappearing_while_hidden_is_noop() {
    let mut world = World::new();
    let (_, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    let log = new_log();
    record(&mut world, core, &log);

    start_disappearing(&mut world, core);
    assert!(events_of(&log, core).is_empty());
    assert_eq!(state(&world, core), PresenceState::Hidden);
}

#[test]
fn listener_completing_synchronously_finishes_transition() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    subscribe(
        &mut world,
        members[0],
        PresenceEventKind::Appearing,
        |world: &mut World, e: Entity| complete_appearing(world, e),
    );

    start_appearing(&mut world, core);

    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(state(&world, members[0]), PresenceState::Visible);
    assert_eq!(pending(&world, core), None);
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let mut world = World::new();
    let (_, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 0);
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let id = subscribe(
        &mut world,
        core,
        PresenceEventKind::Appearing,
        move |_: &mut World, _: Entity| *counter.lock().unwrap() += 1,
    )
    .unwrap();

    assert!(unsubscribe(&mut world, core, id));
    assert!(!unsubscribe(&mut world, core, id));
    start_appearing(&mut world, core);
    assert_eq!(*calls.lock().unwrap(), 0);
}

// =============================================================================
// Instant paths
// =============================================================================

#[test]
fn appear_instantly_raises_appearing_first() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    let log = new_log();
    record(&mut world, core, &log);
    record(&mut world, members[0], &log);

    appear_instantly(&mut world, members[1]);

    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(pending(&world, core), None);
    assert_eq!(
        events_of(&log, core),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
    assert_eq!(
        events_of(&log, members[0]),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
}

#[test]
fn disappear_instantly_from_visible() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    appear_instantly(&mut world, core);
    let log = new_log();
    record(&mut world, members[0], &log);

    disappear_instantly(&mut world, core);

    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert_eq!(
        events_of(&log, members[0]),
        vec![
            PresenceEventKind::Disappearing,
            PresenceEventKind::Disappeared,
            PresenceEventKind::Hidden
        ]
    );
}

#[test]
fn hide_instantly_overrides_transition_in_flight() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    let log = new_log();
    record(&mut world, core, &log);

    start_appearing(&mut world, core);
    complete_appearing(&mut world, members[0]);
    hide_instantly(&mut world, members[1]);

    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert_eq!(pending(&world, core), None);
    assert!(members.iter().all(|m| state(&world, *m) == PresenceState::Hidden));
    assert!(world.get::<Dormant>(object).is_some());
    assert_eq!(
        events_of(&log, core),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Hidden]
    );

    // Late completion from the aborted transition changes nothing.
    complete_appearing(&mut world, members[1]);
    assert_eq!(state(&world, core), PresenceState::Hidden);

    hide_instantly(&mut world, core);
    assert_eq!(
        events_of(&log, core)
            .iter()
            .filter(|kind| **kind == PresenceEventKind::Hidden)
            .count(),
        1
    );
}

#[test]
fn hide_instantly_stops_timed_members() {
    let mut world = World::new();
    let object = world.spawn_empty().id();
    let core = spawn_core(&mut world, object, PresenceCore::default());
    let timed = spawn_timed_presence(&mut world, object, 1.0, 1.0);
    world.flush();
    setup_presence(&mut world, timed);

    start_appearing(&mut world, core);
    assert!(world.get::<TimedPresence>(timed).unwrap().timer().is_running());

    hide_instantly(&mut world, core);
    assert!(!world.get::<TimedPresence>(timed).unwrap().timer().is_running());
    update_presence_timers(&mut world, 2.0);
    assert_eq!(state(&world, core), PresenceState::Hidden);
}

// =============================================================================
// Membership changes
// =============================================================================

#[test]
fn removing_member_mid_appear_releases_barrier() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 3);

    start_appearing(&mut world, core);
    complete_appearing(&mut world, members[0]);
    remove_member(&mut world, core, members[1]);
    assert_eq!(pending(&world, core), Some(1));
    assert_eq!(core_of(&world, members[1]), None);

    complete_appearing(&mut world, members[2]);
    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members().len(), 2);
}

#[test]
fn removing_last_pending_member_completes() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);

    start_appearing(&mut world, core);
    complete_appearing(&mut world, members[0]);
    remove_member(&mut world, core, members[1]);

    assert_eq!(state(&world, core), PresenceState::Visible);
    // Removing again is a no-op.
    remove_member(&mut world, core, members[1]);
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members(), &members[..1]);
}

#[test]
fn adding_and_removing_members_is_idempotent() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    let late = spawn_presence(&mut world, object);
    world.flush();
    let log = new_log();
    record(&mut world, core, &log);
    record(&mut world, members[1], &log);
    record(&mut world, late, &log);

    start_appearing(&mut world, core);
    complete_appearing(&mut world, members[0]);
    assert_eq!(pending(&world, core), Some(1));

    add_member(&mut world, core, late);
    add_member(&mut world, core, late);
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members().len(), 3);
    assert_eq!(pending(&world, core), Some(2));
    assert_eq!(events_of(&log, late), vec![PresenceEventKind::Appearing]);

    // Already registered and still owing its completion.
    add_member(&mut world, core, members[1]);
    assert_eq!(pending(&world, core), Some(2));
    assert_eq!(events_of(&log, members[1]), vec![PresenceEventKind::Appearing]);

    complete_appearing(&mut world, late);
    remove_member(&mut world, core, members[1]);
    assert_eq!(state(&world, core), PresenceState::Visible);
    let appeared = |log: &Log| {
        events_of(log, core)
            .into_iter()
            .filter(|kind| *kind == PresenceEventKind::Appeared)
            .count()
    };
    assert_eq!(appeared(&log), 1);

    remove_member(&mut world, core, members[1]);
    assert_eq!(world.get::<PresenceCore>(core).unwrap().members(), &[members[0], late]);
    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(appeared(&log), 1);
}

#[test]
fn despawning_member_mid_disappear_releases_barrier() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    appear_instantly(&mut world, core);

    start_disappearing(&mut world, core);
    despawn_presence(&mut world, members[0]);
    assert!(world.get_entity(members[0]).is_err());
    assert_eq!(pending(&world, core), Some(1));

    complete_disappearing(&mut world, members[1]);
    assert_eq!(state(&world, core), PresenceState::Hidden);
}

#[test]
fn member_added_during_appear_joins_barrier() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);

    start_appearing(&mut world, core);
    let late = spawn_presence(&mut world, object);
    world.flush();
    setup_presence(&mut world, late);

    assert_eq!(state(&world, late), PresenceState::Appearing);
    assert_eq!(pending(&world, core), Some(2));

    complete_appearing(&mut world, members[0]);
    assert_eq!(state(&world, core), PresenceState::Appearing);
    complete_appearing(&mut world, late);
    assert_eq!(state(&world, core), PresenceState::Visible);
    assert_eq!(state(&world, late), PresenceState::Visible);
}

#[test]
fn member_added_while_visible_catches_up() {
    let mut world = World::new();
    let (object, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 0);
    appear_instantly(&mut world, core);

    let late = spawn_presence(&mut world, object);
    world.flush();
    let log = new_log();
    record(&mut world, late, &log);
    setup_presence(&mut world, late);

    assert_eq!(state(&world, late), PresenceState::Visible);
    assert_eq!(
        events_of(&log, late),
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
    assert_eq!(pending(&world, core), None);
}

#[test]
fn removed_member_reattaches_on_next_trigger() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    remove_member(&mut world, core, members[0]);
    assert!(world.get::<PresenceCore>(core).unwrap().members().is_empty());

    start_appearing(&mut world, members[0]);
    assert_eq!(core_of(&world, members[0]), Some(core));
    assert_eq!(pending(&world, core), Some(1));
}

// =============================================================================
// Activation and hide policies
// =============================================================================

#[test]
fn activation_is_edge_triggered() {
    let mut world = World::new();
    let (object, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 0);
    let activations = Arc::new(Mutex::new(0));
    let counter = activations.clone();
    subscribe_activate(&mut world, core, move |_: &mut World, _: Entity| {
        *counter.lock().unwrap() += 1;
    });

    start_appearing(&mut world, core);
    appear_instantly(&mut world, core);
    assert_eq!(*activations.lock().unwrap(), 1);
    assert!(world.get::<Dormant>(object).is_none());

    hide_instantly(&mut world, core);
    assert!(world.get::<Dormant>(object).is_some());
    start_appearing(&mut world, core);
    assert_eq!(*activations.lock().unwrap(), 2);
}

#[test]
fn keep_active_policy_never_deactivates() {
    let mut world = World::new();
    let (object, core, _) = object_with_members(&mut world, HidePolicy::KeepActive, 0);
    assert!(world.get::<Dormant>(object).is_none());

    appear_instantly(&mut world, core);
    hide_instantly(&mut world, core);

    assert_eq!(state(&world, core), PresenceState::Hidden);
    assert!(world.get::<Dormant>(object).is_none());
    assert!(world.get::<PresenceCore>(core).unwrap().is_active());
}

#[test]
fn destroy_policy_despawns_object_after_it_was_shown() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Destroy, 1);
    // Initial hide only marks the object dormant.
    assert!(world.get_entity(object).is_ok());
    assert!(world.get::<Dormant>(object).is_some());

    appear_instantly(&mut world, core);
    start_disappearing(&mut world, core);
    complete_disappearing(&mut world, members[0]);

    assert!(world.get_entity(object).is_err());
    assert!(world.get_entity(core).is_err());
    assert!(world.get_entity(members[0]).is_err());
}

#[test]
fn despawn_object_detaches_presences() {
    let mut world = World::new();
    let (object, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 2);
    start_appearing(&mut world, core);

    despawn_object(&mut world, object);

    assert!(world.get_entity(object).is_err());
    assert!(world.get_entity(core).is_err());
    assert!(members.iter().all(|m| world.get_entity(*m).is_err()));
}

// =============================================================================
// Observers and queries
// =============================================================================

#[test]
fn observers_receive_presence_and_activate_events() {
    let mut world = World::new();
    let seen: Arc<Mutex<Vec<PresenceEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let activated: Arc<Mutex<Vec<ActivateEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let activated_clone = activated.clone();
    world.spawn(Observer::new(move |trigger: On<PresenceEvent>| {
        seen_clone.lock().unwrap().push(*trigger.event());
    }));
    world.spawn(Observer::new(move |trigger: On<ActivateEvent>| {
        activated_clone.lock().unwrap().push(*trigger.event());
    }));
    world.flush();

    let (object, core, _) = object_with_members(&mut world, HidePolicy::Deactivate, 0);
    seen.lock().unwrap().clear();
    start_appearing(&mut world, core);

    let kinds: Vec<PresenceEventKind> = seen.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![PresenceEventKind::Appearing, PresenceEventKind::Appeared]
    );
    assert_eq!(
        activated.lock().unwrap().as_slice(),
        &[ActivateEvent { object, core }]
    );
}

#[test]
fn visibility_queries_follow_state() {
    let mut world = World::new();
    let (_, core, members) = object_with_members(&mut world, HidePolicy::Deactivate, 1);
    assert!(!is_visible(&world, core));
    assert!(!is_heading_visible(&world, core));

    start_appearing(&mut world, core);
    assert!(is_visible(&world, core));
    assert!(is_heading_visible(&world, core));

    complete_appearing(&mut world, members[0]);
    start_disappearing(&mut world, core);
    assert!(is_visible(&world, core));
    assert!(!is_heading_visible(&world, core));

    let presence = world.get::<Presence>(core).unwrap();
    assert!(presence.visible());
    assert!(!presence.to_visible());
}

#[test]
fn operations_on_missing_entities_are_noops() {
    let mut world = World::new();
    let stray = world.spawn_empty().id();
    start_appearing(&mut world, stray);
    hide_instantly(&mut world, stray);
    complete_appearing(&mut world, stray);
    assert_eq!(presence_state(&world, stray), None);

    world.despawn(stray);
    start_disappearing(&mut world, stray);
    despawn_presence(&mut world, stray);
}
