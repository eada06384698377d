//! Scene spawning and script playback.
//!
//! [`spawn_scene`] turns a [`SceneData`] tree into objects with their cores,
//! timed presences and sequences. [`scene_script_system`] plays the scene's
//! script against [`WorldTime`].
//!
//! # Related
//!
//! - [`crate::resources::scene`] – the JSON data model

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::resources::presenceconfig::PresenceConfig;
use crate::resources::scene::{
    SceneAction, SceneData, SceneHandles, SceneObject, SceneObjectHandle, SceneScript,
    SequenceData, ScriptEntry,
};
use crate::resources::worldtime::WorldTime;
use crate::systems::presence::{
    appear_instantly, disappear_instantly, hide_instantly, setup_pending_presences, spawn_core,
    spawn_sequence, spawn_timed_presence, start_appearing, start_disappearing,
};
use crate::systems::sequence::{populate_sequence, set_sequence_targets};

/// Spawn every object in `scene`.
///
/// Objects get a core built from the [`PresenceConfig`] defaults (overridden
/// per object), one timed presence per `timed` entry, and optionally a
/// sequence. Sequence targets are resolved by name once the whole tree
/// exists. Fails on duplicate names or unknown target names.
pub fn spawn_scene(world: &mut World, scene: &SceneData) -> Result<SceneHandles, String> {
    let config = world
        .get_resource::<PresenceConfig>()
        .cloned()
        .unwrap_or_default();
    let mut handles = SceneHandles::default();
    let mut sequences: Vec<(Entity, &SequenceData)> = Vec::new();

    for object in &scene.objects {
        spawn_object(world, object, None, &config, &mut handles, &mut sequences)?;
    }
    world.flush();

    for (seq, data) in sequences {
        if data.collect {
            populate_sequence(world, seq);
            continue;
        }
        let targets = data
            .targets
            .iter()
            .map(|name| {
                handles
                    .core(name)
                    .ok_or_else(|| format!("Sequence target '{}' is not a scene object", name))
            })
            .collect::<Result<Vec<Entity>, String>>()?;
        set_sequence_targets(world, seq, targets);
    }

    setup_pending_presences(world);
    info!("Spawned scene with {} objects", handles.objects.len());
    Ok(handles)
}

fn spawn_object<'a>(
    world: &mut World,
    data: &'a SceneObject,
    parent: Option<Entity>,
    config: &PresenceConfig,
    handles: &mut SceneHandles,
    sequences: &mut Vec<(Entity, &'a SequenceData)>,
) -> Result<(), String> {
    if handles.objects.contains_key(&data.name) {
        return Err(format!("Duplicate scene object name '{}'", data.name));
    }

    let object = match parent {
        Some(parent) => world.spawn(ChildOf(parent)).id(),
        None => world.spawn_empty().id(),
    };

    let mut core = config.core();
    if let Some(policy) = data.policy {
        core.policy = policy;
    }
    if let Some(initial) = data.initial {
        core.initial = initial;
    }
    let core = spawn_core(world, object, core);

    for timed in &data.timed {
        spawn_timed_presence(world, object, timed.appear, timed.disappear);
    }

    let sequence = data.sequence.as_ref().map(|seq_data| {
        let mut seq = config.sequence(Vec::new());
        if let Some(timing) = seq_data.timing {
            seq.timing = timing;
        }
        if let Some(reverse) = seq_data.reverse_on_disappear {
            seq.reverse_on_disappear = reverse;
        }
        let seq = spawn_sequence(world, object, seq);
        sequences.push((seq, seq_data));
        seq
    });

    handles.objects.insert(
        data.name.clone(),
        SceneObjectHandle {
            object,
            core,
            sequence,
        },
    );

    for child in &data.children {
        spawn_object(world, child, Some(object), config, handles, sequences)?;
    }
    Ok(())
}

/// Run one script action against the named object's core.
pub fn apply_script_entry(
    world: &mut World,
    handles: &SceneHandles,
    entry: &ScriptEntry,
) -> Result<(), String> {
    let core = handles
        .core(&entry.object)
        .ok_or_else(|| format!("Script names unknown object '{}'", entry.object))?;
    info!("t={:.2} {} -> {:?}", entry.at, entry.object, entry.action);
    match entry.action {
        SceneAction::StartAppearing => start_appearing(world, core),
        SceneAction::StartDisappearing => start_disappearing(world, core),
        SceneAction::HideInstantly => hide_instantly(world, core),
        SceneAction::AppearInstantly => appear_instantly(world, core),
        SceneAction::DisappearInstantly => disappear_instantly(world, core),
    }
    Ok(())
}

/// Exclusive system: play every script entry that is due at `WorldTime::elapsed`.
pub fn scene_script_system(world: &mut World) {
    let elapsed = world
        .get_resource::<WorldTime>()
        .map(|time| time.elapsed)
        .unwrap_or(0.0);
    let Some(due) = world
        .get_resource_mut::<SceneScript>()
        .map(|mut script| script.take_due(elapsed))
    else {
        return;
    };
    if due.is_empty() {
        return;
    }
    let Some(handles) = world.get_resource::<SceneHandles>().cloned() else {
        warn!("Scene script is loaded but no SceneHandles resource exists");
        return;
    };
    for entry in &due {
        if let Err(e) = apply_script_entry(world, &handles, entry) {
            warn!("{}", e);
        }
    }
}
