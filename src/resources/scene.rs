//! Scene description loaded from JSON.
//!
//! A scene is a tree of named objects with their presences, plus a timed
//! script of triggers the demo host plays back.
//!
//! ```json
//! {
//!   "objects": [
//!     {
//!       "name": "menu",
//!       "policy": "deactivate",
//!       "timed": [{ "appear": 0.3, "disappear": 0.2 }],
//!       "sequence": { "collect": true, "reverse_on_disappear": true,
//!                     "timing": { "appear_step_delay": 0.1 } },
//!       "children": [
//!         { "name": "item_a", "timed": [{ "appear": 0.2, "disappear": 0.2 }] },
//!         { "name": "item_b", "timed": [{ "appear": 0.2, "disappear": 0.2 }] }
//!       ]
//!     }
//!   ],
//!   "script": [
//!     { "at": 0.0, "object": "menu", "action": "start_appearing" },
//!     { "at": 2.0, "object": "menu", "action": "start_disappearing" }
//!   ]
//! }
//! ```
//!
//! # Related
//!
//! - [`crate::systems::scene::spawn_scene`] – builds the described objects

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::presencecore::{HidePolicy, InitialPresence};
use crate::components::presencesequence::SequenceTiming;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SceneData {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub script: Vec<ScriptEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    /// Falls back to [`PresenceConfig`](crate::resources::presenceconfig::PresenceConfig) when absent.
    #[serde(default)]
    pub policy: Option<HidePolicy>,
    #[serde(default)]
    pub initial: Option<InitialPresence>,
    #[serde(default)]
    pub timed: Vec<TimedData>,
    #[serde(default)]
    pub sequence: Option<SequenceData>,
    #[serde(default)]
    pub children: Vec<SceneObject>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TimedData {
    #[serde(default)]
    pub appear: f32,
    #[serde(default)]
    pub disappear: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SequenceData {
    /// Names of objects whose cores are driven, in order.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Collect targets from the object's hierarchy instead of `targets`.
    #[serde(default)]
    pub collect: bool,
    #[serde(default)]
    pub timing: Option<SequenceTiming>,
    #[serde(default)]
    pub reverse_on_disappear: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SceneAction {
    StartAppearing,
    StartDisappearing,
    HideInstantly,
    AppearInstantly,
    DisappearInstantly,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScriptEntry {
    /// Seconds since the scene started.
    pub at: f32,
    pub object: String,
    pub action: SceneAction,
}

impl SceneData {
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scene file {}: {}", path, e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Failed to parse scene: {}", e))
    }

    /// Script entries ordered by time; ties keep file order.
    pub fn sorted_script(&self) -> Vec<ScriptEntry> {
        let mut script = self.script.clone();
        script.sort_by(|a, b| a.at.total_cmp(&b.at));
        script
    }
}

/// Entities created for a named scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneObjectHandle {
    pub object: Entity,
    pub core: Entity,
    pub sequence: Option<Entity>,
}

/// Name → entities lookup produced by [`spawn_scene`](crate::systems::scene::spawn_scene).
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneHandles {
    pub objects: FxHashMap<String, SceneObjectHandle>,
}

impl SceneHandles {
    pub fn get(&self, name: &str) -> Option<&SceneObjectHandle> {
        self.objects.get(name)
    }

    pub fn core(&self, name: &str) -> Option<Entity> {
        self.objects.get(name).map(|handle| handle.core)
    }
}

/// Script playback state for [`scene_script_system`](crate::systems::scene::scene_script_system).
#[derive(Resource, Debug, Clone, Default)]
pub struct SceneScript {
    entries: Vec<ScriptEntry>,
    cursor: usize,
}

impl SceneScript {
    pub fn new(scene: &SceneData) -> Self {
        Self {
            entries: scene.sorted_script(),
            cursor: 0,
        }
    }

    /// Entries due at `elapsed` that have not been played yet.
    pub fn take_due(&mut self, elapsed: f32) -> Vec<ScriptEntry> {
        let start = self.cursor;
        while self
            .entries
            .get(self.cursor)
            .is_some_and(|entry| entry.at <= elapsed)
        {
            self.cursor += 1;
        }
        self.entries[start..self.cursor].to_vec()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.entries.len()
    }
}
