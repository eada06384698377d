//! Coordinator component and the object-side markers it maintains.
//!
//! The [`PresenceCore`] sits on one presence per object and owns the list of
//! its sibling presences. When a transition is requested it snapshots the
//! siblings into a progress set, fans the transition out, and finalises its
//! own state once every sibling has reported completion.
//!
//! What reaching `hidden` does to the object is decided by a [`HidePolicy`]
//! instead of a subclass per behaviour.
//!
//! # Related
//!
//! - [`crate::systems::presence`] – the fan-out and barrier functions
//! - [`crate::events::presence::ActivateEvent`] – raised on activation

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::components::presence::{ListenerId, PresenceListener};

/// What entering `hidden` does to the underlying object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HidePolicy {
    /// Insert [`Dormant`] on the object.
    #[default]
    Deactivate,
    /// Despawn the object (and everything parented to it) once it has been
    /// shown at least once. Before that it only goes dormant.
    Destroy,
    /// Never deactivate.
    KeepActive,
}

impl FromStr for HidePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deactivate" => Ok(HidePolicy::Deactivate),
            "destroy" => Ok(HidePolicy::Destroy),
            "keep_active" | "keepactive" | "always_active" => Ok(HidePolicy::KeepActive),
            other => Err(format!("Unknown hide policy: {}", other)),
        }
    }
}

impl fmt::Display for HidePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HidePolicy::Deactivate => "deactivate",
            HidePolicy::Destroy => "destroy",
            HidePolicy::KeepActive => "keep_active",
        })
    }
}

/// State a core settles in when it is first set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPresence {
    #[default]
    Hidden,
    Visible,
}

impl FromStr for InitialPresence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hidden" => Ok(InitialPresence::Hidden),
            "visible" => Ok(InitialPresence::Visible),
            other => Err(format!("Unknown initial presence: {}", other)),
        }
    }
}

impl fmt::Display for InitialPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InitialPresence::Hidden => "hidden",
            InitialPresence::Visible => "visible",
        })
    }
}

/// Coordinator of every presence attached to one object.
///
/// Always paired with a [`Presence`](crate::components::presence::Presence)
/// on the same entity; the core's own lifecycle state lives there.
#[derive(Component)]
pub struct PresenceCore {
    pub policy: HidePolicy,
    pub initial: InitialPresence,
    pub(crate) members: Vec<Entity>,
    /// Members that still owe a completion for the transition in flight.
    pub(crate) progress: Option<FxHashSet<Entity>>,
    pub(crate) active: bool,
    /// Bumped on every transition so an interrupted fan-out stops early.
    pub(crate) epoch: u64,
    next_listener: u64,
    pub(crate) activate_listeners: Vec<(ListenerId, PresenceListener)>,
}

impl Default for PresenceCore {
    fn default() -> Self {
        Self::new(HidePolicy::default())
    }
}

impl PresenceCore {
    pub fn new(policy: HidePolicy) -> Self {
        Self {
            policy,
            initial: InitialPresence::default(),
            members: Vec::new(),
            progress: None,
            active: false,
            epoch: 0,
            next_listener: 0,
            activate_listeners: Vec::new(),
        }
    }

    /// Builder: state to settle in on setup.
    pub fn with_initial(mut self, initial: InitialPresence) -> Self {
        self.initial = initial;
        self
    }

    /// Sibling presences in registration order.
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Number of members still pending, `None` when no barrier is open.
    pub fn pending(&self) -> Option<usize> {
        self.progress.as_ref().map(|set| set.len())
    }

    pub fn is_pending(&self, entity: Entity) -> bool {
        self.progress
            .as_ref()
            .is_some_and(|set| set.contains(&entity))
    }

    /// Whether the core currently holds its object active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn subscribe_activate(&mut self, listener: PresenceListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.activate_listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe_activate(&mut self, id: ListenerId) -> bool {
        let before = self.activate_listeners.len();
        self.activate_listeners.retain(|(slot, _)| *slot != id);
        before != self.activate_listeners.len()
    }
}

impl fmt::Debug for PresenceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceCore")
            .field("policy", &self.policy)
            .field("initial", &self.initial)
            .field("members", &self.members)
            .field("pending", &self.pending())
            .field("active", &self.active)
            .field("epoch", &self.epoch)
            .field("activate_listeners", &self.activate_listeners.len())
            .finish()
    }
}

/// Written on an object once its core is set up.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceHost {
    pub core: Entity,
}

/// Present on an object while its core keeps it deactivated.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dormant;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_policy_parse() {
        assert_eq!("deactivate".parse::<HidePolicy>(), Ok(HidePolicy::Deactivate));
        assert_eq!(" Destroy ".parse::<HidePolicy>(), Ok(HidePolicy::Destroy));
        assert_eq!("keep_active".parse::<HidePolicy>(), Ok(HidePolicy::KeepActive));
        assert!("explode".parse::<HidePolicy>().is_err());
    }

    #[test]
    fn test_hide_policy_display_round_trips() {
        for policy in [HidePolicy::Deactivate, HidePolicy::Destroy, HidePolicy::KeepActive] {
            assert_eq!(policy.to_string().parse::<HidePolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_initial_presence_parse() {
        assert_eq!("visible".parse::<InitialPresence>(), Ok(InitialPresence::Visible));
        assert!("sideways".parse::<InitialPresence>().is_err());
    }

    #[test]
    fn test_core_defaults() {
        let core = PresenceCore::default();
        assert_eq!(core.policy, HidePolicy::Deactivate);
        assert_eq!(core.initial, InitialPresence::Hidden);
        assert!(core.members().is_empty());
        assert_eq!(core.pending(), None);
        assert!(!core.is_active());
    }
}
