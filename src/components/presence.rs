//! Visibility lifecycle participant.
//!
//! A [`Presence`] is one participant in the `hidden → appearing → visible →
//! disappearing → hidden` cycle of an object. Presences never drive their own
//! transitions: public triggers such as
//! [`start_appearing`](crate::systems::presence::start_appearing) are routed
//! to the object's coordinating core, which fans the transition out to every
//! presence attached to the object and waits for each of them to report
//! completion.
//!
//! # Layout
//!
//! - The *object* is any bevy entity. Presences are separate entities,
//!   usually spawned with `ChildOf(object)`.
//! - One presence per object also carries a
//!   [`PresenceCore`](crate::components::presencecore::PresenceCore); that is
//!   the coordinator.
//! - Other presences may carry
//!   [`PresenceSequence`](crate::components::presencesequence::PresenceSequence)
//!   or [`TimedPresence`](crate::components::timedpresence::TimedPresence) to
//!   specialise how they react to fan-out.
//!
//! # Listeners
//!
//! Each lifecycle event is delivered to synchronous listeners stored on the
//! presence. Listeners receive `&mut World`, so they can report completion or
//! start new transitions directly from inside the notification. Events are
//! additionally triggered as [`PresenceEvent`](crate::events::presence::PresenceEvent)
//! for regular bevy observers.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Lifecycle state shared by every presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// Freshly constructed, not set up yet. Cores never stay here.
    #[default]
    Created,
    Appearing,
    Visible,
    Disappearing,
    Hidden,
}

impl PresenceState {
    /// Anything but `Hidden`.
    pub fn is_visible(self) -> bool {
        self != PresenceState::Hidden
    }

    /// `Appearing` or `Visible`.
    pub fn is_heading_visible(self) -> bool {
        matches!(self, PresenceState::Appearing | PresenceState::Visible)
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PresenceState::Created => "created",
            PresenceState::Appearing => "appearing",
            PresenceState::Visible => "visible",
            PresenceState::Disappearing => "disappearing",
            PresenceState::Hidden => "hidden",
        };
        f.write_str(label)
    }
}

/// The five lifecycle events a presence raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceEventKind {
    Appearing,
    Appeared,
    Disappearing,
    Disappeared,
    Hidden,
}

impl PresenceEventKind {
    pub const ALL: [PresenceEventKind; 5] = [
        PresenceEventKind::Appearing,
        PresenceEventKind::Appeared,
        PresenceEventKind::Disappearing,
        PresenceEventKind::Disappeared,
        PresenceEventKind::Hidden,
    ];

    /// State a presence is in once this event has been raised.
    pub fn state(self) -> PresenceState {
        match self {
            PresenceEventKind::Appearing => PresenceState::Appearing,
            PresenceEventKind::Appeared => PresenceState::Visible,
            PresenceEventKind::Disappearing => PresenceState::Disappearing,
            PresenceEventKind::Disappeared | PresenceEventKind::Hidden => PresenceState::Hidden,
        }
    }
}

/// Synchronous listener. Receives the world and the presence that raised the event.
pub type PresenceListener = Arc<dyn Fn(&mut World, Entity) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Listener registry keyed by event kind.
#[derive(Default, Clone)]
pub struct PresenceListeners {
    next_id: u64,
    slots: Vec<(ListenerId, PresenceEventKind, PresenceListener)>,
}

impl PresenceListeners {
    pub fn subscribe(&mut self, kind: PresenceEventKind, listener: PresenceListener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, kind, listener));
        id
    }

    /// Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _, _)| *slot_id != id);
        self.slots.len() != before
    }

    /// Copy of the listeners for `kind`, in subscription order.
    pub fn snapshot(&self, kind: PresenceEventKind) -> SmallVec<[PresenceListener; 4]> {
        self.slots
            .iter()
            .filter(|(_, slot_kind, _)| *slot_kind == kind)
            .map(|(_, _, listener)| listener.clone())
            .collect()
    }
}

impl fmt::Debug for PresenceListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|(id, kind, _)| (id.0, kind)))
            .finish()
    }
}

/// A participant in an object's visibility lifecycle.
///
/// Build it with [`Presence::new`] (core resolved through the object on first
/// setup) or [`Presence::with_core`] (explicit wiring).
#[derive(Component, Debug)]
pub struct Presence {
    /// Current lifecycle state. Written only by the coordination functions.
    pub state: PresenceState,
    /// Object this presence belongs to.
    pub object: Entity,
    pub(crate) core: Option<Entity>,
    pub(crate) is_setup: bool,
    pub(crate) listeners: PresenceListeners,
}

impl Presence {
    pub fn new(object: Entity) -> Self {
        Self {
            state: PresenceState::Created,
            object,
            core: None,
            is_setup: false,
            listeners: PresenceListeners::default(),
        }
    }

    pub fn with_core(object: Entity, core: Entity) -> Self {
        Self {
            core: Some(core),
            ..Self::new(object)
        }
    }

    /// The coordinating core, once known.
    pub fn core(&self) -> Option<Entity> {
        self.core
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    /// `state != Hidden`.
    pub fn visible(&self) -> bool {
        self.state.is_visible()
    }

    /// `state` is `Appearing` or `Visible`.
    pub fn to_visible(&self) -> bool {
        self.state.is_heading_visible()
    }
}
