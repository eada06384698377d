//! Presence lifecycle events.
//!
//! Every lifecycle event raised by a presence is also triggered as a global
//! [`PresenceEvent`], after the presence's state has been updated and before
//! its synchronous listeners run. Observers receive the presence entity and
//! the kind of event:
//!
//! ```ignore
//! world.add_observer(|trigger: On<PresenceEvent>, query: Query<&Presence>| {
//!     let event = trigger.event();
//!     if let Ok(presence) = query.get(event.entity) {
//!         log::info!("{:?} -> {}", event.entity, presence.state);
//!     }
//! });
//! ```
//!
//! Observers run inside the transition and only get deferred access through
//! `Commands`. Anything that must answer synchronously (reporting a step as
//! complete, chaining a transition) should subscribe a listener with
//! [`subscribe`](crate::systems::presence::subscribe) instead.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::presence::{Presence, PresenceEventKind};

/// A presence raised one of its five lifecycle events.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEvent {
    /// The presence that raised the event.
    pub entity: Entity,
    pub kind: PresenceEventKind,
}

/// A core activated its object on the way to `appearing`/`visible`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivateEvent {
    pub object: Entity,
    pub core: Entity,
}

/// Observer that logs every presence transition at `debug` level, and core
/// activations at `info`.
pub fn presence_log_observer(trigger: On<PresenceEvent>, query: Query<&Presence>) {
    let event = trigger.event();
    match query.get(event.entity) {
        Ok(presence) => debug!(
            "presence {:?} on object {:?}: {:?} ({})",
            event.entity, presence.object, event.kind, presence.state
        ),
        Err(_) => debug!("presence {:?}: {:?}", event.entity, event.kind),
    }
}

pub fn activate_log_observer(trigger: On<ActivateEvent>) {
    let event = trigger.event();
    info!("object {:?} activated by core {:?}", event.object, event.core);
}
