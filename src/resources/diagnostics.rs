//! Misconfiguration reports.
//!
//! Nothing in the presence system fails hard. Situations that still work but
//! probably not the way the author intended are logged with `warn!` and
//! recorded in [`PresenceDiagnostics`], which is created on first report.

use std::fmt;

use bevy_ecs::prelude::*;
use log::warn;

/// A recorded misconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceDiagnostic {
    /// A second core was set up on an object that already has one. The
    /// duplicate runs on its own and does not coordinate the object.
    DuplicateCore {
        object: Entity,
        existing: Entity,
        duplicate: Entity,
    },
}

impl fmt::Display for PresenceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceDiagnostic::DuplicateCore {
                object,
                existing,
                duplicate,
            } => write!(
                f,
                "object {:?} has more than one presence core ({:?} already coordinates it, {:?} will run standalone)",
                object, existing, duplicate
            ),
        }
    }
}

#[derive(Resource, Debug, Default, Clone)]
pub struct PresenceDiagnostics {
    pub entries: Vec<PresenceDiagnostic>,
}

/// Log `diagnostic` and append it to the world's [`PresenceDiagnostics`].
pub fn report(world: &mut World, diagnostic: PresenceDiagnostic) {
    warn!("{}", diagnostic);
    world
        .get_resource_or_insert_with(PresenceDiagnostics::default)
        .entries
        .push(diagnostic);
}
