//! Apparition library.
//!
//! Visibility lifecycle coordination for bevy_ecs objects. Exposes the
//! presence components, resources, systems and events for embedding in a
//! host application and for integration tests.

pub mod components;
pub mod events;
pub mod resources;
pub mod systems;
