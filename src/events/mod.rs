//! Event types triggered by the presence systems.
//!
//! Events provide a decoupled way to observe presence transitions without
//! registering per-presence listeners.
//!
//! Submodules:
//! - [`presence`] – lifecycle notifications and object activation
pub mod presence;
