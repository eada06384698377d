//! Presence systems.
//!
//! Most entry points are plain functions over `&mut World` so they can be
//! called from listeners, observers and host code alike.
//!
//! Submodules overview
//! - [`presence`] – setup, triggers, core fan-out and the completion barrier
//! - [`scene`] – spawn scenes from JSON and play their scripts
//! - [`sequence`] – timed cascades and target bookkeeping
//! - [`time`] – update simulation time and advance presence timers
//! - [`timedpresence`] – reactions of fixed-duration presences

pub mod presence;
pub mod scene;
pub mod sequence;
pub mod time;
pub mod timedpresence;
