//! ECS components for presences.
//!
//! This module groups the component types attached to presence entities and
//! to the objects they belong to.
//!
//! Submodules overview:
//! - [`presence`] – lifecycle state, event kinds and per-presence listeners
//! - [`presencecore`] – coordinator state, hide policy and object markers
//! - [`presencesequence`] – ordered timed cascade over other presences
//! - [`timedpresence`] – leaf presence that completes after fixed durations
//! - [`timer`] – cancellable one-shot countdown used by the above

pub mod presence;
pub mod presencecore;
pub mod presencesequence;
pub mod timedpresence;
pub mod timer;
