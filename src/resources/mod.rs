//! ECS resources made available to systems.
//!
//! Overview
//! - `diagnostics` – recorded misconfiguration reports
//! - `presenceconfig` – defaults for implicit cores and scene sequences
//! - `scene` – JSON scene description, spawned handles and script playback
//! - `worldtime` – simulation time and delta
pub mod diagnostics;
pub mod presenceconfig;
pub mod scene;
pub mod worldtime;
