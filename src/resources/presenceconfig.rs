//! Presence defaults resource.
//!
//! Holds the defaults used for cores that get created implicitly during
//! setup and for sequences spawned from scene files. Values are loaded from
//! an INI file; anything missing keeps its default.
//!
//! # Configuration File Format
//!
//! ```ini
//! [core]
//! hide_policy = deactivate
//! initial = hidden
//!
//! [sequence]
//! appear_delay = 0.0
//! disappear_delay = 0.0
//! appear_step_delay = 0.1
//! disappear_step_delay = 0.1
//! reverse_on_disappear = false
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::presencecore::{HidePolicy, InitialPresence, PresenceCore};
use crate::components::presencesequence::{PresenceSequence, SequenceTiming};

const DEFAULT_CONFIG_PATH: &str = "./presence.ini";

#[derive(Resource, Debug, Clone)]
pub struct PresenceConfig {
    pub hide_policy: HidePolicy,
    pub initial: InitialPresence,
    pub timing: SequenceTiming,
    pub reverse_on_disappear: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceConfig {
    pub fn new() -> Self {
        Self {
            hide_policy: HidePolicy::default(),
            initial: InitialPresence::default(),
            timing: SequenceTiming::default(),
            reverse_on_disappear: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        info!(
            "Loaded presence config from {:?}: policy={}, initial={}, timing={:?}, reverse={}",
            self.config_path, self.hide_policy, self.initial, self.timing, self.reverse_on_disappear
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [core] section
        if let Some(policy) = config.get("core", "hide_policy") {
            match policy.parse() {
                Ok(policy) => self.hide_policy = policy,
                Err(e) => warn!("{}, keeping {}", e, self.hide_policy),
            }
        }
        if let Some(initial) = config.get("core", "initial") {
            match initial.parse() {
                Ok(initial) => self.initial = initial,
                Err(e) => warn!("{}, keeping {}", e, self.initial),
            }
        }

        // [sequence] section
        let timing = &mut self.timing;
        for (key, slot) in [
            ("appear_delay", &mut timing.appear_delay),
            ("disappear_delay", &mut timing.disappear_delay),
            ("appear_step_delay", &mut timing.appear_step_delay),
            ("disappear_step_delay", &mut timing.disappear_step_delay),
        ] {
            if let Some(value) = config.getfloat("sequence", key).ok().flatten() {
                *slot = value as f32;
            }
        }
        if let Some(reverse) = config
            .getbool("sequence", "reverse_on_disappear")
            .ok()
            .flatten()
        {
            self.reverse_on_disappear = reverse;
        }
    }

    /// Save configuration to `config_path`.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [core] section
        config.set("core", "hide_policy", Some(self.hide_policy.to_string()));
        config.set("core", "initial", Some(self.initial.to_string()));

        // [sequence] section
        config.set("sequence", "appear_delay", Some(self.timing.appear_delay.to_string()));
        config.set("sequence", "disappear_delay", Some(self.timing.disappear_delay.to_string()));
        config.set(
            "sequence",
            "appear_step_delay",
            Some(self.timing.appear_step_delay.to_string()),
        );
        config.set(
            "sequence",
            "disappear_step_delay",
            Some(self.timing.disappear_step_delay.to_string()),
        );
        config.set(
            "sequence",
            "reverse_on_disappear",
            Some(self.reverse_on_disappear.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved presence config to {:?}", self.config_path);

        Ok(())
    }

    /// Core built from these defaults.
    pub fn core(&self) -> PresenceCore {
        PresenceCore::new(self.hide_policy).with_initial(self.initial)
    }

    /// Sequence built from these defaults.
    pub fn sequence(&self, targets: Vec<Entity>) -> PresenceSequence {
        PresenceSequence::new(targets)
            .with_timing(self.timing)
            .with_reverse_on_disappear(self.reverse_on_disappear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_config_defaults() {
        let config = PresenceConfig::new();
        assert_eq!(config.hide_policy, HidePolicy::Deactivate);
        assert_eq!(config.initial, InitialPresence::Hidden);
        assert!(!config.reverse_on_disappear);
        assert!(approx_eq(config.timing.appear_step_delay, 0.1));
    }

    #[test]
    fn test_config_load_from_str() {
        let mut config = PresenceConfig::new();
        config
            .load_from_str(
                "[core]\nhide_policy = destroy\ninitial = visible\n\n[sequence]\nappear_delay = 0.5\nappear_step_delay = 0.25\nreverse_on_disappear = true\n",
            )
            .unwrap();
        assert_eq!(config.hide_policy, HidePolicy::Destroy);
        assert_eq!(config.initial, InitialPresence::Visible);
        assert!(approx_eq(config.timing.appear_delay, 0.5));
        assert!(approx_eq(config.timing.appear_step_delay, 0.25));
        assert!(approx_eq(config.timing.disappear_step_delay, 0.1));
        assert!(config.reverse_on_disappear);
    }

    #[test]
    fn test_config_bad_policy_keeps_default() {
        let mut config = PresenceConfig::new();
        config
            .load_from_str("[core]\nhide_policy = vaporize\n")
            .unwrap();
        assert_eq!(config.hide_policy, HidePolicy::Deactivate);
    }

    #[test]
    fn test_config_missing_file_is_error() {
        let mut config = PresenceConfig::with_path("./definitely/not/here.ini");
        assert!(config.load_from_file().is_err());
    }

    #[test]
    fn test_config_builds_components() {
        let mut config = PresenceConfig::new();
        config.hide_policy = HidePolicy::KeepActive;
        config.reverse_on_disappear = true;
        assert_eq!(config.core().policy, HidePolicy::KeepActive);
        let seq = config.sequence(Vec::new());
        assert!(seq.reverse_on_disappear);
        assert_eq!(seq.timing, config.timing);
    }
}
