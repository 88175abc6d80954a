use super::manager::Settings;
use super::traits::{reset_field, ConfigSection};
use crate::error::ChaseError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub pill_density: f64,
    pub fruit_spawning_probability: f64,
    pub fruit_score: f64,
    /// Match length is `time_multiplier * width * height` turns.
    pub time_multiplier: f64,
    pub num_pursuers: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pill_density: 0.5,
            fruit_spawning_probability: 0.5,
            fruit_score: 10.0,
            time_multiplier: 1.0,
            num_pursuers: 3,
        }
    }
}

impl ConfigSection for GameConfig {
    fn section_name() -> &'static str {
        "game"
    }

    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = Self::default();
        Ok(Self {
            pill_density: settings.get_or(section, "pill_density", default.pill_density),
            fruit_spawning_probability: settings.get_or(
                section,
                "fruit_spawning_probability",
                default.fruit_spawning_probability,
            ),
            fruit_score: settings.get_or(section, "fruit_score", default.fruit_score),
            time_multiplier: settings.get_or(section, "time_multiplier", default.time_multiplier),
            num_pursuers: settings.get_or(section, "num_pursuers", default.num_pursuers),
        })
    }

    fn repair(mut self, section: &str) -> Self {
        let default = Self::default();
        if !(0.0..=1.0).contains(&self.pill_density) {
            reset_field(
                section,
                "pill_density",
                &mut self.pill_density,
                default.pill_density,
                "is not a probability",
            );
        }
        if !(0.0..=1.0).contains(&self.fruit_spawning_probability) {
            reset_field(
                section,
                "fruit_spawning_probability",
                &mut self.fruit_spawning_probability,
                default.fruit_spawning_probability,
                "is not a probability",
            );
        }
        if !(self.time_multiplier > 0.0) {
            reset_field(
                section,
                "time_multiplier",
                &mut self.time_multiplier,
                default.time_multiplier,
                "must be positive",
            );
        }
        self
    }

    fn validate(&self) -> Result<(), ChaseError> {
        if !(0.0..=1.0).contains(&self.pill_density) {
            return Err(ChaseError::Configuration(
                "Pill density must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fruit_spawning_probability) {
            return Err(ChaseError::Configuration(
                "Fruit spawning probability must be between 0 and 1".to_string(),
            ));
        }
        if !(self.time_multiplier > 0.0) {
            return Err(ChaseError::Configuration(
                "Time multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
