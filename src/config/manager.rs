use super::{
    evolution::PopulationConfig,
    experiment::ExperimentConfig,
    game::GameConfig,
    traits::ConfigSection,
};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Environment variables `CHASEGP__<SECTION>__<KEY>` override file values.
pub const ENV_PREFIX: &str = "CHASEGP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub basic: ExperimentConfig,
    pub game: GameConfig,
    pub pursued: PopulationConfig,
    pub pursuer: PopulationConfig,
}

impl AppConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            basic: load_section(settings, ExperimentConfig::section_name())?,
            game: load_section(settings, GameConfig::section_name())?,
            pursued: load_section(settings, "pursued")?,
            pursuer: load_section(settings, "pursuer")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.basic.validate()?;
        self.game.validate()?;
        self.pursued.validate()?;
        self.pursuer.validate()?;
        Ok(())
    }
}

fn load_section<S: ConfigSection>(settings: &Settings, section: &str) -> Result<S> {
    let loaded = S::from_settings(settings, section)?.repair(section);
    loaded.validate()?;
    Ok(loaded)
}

/// Raw key/value source with logged, non-fatal lookups.
pub struct Settings {
    source: config::Config,
}

impl Settings {
    /// A missing file contributes nothing; environment overrides still apply.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(Self { source })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let source = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        Ok(Self { source })
    }

    pub fn empty() -> Self {
        Self {
            source: config::Config::default(),
        }
    }

    pub fn get_or<T: DeserializeOwned + Debug>(&self, section: &str, key: &str, default: T) -> T {
        let path = format!("{}.{}", section, key);
        match self.source.get::<T>(&path) {
            Ok(value) => {
                log::info!("config: {} = {:?}", path, value);
                value
            }
            Err(config::ConfigError::NotFound(_)) => {
                log::info!("config: {} not specified; using {:?}", path, default);
                default
            }
            Err(e) => {
                log::warn!("config: {} not properly specified ({}); using {:?}", path, e, default);
                default
            }
        }
    }

    pub fn get_opt<T: DeserializeOwned + Debug>(&self, section: &str, key: &str) -> Option<T> {
        let path = format!("{}.{}", section, key);
        match self.source.get::<T>(&path) {
            Ok(value) => {
                log::info!("config: {} = {:?}", path, value);
                Some(value)
            }
            Err(config::ConfigError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("config: {} not properly specified ({}); ignoring", path, e);
                None
            }
        }
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file not found: {}; using defaults", path.display());
        }
        let settings = Settings::from_file(path)?;
        let config = AppConfig::from_settings(&settings)?;
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Resolved configuration rendered as TOML, as written into log headers.
    pub fn to_toml(&self) -> Result<String> {
        let config = self.get();
        Ok(toml::to_string_pretty(&config)?)
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::experiment::{Strategy, Termination};
    use crate::error::ChaseError;

    #[test]
    fn test_empty_settings_give_defaults() {
        let config = AppConfig::from_settings(&Settings::empty()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_sections_are_independent() {
        let settings = Settings::from_toml_str(
            r#"
            [basic]
            strategy = "gp"
            termination = "convergence"
            n_for_convergence = 25
            random_seed = 42

            [pursued]
            mu = 20

            [pursuer]
            mu = 8
            "#,
        )
        .unwrap();

        let config = AppConfig::from_settings(&settings).unwrap();
        assert_eq!(config.basic.strategy, Strategy::Gp);
        assert_eq!(config.basic.termination, Termination::Convergence { n: 25 });
        assert_eq!(config.basic.random_seed, Some(42));
        assert_eq!(config.pursued.mu, 20);
        assert_eq!(config.pursuer.mu, 8);
    }

    #[test]
    fn test_invalid_section_falls_back_to_default() {
        let settings = Settings::from_toml_str(
            r#"
            [game]
            pill_density = 3.0
            "#,
        )
        .unwrap();

        let config = AppConfig::from_settings(&settings).unwrap();
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_invalid_key_keeps_rest_of_section() {
        let settings = Settings::from_toml_str(
            r#"
            [pursued]
            mu = 50
            dmax_init = 6

            [game]
            pill_density = 3.0
            num_pursuers = 2
            "#,
        )
        .unwrap();

        let config = AppConfig::from_settings(&settings).unwrap();
        assert_eq!(config.pursued.mu, 50);
        assert_eq!(config.pursued.dmax_init, config.pursued.dmax_overall);
        assert_eq!(config.game.pill_density, 0.5);
        assert_eq!(config.game.num_pursuers, 2);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let manager = ConfigManager::new();
        manager.update(|c| c.pursued.mu = 3).unwrap();
        manager.load_from_file("/nonexistent/chasegp.toml").unwrap();
        assert_eq!(manager.get().pursued.mu, 10);
    }

    #[test]
    fn test_unknown_termination_is_fatal() {
        let settings = Settings::from_toml_str(
            r#"
            [basic]
            termination = "whenever"
            "#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::from_settings(&settings),
            Err(ChaseError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_update_rejects_invalid() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.pursued.mutation_rate = 2.0);
        assert!(result.is_err());
        assert_eq!(manager.get().pursued.mutation_rate, 0.05);
    }

    #[test]
    fn test_resolved_config_renders_as_toml() {
        let manager = ConfigManager::new();
        let rendered = manager.to_toml().unwrap();
        assert!(rendered.contains("[pursued]"));
        assert!(rendered.contains("mu = 10"));
    }
}
