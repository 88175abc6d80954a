use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown {setting} method: {value}")]
    UnknownMethod { setting: String, value: String },

    #[error("Map error: {0}")]
    Map(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ChaseError>;
