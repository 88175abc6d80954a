use anyhow::Context;
use chasegp::config::ConfigManager;
use chasegp::engines::generation::ConsoleProgressCallback;
use chasegp::engines::Experiment;

const DEFAULT_CONFIG: &str = "configs/default.toml";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let manager = ConfigManager::new();
    manager
        .load_from_file(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    let experiment = Experiment::from_config(manager.get()).context("failed to set up experiment")?;
    let summary = experiment
        .run(&mut ConsoleProgressCallback)
        .context("experiment failed")?;

    log::info!(
        "Experiment finished: best run {} with fitness {} (seed {})",
        summary.best_run,
        summary.best_fitness,
        summary.seed
    );
    Ok(())
}
