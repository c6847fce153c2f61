mod compiled;
pub mod persist;
mod types;

pub use compiled::CompiledSettings;
pub use types::*;

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Locate the config file: the explicit path when given, otherwise the first
/// default location that exists.
pub fn find_config_file(custom_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom_path {
        return Some(path.to_path_buf());
    }

    let default_paths = [
        "./farmline.toml",
        "./config.toml",
        "~/.config/farmline/config.toml",
        "/etc/farmline/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    None
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    match find_config_file(custom_path) {
        Some(path) => load_config(&path),
        None => Ok(Config::default()),
    }
}

/// Resolve a pipeline by name and compile its settings.
pub fn compile_pipeline(config: &Config, name: &str) -> Result<CompiledSettings> {
    let settings = config
        .pipeline(name)
        .with_context(|| format!("pipeline '{}' not found in config", name))?;
    CompiledSettings::compile(settings.clone())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    // Validate farm config
    if config.farm.enabled && config.farm.api_key.is_empty() {
        anyhow::bail!("Farm submission is enabled but no API key is set");
    }

    // Collection names must be unique; two display names that differ only in
    // whitespace would collide in the database
    let mut seen = BTreeSet::new();
    for pipeline in &config.pipelines {
        let collection = pipeline.collection();
        if !seen.insert(collection.clone()) {
            anyhow::bail!("Duplicate pipeline collection name '{}'", collection);
        }
    }

    // Compiling surfaces malformed templates and skip-rule regexes at load
    // time instead of mid-reload
    for pipeline in &config.pipelines {
        CompiledSettings::compile(pipeline.clone())?;
    }

    Ok(())
}
