//! User configuration (`config.toml`).

use directories::ProjectDirs;
use gridfill_engine::engine::HeaderAction;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default catalog root
    pub catalog: Option<PathBuf>,
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: Option<String>,
    pub header_action: Option<HeaderAction>,
}

impl Config {
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        self.log_level.as_deref()?.parse().ok()
    }
}

/// Load the config from `explicit`, else from the user config dir.
///
/// Problems never fail the run; they come back as warnings alongside the defaults.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = explicit.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => config,
            Err(err) => {
                warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                Config::default()
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            Config::default()
        }
    };

    if config.log_level.is_some() && config.log_level().is_none() {
        warnings.push(format!(
            "Unknown log_level '{}' in {}",
            config.log_level.as_deref().unwrap_or_default(),
            path.display()
        ));
    }

    (config, warnings)
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridfill")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
