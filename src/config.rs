use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use log::info;
use serde::Deserialize;
use crate::error::SteamrateError;

static APP_NAME: &str = "steamrate";
static CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_CYCLES: u32 = 5;
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Settings read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of sampling cycles to run before exiting
    pub cycles: u32,
    /// Length of one sampling window in seconds
    pub interval_secs: u64,
    /// Use this steam installation instead of searching for one
    pub steam_root: Option<PathBuf>,
    /// Library roots to watch in addition to the ones steam knows about
    pub extra_libraries: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycles: DEFAULT_CYCLES,
            interval_secs: DEFAULT_INTERVAL_SECS,
            steam_root: None,
            extra_libraries: Vec::new(),
        }
    }
}

impl FromStr for Config {
    type Err = SteamrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s).map_err(|e| SteamrateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Where the config file is looked for when none is given explicitly
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn read(path: &Path) -> Result<Config, SteamrateError> {
        info!("Reading config from {}", path.display());
        fs::read_to_string(path)?.parse()
    }

    /// Read the config at [`Config::default_path`], falling back to the
    /// defaults when there is no such file.
    pub fn read_or_default() -> Result<Config, SteamrateError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => Ok(Config::default()),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn validate(&self) -> Result<(), SteamrateError> {
        if self.cycles == 0 {
            return Err(SteamrateError::Config("cycles must be at least 1".to_owned()));
        }

        if self.interval_secs == 0 {
            return Err(SteamrateError::Config("interval_secs must be at least 1".to_owned()));
        }

        Ok(())
    }
}
