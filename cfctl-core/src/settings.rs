use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CfctlError, Result};

/// Per-environment connection state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    /// Scheme-prefixed endpoint, e.g. `grpc+ssl://inventory.api.dev.example:443`.
    pub endpoint: String,
    pub token: Option<String>,
    #[serde(default)]
    pub is_proxy: bool,
}

/// `service -> alias -> command-string`.
pub type AliasTable = HashMap<String, HashMap<String, String>>;

/// The persisted settings document (`$HOME/.cfctl/config.yml`). Aliases are
/// kept here in memory but persisted separately, at `$HOME/.cfctl/alias.yml`
/// (see `Settings::load`/`save`), so the two concerns don't share a file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub active_environment: String,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    #[serde(skip)]
    pub aliases: AliasTable,
}

impl Settings {
    /// Directory holding all of cfctl's persisted state: `$HOME/.cfctl`.
    pub fn home_dir() -> Result<PathBuf> {
        let home = env::var("HOME")
            .map_err(|_| CfctlError::ConfigMissing("HOME environment variable not set".into()))?;
        Ok(PathBuf::from(home).join(".cfctl"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.yml"))
    }

    pub fn alias_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("alias.yml"))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("cache"))
    }

    /// Load settings from disk, or an empty default if the file does not exist yet.
    pub fn load() -> Result<Settings> {
        let path = Self::config_path()?;
        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => serde_yaml::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(err) => return Err(err.into()),
        };
        settings.aliases = Self::load_aliases()?;
        Ok(settings)
    }

    fn load_aliases() -> Result<AliasTable> {
        let path = Self::alias_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(serde_yaml::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AliasTable::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist both `config.yml` (environments + active environment + token)
    /// and `alias.yml` (the alias table).
    pub fn save(&self) -> Result<()> {
        let dir = Self::home_dir()?;
        fs::create_dir_all(&dir)?;
        let contents = serde_yaml::to_string(self)?;
        fs::write(Self::config_path()?, contents)?;

        let alias_contents = serde_yaml::to_string(&self.aliases)?;
        fs::write(Self::alias_path()?, alias_contents)?;
        Ok(())
    }

    /// The config for the currently active environment.
    pub fn active(&self) -> Result<&EnvironmentConfig> {
        self.environments.get(&self.active_environment).ok_or_else(|| {
            CfctlError::ConfigMissing(format!(
                "no environment named '{}' is configured",
                self.active_environment
            ))
        })
    }

    pub fn active_token(&self) -> Result<&str> {
        let env = self.active()?;
        env.token.as_deref().ok_or(CfctlError::AuthMissing)
    }
}
