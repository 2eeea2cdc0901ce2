use crate::client::ClientOptions;
use crate::diagnostics::DEFAULT_FILE_NAME;
use crate::registry::Database;
use crate::{cli::Cli, logging::LoggingOptions};
use anyhow::{anyhow, Result};
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub main: MainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_path(),
            main: MainConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MainConfig {
    pub state_dir: PathBuf,
    pub logging: LoggingOptions,
    pub client: ClientOptions,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            state_dir: Config::default_dirs().state.clone(),
            logging: LoggingOptions::default(),
            client: ClientOptions::default(),
        }
    }
}

impl MainConfig {
    /// Places an unset error log in the state dir, wherever that was set.
    fn resolve_error_log(mut self) -> Self {
        if self.client.error_log.is_none() {
            self.client.error_log = Some(self.state_dir.join(DEFAULT_FILE_NAME));
        }
        self
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = PathBuf::from(&Self::default_dirs().config);
        path.push("config.yml");
        path
    }

    pub fn default_dirs() -> &'static DefaultDirs {
        DEFAULT_DIRS.get_or_init(|| {
            let args = AppStrategyArgs {
                top_level_domain: "org".to_string(),
                author: "sublipri".to_string(),
                app_name: "NWS Alerts".to_string(),
            };
            match choose_app_strategy(args) {
                Ok(strategy) => DefaultDirs {
                    config: strategy.config_dir(),
                    state: strategy.state_dir().unwrap_or(strategy.data_dir()),
                },
                // No home directory, e.g. inside some containers.
                Err(_) => DefaultDirs {
                    config: PathBuf::from("."),
                    state: PathBuf::from("."),
                },
            }
        })
    }

    pub fn from_path(config_path: &Path) -> Result<Self> {
        let main = Self::figment(config_path)
            .extract::<MainConfig>()?
            .resolve_error_log();
        Ok(Self {
            config_path: config_path.to_owned(),
            main,
        })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(MainConfig::default()))
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed("NWS_").split("__"))
    }

    pub fn from_cli(args: &Cli) -> Result<Self> {
        let config_path = if let Some(path) = &args.config_path {
            path.to_owned()
        } else {
            Self::default_path()
        };

        let main = Self::figment(&config_path)
            .merge(Serialized::defaults(args))
            .extract::<MainConfig>()?
            .resolve_error_log();

        Ok(Config { config_path, main })
    }

    pub fn write_config_file(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&self.main)?;
        fs::write(&self.config_path, yaml)?;
        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    pub fn ensure_state_dir(&self) -> Result<()> {
        if !self.main.state_dir.exists() {
            create_dir_all(&self.main.state_dir).map_err(|err| {
                anyhow!("Couldn't create {}: {err}", self.main.state_dir.display())
            })?;
        }
        Ok(())
    }

    pub fn get_database(&self) -> Result<Database> {
        let mut path = PathBuf::from(&self.main.state_dir);
        path.push("nws-alerts.db");
        Database::from_path(path)
    }
}

static DEFAULT_DIRS: OnceCell<DefaultDirs> = OnceCell::new();

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultDirs {
    pub config: PathBuf,
    pub state: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_path(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config.main.client.cooldown, Duration::from_secs(10));
        assert_eq!(config.main.client.base_url, "https://api.weather.gov");
        assert_eq!(
            config.main.client.error_log,
            Some(config.main.state_dir.join(DEFAULT_FILE_NAME))
        );
    }

    #[test]
    fn error_log_follows_state_dir_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("custom-state");
        let path = dir.path().join("config.yml");
        fs::write(&path, format!("state_dir: {}\n", state_dir.display())).unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.main.state_dir, state_dir);
        assert_eq!(
            config.main.client.error_log,
            Some(state_dir.join(DEFAULT_FILE_NAME))
        );
    }

    #[test]
    fn explicit_error_log_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs").join("errors.txt");
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            format!("state_dir: {}\nclient:\n  error_log: {}\n", dir.path().display(), log.display()),
        )
        .unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.main.client.error_log, Some(log));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "client:\n  cooldown: 30\n  timeout: 5\n  base_url: http://localhost:8080\n",
        )
        .unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.main.client.cooldown, Duration::from_secs(30));
        assert_eq!(config.main.client.timeout, Duration::from_secs(5));
        assert_eq!(config.main.client.base_url, "http://localhost:8080");
    }

    #[test]
    fn written_config_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_path(&dir.path().join("nested").join("config.yml")).unwrap();
        config.main.client.cooldown = Duration::from_secs(42);
        config.write_config_file().unwrap();
        let reread = Config::from_path(&config.config_path).unwrap();
        assert_eq!(reread.main.client.cooldown, Duration::from_secs(42));
    }
}
