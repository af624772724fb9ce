use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

use crate::model::KeyStrategy;
use crate::player::ExpandMode;

#[derive(Debug, Deserialize)]
pub struct Config {
    backend: Backend,
    player: Player,
}

#[derive(Debug, Deserialize)]
pub struct Backend {
    base_url: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Player {
    user_id: u64,
    #[serde(default = "default_cache_dir")]
    cache_dir: PathBuf,
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,
    #[serde(default)]
    key_strategy: KeyStrategy,
    #[serde(default)]
    expand_mode: ExpandMode,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.cursus")
}

fn default_debounce_ms() -> u64 {
    800
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                let config = match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                };

                config
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    #[inline]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    #[inline]
    pub fn player(&self) -> &Player {
        &self.player
    }
}

impl Backend {
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Player {
    #[inline]
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    #[inline]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[inline]
    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    #[inline]
    pub fn expand_mode(&self) -> ExpandMode {
        self.expand_mode
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.backend().base_url(), "http://127.0.0.1:5000/api/"); // defaults
        assert_eq!(config.player().debounce(), Duration::from_millis(800));
    }

    #[test]
    fn config_defaults_test() {
        let config = Config::from_slice(
            br#"
            [backend]
            base_url = "http://localhost/api/"

            [player]
            user_id = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.backend().token(), None);
        assert_eq!(config.backend().timeout(), Duration::from_secs(10));
        assert_eq!(config.player().user_id(), 7);
        assert_eq!(config.player().cache_dir(), Path::new("./.cursus"));
        assert_eq!(config.player().key_strategy(), KeyStrategy::LessonId);
        assert_eq!(config.player().expand_mode(), ExpandMode::Accordion);
    }

    #[test]
    fn config_overrides_test() {
        let config = Config::from_slice(
            br#"
            [backend]
            base_url = "http://localhost/api/"
            token = "secret"
            timeout_secs = 3

            [player]
            user_id = 1
            debounce_ms = 250
            key_strategy = "position"
            expand_mode = "free"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend().token(), Some("secret"));
        assert_eq!(config.player().debounce(), Duration::from_millis(250));
        assert_eq!(config.player().key_strategy(), KeyStrategy::Position);
        assert_eq!(config.player().expand_mode(), ExpandMode::Free);
    }

    #[test]
    fn config_missing_section_test() {
        let result = Config::from_slice(b"[backend]\nbase_url = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
