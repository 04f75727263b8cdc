//! A thread-safe, auto-reloading configuration module.
//!
//! Values come from a YAML file and can be overridden by environment variables
//! prefixed with `APP__` (e.g. `APP__OAUTH__CLIENT_SECRET` overrides
//! `oauth.client_secret`), which keeps secrets out of the file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use std::time::Duration;

use config::{Config as RawConfig, Environment, File};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use thiserror::Error;

const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration file")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize file watcher")]
    Watch(#[from] notify::Error),

    #[error("Configuration lock was poisoned, indicating a panic in another thread")]
    LockPoisoned,
}

#[derive(Debug)]
pub struct Config {
    // Shared between readers and the reload thread.
    inner: Arc<RwLock<RawConfig>>,
    // Dropping the watcher stops the reload thread.
    _watcher: Option<RecommendedWatcher>,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn builder_test() -> test_utils::TestConfigBuilder {
        test_utils::TestConfigBuilder::new()
    }

    /// Reads a single key or a whole section (e.g. `"oauth"` into a struct).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let guard = self.inner.read().map_err(|_| ConfigError::LockPoisoned)?;
        guard.get(key).map_err(ConfigError::from)
    }

    /// Like [`Config::get`], but falls back to `default` when the key is absent.
    ///
    /// A present key with a value of the wrong type is still an error.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Ok(value) => Ok(value),
            Err(ConfigError::Load(config::ConfigError::NotFound(_))) => Ok(default),
            Err(err) => Err(err),
        }
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    watch: bool,
    watch_interval: Duration,
    env_overrides: bool,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, watch: false, watch_interval: Duration::from_secs(2), env_overrides: true }
    }

    pub fn watch(mut self) -> Self {
        self.watch = true;
        self
    }

    pub fn watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    /// Disables `APP__*` environment overrides.
    pub fn without_env(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let raw_config = Self::load(&self.path, self.env_overrides)?;
        let config_arc = Arc::new(RwLock::new(raw_config));
        let mut watcher = None;

        if self.watch {
            let path_clone = self.path.clone();
            let env_overrides = self.env_overrides;
            let config_clone = Arc::clone(&config_arc);
            let (tx, rx) = mpsc::channel();

            let mut w = RecommendedWatcher::new(tx, notify::Config::default().with_poll_interval(self.watch_interval))?;
            w.watch(&self.path, RecursiveMode::NonRecursive)?;

            thread::spawn(move || {
                tracing::info!(path = %path_clone.to_string_lossy(), "Watching configuration file for changes");
                while let Ok(event_result) = rx.recv() {
                    match event_result {
                        Ok(Event { kind: notify::EventKind::Modify(_), .. }) => {
                            match Self::load(&path_clone, env_overrides) {
                                Ok(new_config) => match config_clone.write() {
                                    Ok(mut guard) => {
                                        *guard = new_config;
                                        tracing::info!("Configuration reloaded");
                                    },
                                    Err(_) => tracing::error!("Failed to acquire write lock for reloading config"),
                                },
                                // Keep serving the last good configuration.
                                Err(e) => tracing::error!(error = %e, "Failed to reload configuration file"),
                            }
                        },
                        Err(e) => tracing::error!(error = ?e, "File watcher error"),
                        _ => {},
                    }
                }
            });
            watcher = Some(w);
        }

        Ok(Config { inner: config_arc, _watcher: watcher })
    }

    fn load(path: &Path, env_overrides: bool) -> Result<RawConfig, config::ConfigError> {
        let mut builder = RawConfig::builder().add_source(File::from(path).required(true));
        if env_overrides {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX).prefix_separator(ENV_SEPARATOR).separator(ENV_SEPARATOR),
            );
        }
        builder.build()
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod test_utils {
    use std::collections::HashMap;

    use config::Value;

    use super::*;

    #[derive(Default)]
    pub struct TestConfigBuilder {
        values: HashMap<String, Value>,
    }

    impl TestConfigBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
            self.values.insert(key.to_string(), value.into());
            self
        }

        pub fn build(self) -> Config {
            let mut builder = RawConfig::builder();

            for (key, value) in self.values {
                builder = builder.set_override(key, value).unwrap();
            }

            let raw_config = builder.build().expect("Failed to create config from test values");

            Config { inner: Arc::new(RwLock::new(raw_config)), _watcher: None }
        }
    }
}
