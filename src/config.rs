//! Layered settings for the mock backend, the network simulation and the query cache.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `<dir>/mockfetch.toml`
//! 3. environment variables (`MOCKFETCH_<SECTION>__<KEY>`, e.g. `MOCKFETCH_NETWORK__DELAY_MS=0`)

use std::{path::Path, time::Duration};

use config::{ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_ERROR_RATE, Endpoint};

pub const CONFIG_FILE_NAME: &str = "mockfetch.toml";
pub const ENV_PREFIX: &str = "MOCKFETCH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub cache: CacheConfig,
    pub fixtures: FixtureConfig,
}

impl Config {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(dir, environment())
    }

    fn load_with(dir: impl AsRef<Path>, env: Environment) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(
                File::from(dir.as_ref().join(CONFIG_FILE_NAME))
                    .required(false)
                    .format(FileFormat::Toml),
            )
            .add_source(env)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.network.error_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::Message(format!(
                "network.error_rate must be within [0, 1], got {rate}"
            )));
        }
        let url = &self.network.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "network.base_url must be an http(s) url, got `{url}`"
            )));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub base_url: String,
    /// Delay of every endpoint without a dedicated setting.
    pub delay_ms: u64,
    pub user_delay_ms: u64,
    pub posts_delay_ms: u64,
    pub error_rate: f64,
    /// Requests whose delay exceeds this fail with `"Request timed out"`.
    pub timeout_ms: Option<u64>,
    /// Highest user id `fetch_user` accepts.
    pub max_user_id: u64,
    /// Degrade failed reads to generated fixtures.
    pub fallback: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            delay_ms: 500,
            user_delay_ms: 1000,
            posts_delay_ms: 800,
            error_rate: DEFAULT_ERROR_RATE,
            timeout_ms: None,
            max_user_id: 10,
            fallback: true,
        }
    }
}

impl NetworkConfig {
    /// No latency and no injected failures.
    pub fn immediate() -> Self {
        Self {
            error_rate: 0.0,
            ..Self::default()
        }
        .with_delay(0)
    }

    /// Uses `delay_ms` for every endpoint.
    pub fn with_delay(self, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            user_delay_ms: delay_ms,
            posts_delay_ms: delay_ms,
            ..self
        }
    }

    pub fn delay_for(&self, endpoint: Endpoint) -> Duration {
        let ms = match endpoint {
            Endpoint::User => self.user_delay_ms,
            Endpoint::Posts | Endpoint::UserPosts => self.posts_delay_ms,
            Endpoint::Users | Endpoint::CreatePost | Endpoint::DeletePost | Endpoint::Raw => {
                self.delay_ms
            }
        };
        Duration::from_millis(ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a successful result is served without refetching. Zero disables caching.
    pub retention_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { retention_secs: 60 }
    }
}

impl CacheConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Seed of the random source; entropy when absent.
    pub seed: Option<u64>,
    /// Start from the bundled `fixtures/db.json` instead of an empty store.
    pub seed_store: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            seed: None,
            seed_store: true,
        }
    }
}

#[cfg(test)]
mod tests;
