// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Service configuration module
//!
//! Configuration structures and layered loading for the provider service.
//! Bounded values are validated newtypes, so an out-of-range timeout or
//! interval fails while the configuration is deserialized rather than when the
//! first probe runs.

use std::{path::Path, time::Duration};

use anyhow::{Result, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File, Map};
use provider_api::HealthCheckConfig;
use providers::{BangJeffConfig, Credential, DigiflazzConfig, VipResellerConfig};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{ServiceError, ServiceResult};

const ENV_PREFIX: &str = "FULFILLMENT";
const ENV_SEPARATOR: &str = "__";
const MAX_TIMEOUT_SECONDS: u64 = 300;
const MAX_INTERVAL_SECONDS: u64 = 86_400;
const DEFAULT_INTERVAL_SECONDS: u64 = 300;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(
            seconds <= MAX_TIMEOUT_SECONDS,
            "timeout cannot exceed {MAX_TIMEOUT_SECONDS}"
        );
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// A validated health check interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalSeconds(Duration);

impl IntervalSeconds {
    /// Create a new `IntervalSeconds`
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is 0 or longer than a day
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "interval must be greater than 0");
        ensure!(
            seconds <= MAX_INTERVAL_SECONDS,
            "interval cannot exceed {MAX_INTERVAL_SECONDS}"
        );
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Default probe interval (5 minutes)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(DEFAULT_INTERVAL_SECONDS))
    }

    /// Get the interval value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for IntervalSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for IntervalSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment; orders are real
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Health monitor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckSettings {
    /// Delay between probe rounds
    #[serde(default)]
    pub interval_seconds: IntervalSeconds,
    /// Upper bound for a single probe
    #[serde(default)]
    pub timeout_seconds: TimeoutSeconds,
}

impl HealthCheckSettings {
    /// Monitor configuration handed to the provider manager
    pub fn monitor_config(&self) -> HealthCheckConfig {
        HealthCheckConfig {
            interval: self.interval_seconds.value(),
            timeout: self.timeout_seconds.value(),
        }
    }
}

/// Digiflazz adapter settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DigiflazzSettings {
    pub enabled: bool,
    pub username: Option<Credential>,
    pub api_key: Option<Credential>,
    /// HMAC-SHA1 key for status callbacks; callbacks are rejected without it
    pub webhook_secret: Option<Credential>,
    pub base_url: Option<String>,
    pub timeout_seconds: TimeoutSeconds,
}

impl DigiflazzSettings {
    /// Adapter configuration, or `None` when the adapter is disabled
    ///
    /// Orders run in testing mode unless `environment` is production.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if the adapter is enabled without credentials
    pub fn client_config(
        &self,
        environment: Environment,
    ) -> ServiceResult<Option<DigiflazzConfig>> {
        if !self.enabled {
            return Ok(None);
        }
        let mut config = DigiflazzConfig::new(
            required(self.username.as_ref(), "providers.digiflazz.username")?,
            required(self.api_key.as_ref(), "providers.digiflazz.api_key")?,
        );
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        config.webhook_secret.clone_from(&self.webhook_secret);
        config.timeout_seconds = self.timeout_seconds.value().as_secs();
        config.production = environment == Environment::Production;
        Ok(Some(config))
    }
}

/// BangJeff adapter settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BangJeffSettings {
    pub enabled: bool,
    pub member_id: Option<Credential>,
    pub secret_key: Option<Credential>,
    /// Shared token expected on status callbacks
    pub webhook_token: Option<Credential>,
    pub base_url: Option<String>,
    pub timeout_seconds: TimeoutSeconds,
}

impl BangJeffSettings {
    /// Adapter configuration, or `None` when the adapter is disabled
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if the adapter is enabled without credentials
    pub fn client_config(&self) -> ServiceResult<Option<BangJeffConfig>> {
        if !self.enabled {
            return Ok(None);
        }
        let mut config = BangJeffConfig::new(
            required(self.member_id.as_ref(), "providers.bangjeff.member_id")?,
            required(self.secret_key.as_ref(), "providers.bangjeff.secret_key")?,
        );
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        config.webhook_token.clone_from(&self.webhook_token);
        config.timeout_seconds = self.timeout_seconds.value().as_secs();
        Ok(Some(config))
    }
}

/// VIP Reseller adapter settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VipResellerSettings {
    pub enabled: bool,
    pub api_id: Option<Credential>,
    pub api_key: Option<Credential>,
    pub base_url: Option<String>,
    pub timeout_seconds: TimeoutSeconds,
}

impl VipResellerSettings {
    /// Adapter configuration, or `None` when the adapter is disabled
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if the adapter is enabled without credentials
    pub fn client_config(&self) -> ServiceResult<Option<VipResellerConfig>> {
        if !self.enabled {
            return Ok(None);
        }
        let mut config = VipResellerConfig::new(
            required(self.api_id.as_ref(), "providers.vipreseller.api_id")?,
            required(self.api_key.as_ref(), "providers.vipreseller.api_key")?,
        );
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        config.timeout_seconds = self.timeout_seconds.value().as_secs();
        Ok(Some(config))
    }
}

fn required(value: Option<&Credential>, key: &str) -> ServiceResult<Credential> {
    value
        .cloned()
        .ok_or_else(|| ServiceError::config(format!("{key} is required")))
}

/// Per-adapter settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub digiflazz: DigiflazzSettings,
    pub bangjeff: BangJeffSettings,
    pub vipreseller: VipResellerSettings,
}

/// Service configuration for different environments
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Environment type
    pub environment: Environment,
    /// Health monitor settings
    #[serde(default)]
    pub health_check: HealthCheckSettings,
    /// Adapter settings
    #[serde(default)]
    pub providers: ProvidersSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            health_check: HealthCheckSettings::default(),
            providers: ProvidersSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServiceResult<Self> {
        Self::load().map_err(|e| ServiceError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration from the working directory
    ///
    /// The `ENVIRONMENT` variable picks the environment-specific file and
    /// overrides the `environment` key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT").ok();
        Self::load_from(Path::new("."), environment.as_deref())
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (`dir/config.json`)
    /// 3. Environment-specific file (`dir/config.{env}.json`)
    /// 4. Environment variables with `FULFILLMENT__` prefix and `__` separators
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load_from(dir: &Path, environment: Option<&str>) -> Result<Self, ConfigError> {
        Self::build(dir, environment, None)
    }

    /// Same as [`ServiceConfig::load_from`], reading variables from `vars`
    /// instead of the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load_with_vars(
        dir: &Path,
        environment: Option<&str>,
        vars: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::build(dir, environment, Some(vars))
    }

    fn build(
        dir: &Path,
        environment: Option<&str>,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let env_name = environment.unwrap_or("development").to_lowercase();

        // Variables stay strings: credentials such as `000123` must not be
        // reparsed as numbers. Numeric and boolean keys still deserialize from
        // their string form.
        let mut config_builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("health_check.interval_seconds", DEFAULT_INTERVAL_SECONDS)?
            .set_default("health_check.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .add_source(File::from(dir.join("config.json")).required(false))
            .add_source(File::from(dir.join(format!("config.{env_name}.json"))).required(false))
            .add_source(
                ConfigEnv::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .source(vars),
            );

        if environment.is_some() {
            config_builder = config_builder.set_override("environment", env_name)?;
        }

        config_builder.build()?.try_deserialize()
    }
}
