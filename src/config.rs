//! # Client Configuration
//!
//! Configuration for the dispatcher client. Loaded once at process start and
//! shared by reference (`Arc<ClientConfig>`) with every sub-client; nothing
//! mutates it afterwards.
//!
//! Precedence (lowest to highest):
//! 1. Built-in defaults
//! 2. Config file (`hatchet.yaml` / `hatchet.toml` in the working directory, or an explicit path)
//! 3. Environment variables (`HATCHET_CLIENT_*`)
//! 4. Explicit [`ClientConfigOverrides`]

use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{DispatcherError, DispatcherResult};

const DEFAULT_CONFIG_NAME: &str = "hatchet";

/// Environment variable → config key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HATCHET_CLIENT_TENANT_ID", "tenant_id"),
    ("HATCHET_CLIENT_HOST_PORT", "host_port"),
    ("HATCHET_CLIENT_TOKEN", "token"),
    ("HATCHET_CLIENT_TLS_STRATEGY", "tls.strategy"),
    ("HATCHET_CLIENT_TLS_CERT_FILE", "tls.cert_file"),
    ("HATCHET_CLIENT_TLS_KEY_FILE", "tls.key_file"),
    ("HATCHET_CLIENT_TLS_ROOT_CA_FILE", "tls.ca_file"),
    ("HATCHET_CLIENT_TLS_SERVER_NAME", "tls.server_name"),
    ("HATCHET_CLIENT_LISTENER_MAX_RETRIES", "listener.max_retries"),
    ("HATCHET_CLIENT_LISTENER_RETRY_INTERVAL_MS", "listener.retry_interval_ms"),
    ("HATCHET_CLIENT_LISTENER_OPEN_GRACE_MS", "listener.open_grace_ms"),
];

/// Dispatcher client configuration
///
/// # Examples
///
/// ```rust
/// use hatchet_dispatcher::config::ClientConfig;
///
/// let config = ClientConfig::for_tenant("707d0855-80ab-4e1f-a156-f1c4546cbf52");
/// assert_eq!(config.host_port, "localhost:7070");
/// assert_eq!(config.listener.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub tenant_id: String,
    /// Dispatcher address as `host:port`
    pub host_port: String,
    /// Bearer token sent with every call (if required)
    pub token: Option<String>,
    pub tls: TlsConfig,
    pub listener: ListenerConfig,
    pub connect_timeout_ms: u64,
    /// Deadline for unary calls; the listen stream is never subject to it
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsStrategy {
    None,
    #[default]
    Tls,
    Mtls,
}

impl fmt::Display for TlsStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsStrategy::None => write!(f, "none"),
            TlsStrategy::Tls => write!(f, "tls"),
            TlsStrategy::Mtls => write!(f, "mtls"),
        }
    }
}

/// TLS material for the dispatcher connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub strategy: TlsStrategy,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    /// Root CA; native roots are used when absent
    pub ca_file: Option<PathBuf>,
    /// Overrides the server name checked against the certificate
    pub server_name: Option<String>,
}

/// Resubscribe behaviour of the action listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Attempts per resubscribe invocation
    pub max_retries: u32,
    /// Fixed delay before each attempt
    pub retry_interval_ms: u64,
    /// How long opening a listen call waits for response headers before the
    /// handle is returned anyway. Errors inside this window fail the open.
    pub open_grace_ms: u64,
}

impl ListenerConfig {
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    #[must_use]
    pub fn open_grace(&self) -> Duration {
        Duration::from_millis(self.open_grace_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_interval_ms: 5000,
            open_grace_ms: 1000,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            host_port: "localhost:7070".to_string(),
            token: None,
            tls: TlsConfig::default(),
            listener: ListenerConfig::default(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Explicit values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct ClientConfigOverrides {
    pub tenant_id: Option<String>,
    pub host_port: Option<String>,
    pub token: Option<String>,
    pub tls_strategy: Option<TlsStrategy>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
    pub server_name: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_interval_ms: Option<u64>,
}

fn config_error(e: config::ConfigError) -> DispatcherError {
    DispatcherError::config_error(e.to_string())
}

fn path_value(path: Option<PathBuf>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

impl ClientConfig {
    /// Defaults with the given tenant, mostly useful in tests and examples
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    /// Load configuration from defaults, config file, environment and overrides.
    ///
    /// A missing default config file is fine; a missing explicit `path` is an error.
    pub fn load(path: Option<&Path>, overrides: ClientConfigOverrides) -> DispatcherResult<Self> {
        Self::load_with_env(path, overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::load`], reading environment values through `env`
    pub fn load_with_env<F>(
        path: Option<&Path>,
        overrides: ClientConfigOverrides,
        env: F,
    ) -> DispatcherResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => {
                debug!("Loading dispatcher config from: {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        for (var, key) in ENV_OVERRIDES {
            builder = builder
                .set_override_option(*key, env(*var))
                .map_err(config_error)?;
        }

        builder = builder
            .set_override_option("tenant_id", overrides.tenant_id)
            .and_then(|b| b.set_override_option("host_port", overrides.host_port))
            .and_then(|b| b.set_override_option("token", overrides.token))
            .and_then(|b| {
                b.set_override_option("tls.strategy", overrides.tls_strategy.map(|s| s.to_string()))
            })
            .and_then(|b| b.set_override_option("tls.cert_file", path_value(overrides.cert_file)))
            .and_then(|b| b.set_override_option("tls.key_file", path_value(overrides.key_file)))
            .and_then(|b| b.set_override_option("tls.ca_file", path_value(overrides.ca_file)))
            .and_then(|b| b.set_override_option("tls.server_name", overrides.server_name))
            .and_then(|b| b.set_override_option("listener.max_retries", overrides.max_retries))
            .and_then(|b| {
                b.set_override_option("listener.retry_interval_ms", overrides.retry_interval_ms)
            })
            .map_err(config_error)?;

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(config_error)?;

        config.validate()?;

        debug!(
            tenant_id = %config.tenant_id,
            host_port = %config.host_port,
            tls = %config.tls.strategy,
            max_retries = config.listener.max_retries,
            retry_interval_ms = config.listener.retry_interval_ms,
            "Loaded dispatcher client configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> DispatcherResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(DispatcherError::config_error("tenant_id must be set"));
        }

        let port_ok = self
            .host_port
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !port_ok {
            return Err(DispatcherError::config_error(format!(
                "host_port must look like host:port, got '{}'",
                self.host_port
            )));
        }

        if self.tls.strategy == TlsStrategy::Mtls
            && (self.tls.cert_file.is_none() || self.tls.key_file.is_none())
        {
            return Err(DispatcherError::config_error(
                "mtls requires both tls.cert_file and tls.key_file",
            ));
        }

        if self.listener.max_retries == 0 {
            return Err(DispatcherError::config_error(
                "listener.max_retries must be at least 1",
            ));
        }

        Ok(())
    }

    /// URI handed to the transport, scheme chosen by the TLS strategy
    #[must_use]
    pub fn endpoint_uri(&self) -> String {
        match self.tls.strategy {
            TlsStrategy::None => format!("http://{}", self.host_port),
            TlsStrategy::Tls | TlsStrategy::Mtls => format!("https://{}", self.host_port),
        }
    }
}
