//! Service configuration.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. `./config.*`
//! 2. `/config/config.*`
//! 3. `/secrets/config.*`
//! 4. `IG_`-prefixed environment variables, with `__` between nested keys
//!    (`IG_METRICS__ENABLED=true`, `IG_APIS__IMAGE__URL=http://...`).
//!
//! Every file is optional; any format supported by the `config` crate works.

use crate::Error;
use config::{Environment, File, FileFormat};
use serde::Deserialize;
use std::{collections::HashMap, net::SocketAddr, time::Duration};

const ENV_PREFIX: &str = "IG";

/// Name of the API entry serving images.
pub const IMAGE_API: &str = "image";

/// Name of the API entry receiving access logs.
pub const ACCESS_API: &str = "access";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub environment: String,
    pub server: ServerSection,
    pub metrics: MetricsSection,
    pub faults: FaultSection,
    pub template: TemplateSection,
    pub client: ClientSection,
    pub apis: HashMap<String, ApiSection>,
}

impl Config {
    /// Load configuration from disk and environment.
    pub fn load() -> Result<Self, Error> {
        let builder = config::Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("/config/config").required(false))
            .add_source(File::with_name("/secrets/config").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a single TOML document.
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        let config: Self = config::Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, once serving.
    pub fn validate(&self) -> Result<(), Error> {
        let probability = self.faults.failure_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::InvalidConfig(format!(
                "faults.failure_probability must be between 0 and 1, got {}",
                probability
            )));
        }

        if self.client.timeout_secs == 0 {
            return Err(Error::InvalidConfig(String::from(
                "client.timeout_secs must be greater than 0",
            )));
        }

        self.server.socket_addr()?;
        Ok(())
    }

    /// URL of the named upstream API.
    pub fn api_url(&self, name: &str) -> Result<&str, Error> {
        self.apis
            .get(name)
            .map(|api| api.url.as_str())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("apis.{}.url is not set", name)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_address: String,
}

impl ServerSection {
    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        self.bind_address.parse().map_err(|e| {
            Error::InvalidConfig(format!(
                "server.bind_address {:?} is not a socket address: {}",
                self.bind_address, e
            ))
        })
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MetricsSection {
    /// Wrap the gallery route and expose `/metrics`.
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FaultSection {
    /// Share of gallery requests answered with an injected 500.
    pub failure_probability: f64,
}

impl Default for FaultSection {
    fn default() -> Self {
        Self {
            failure_probability: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateSection {
    pub path: String,
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            path: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub timeout_secs: u64,
}

impl ClientSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientSection {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApiSection {
    pub url: String,
}
