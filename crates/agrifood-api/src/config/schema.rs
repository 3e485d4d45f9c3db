use std::net::{IpAddr, SocketAddr};

use agrifood_core::error::{AgriFoodError, Result};
use agrifood_core::metrics::validate_metric_name;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AgriFoodError::BadRequest(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }

    /// Apply the `PORT` environment value. Unset or empty keeps the configured port.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        let Some(raw) = port.map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        let port: u16 = raw.parse().map_err(|_| {
            AgriFoodError::BadRequest(format!("PORT must be a port number, got {raw:?}"))
        })?;
        self.server.port = port;
        self.server.validate()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let host = &self.server.host;
        let ip: IpAddr = host.parse().map_err(|_| {
            AgriFoodError::BadRequest(format!("server.host {host:?} is not an IP address"))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AgriFoodError::BadRequest("server.port must be non-zero".into()));
        }
        if self.host.parse::<IpAddr>().is_err() {
            return Err(AgriFoodError::BadRequest(format!(
                "server.host {:?} is not an IP address",
                self.host
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Prefix for the built-in process metrics.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_true")]
    pub default_metrics: bool,

    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            default_metrics: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        // A prefix is valid if it forms a valid name on its own.
        if !self.prefix.is_empty() && validate_metric_name(&self.prefix).is_err() {
            return Err(AgriFoodError::BadRequest(format!(
                "metrics.prefix {:?} is not a valid metric name prefix",
                self.prefix
            )));
        }
        if self.duration_buckets.is_empty() {
            return Err(AgriFoodError::BadRequest(
                "metrics.duration_buckets must not be empty".into(),
            ));
        }
        if self.duration_buckets.iter().any(|b| !b.is_finite())
            || self.duration_buckets.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(AgriFoodError::BadRequest(
                "metrics.duration_buckets must be finite and strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

fn default_prefix() -> String {
    "agri_food_api_".into()
}
fn default_true() -> bool {
    true
}
fn default_duration_buckets() -> Vec<f64> {
    vec![0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0]
}
