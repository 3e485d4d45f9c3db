//! API config loader (strict parsing + env override).

pub mod schema;

use std::{env, fs};

use agrifood_core::error::{AgriFoodError, Result};

pub use schema::{ApiConfig, MetricsSection, ServerSection};

/// Optional path to a YAML config file.
pub const CONFIG_PATH_ENV: &str = "AGRIFOOD_CONFIG";
/// Listen port override.
pub const PORT_ENV: &str = "PORT";

pub fn load_from_file(path: &str) -> Result<ApiConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AgriFoodError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ApiConfig> {
    let cfg: ApiConfig = serde_yaml::from_str(s)
        .map_err(|e| AgriFoodError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Defaults, or the file named by `AGRIFOOD_CONFIG`, then the `PORT` override.
pub fn load_from_env() -> Result<ApiConfig> {
    let mut cfg = match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_from_file(&path)?,
        _ => ApiConfig::default(),
    };
    let port = env::var(PORT_ENV).ok();
    cfg.apply_port_override(port.as_deref())?;
    Ok(cfg)
}
