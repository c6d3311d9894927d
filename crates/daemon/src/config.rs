//! Daemon configuration
//!
//! Layers, lowest first: built-in defaults, optional TOML file, then
//! `JOBSWEEP_*` environment variables (`__` separates nested keys, e.g.
//! `JOBSWEEP_POLL__INTERVAL_MS=500`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use jobsweep_core::application::{PollConfig, ResolutionMode};
use jobsweep_infra_html::ResolverSettings;
use serde::Deserialize;

const APP_NAME: &str = "jobsweep";
const ENV_PREFIX: &str = "JOBSWEEP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub poll: PollSection,
    pub storage: StorageSection,
    pub rpc: RpcSection,
    pub resolver: ResolverSection,
    pub page: PageSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollSection {
    pub interval_ms: u64,
    pub sweep_interval_secs: u64,
    pub resolution_mode: ResolutionMode,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            sweep_interval_secs: 3600,
            resolution_mode: ResolutionMode::FireAndForget,
        }
    }
}

impl PollSection {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.interval_ms.max(1)),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            resolution_mode: self.resolution_mode,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// `~` is expanded; unset means the platform data directory
    pub db_path: Option<String>,
}

impl StorageSection {
    pub fn database_url(&self) -> Result<String> {
        let path = match &self.db_path {
            Some(path) if path == ":memory:" => return Ok("sqlite::memory:".to_string()),
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => project_dirs()?.data_dir().join("store.db"),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(format!("sqlite://{}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcSection {
    pub host: String,
    pub port: u16,
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9631,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    pub endpoint_template: String,
    pub cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub url_attribute: String,
    /// Unset means no client-side timeout
    pub timeout_secs: Option<u64>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        let defaults = ResolverSettings::default();
        Self {
            endpoint_template: defaults.endpoint_template,
            cookie: None,
            csrf_token: None,
            url_attribute: defaults.url_attribute,
            timeout_secs: defaults.timeout.map(|t| t.as_secs()),
        }
    }
}

impl ResolverSection {
    pub fn to_settings(&self) -> ResolverSettings {
        ResolverSettings {
            endpoint_template: self.endpoint_template.clone(),
            cookie: self.cookie.clone(),
            csrf_token: self.csrf_token.clone(),
            url_attribute: self.url_attribute.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Optional page loaded at startup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageSection {
    pub url: Option<String>,
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: LogFormat,
    /// Daily-rolling log file directory; stdout only when unset
    pub directory: Option<String>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME).context("Could not determine home directory")
}

/// Default config file location (`<config dir>/jobsweep/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs()
        .ok()
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from the process environment
pub fn load(path: Option<&Path>) -> Result<DaemonConfig> {
    load_from(path, None)
}

/// Load configuration with an explicit environment (`None` reads the process environment)
pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<DaemonConfig> {
    let mut builder = Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(default) = default_config_path() {
                builder =
                    builder.add_source(File::from(default).format(FileFormat::Toml).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load_from(None, env(&[])).unwrap();

        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.resolution_mode, ResolutionMode::FireAndForget);
        assert_eq!(config.rpc.port, 9631);
        assert_eq!(config.resolver.url_attribute, "companyApplyUrl");
        assert_eq!(config.resolver.to_settings().timeout, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_then_env_override() {
        let path = std::env::temp_dir().join(format!("jobsweep-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[poll]\ninterval_ms = 500\nresolution_mode = \"serialized\"\n\n[rpc]\nport = 7000\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = load_from(
            Some(&path),
            env(&[
                ("JOBSWEEP_RPC__PORT", "7100"),
                ("JOBSWEEP_RESOLVER__CSRF_TOKEN", "ajax:9"),
                ("JOBSWEEP_RESOLVER__TIMEOUT_SECS", "15"),
            ]),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.poll.resolution_mode, ResolutionMode::Serialized);
        assert_eq!(config.rpc.port, 7100);
        assert_eq!(config.resolver.csrf_token.as_deref(), Some("ajax:9"));
        assert_eq!(config.resolver.to_settings().timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.poll.to_poll_config().interval, Duration::from_millis(500));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let missing = std::env::temp_dir().join("jobsweep-does-not-exist.toml");
        assert!(load_from(Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn test_memory_database_url() {
        let storage = StorageSection {
            db_path: Some(":memory:".to_string()),
        };
        assert_eq!(storage.database_url().unwrap(), "sqlite::memory:");
    }
}
