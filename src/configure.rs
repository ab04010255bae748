use std::collections::HashMap;
use std::fs;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{de, Deserialize, Deserializer};

pub const DEFAULT_CONFIG_PATH: &str = "sftp-listener.json";
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_SERVER_PORT: u16 = 8765;
pub const DEFAULT_SFTP_PORT: u16 = 22;

/// One registered project: a local root paired with a remote SFTP endpoint and root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub local_base_path: String,
    pub sftp_host: String,
    #[serde(default = "default_sftp_port", deserialize_with = "port_from_number_or_string")]
    pub sftp_port: u16,
    pub sftp_user: String,
    #[serde(default)]
    pub sftp_password: String,
    pub sftp_base_path: String,
}

impl ProjectConfig {
    /// `host:port` of the remote endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.sftp_host, self.sftp_port)
    }
}

fn default_sftp_port() -> u16 {
    DEFAULT_SFTP_PORT
}

/// Accepts `22` as well as `"22"`.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    /// Read straight from the JSON file, see [`load_projects`].
    #[serde(skip)]
    pub registered_projects: HashMap<String, ProjectConfig>,
}

#[derive(Debug, Deserialize)]
struct ProjectsFile {
    #[serde(default)]
    registered_projects: HashMap<String, ProjectConfig>,
}

/// Resolve the configuration file path: explicit value, then `CONFIG_PATH`, then the default.
pub fn config_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return path.to_string();
    }
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => path,
        _ => DEFAULT_CONFIG_PATH.to_string(),
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let s = Config::builder()
        // Set defaults
        .set_default("server_port", DEFAULT_SERVER_PORT as i64)?
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/sftp_bridge.log")?
        // Add configuration from the JSON registry file
        .add_source(File::from(path).format(FileFormat::Json))
        // Add configuration from environment variables
        .add_source(Environment::with_prefix("SFTP_BRIDGE"))
        .build()?;

    let mut config: AppConfig = s.try_deserialize()?;
    config.registered_projects = load_projects(path)?;
    validate(&config)?;
    Ok(config)
}

/// Project names are lookup keys and keep their case, which the `config` crate
/// would fold to lowercase.
fn load_projects(path: &Path) -> Result<HashMap<String, ProjectConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    let file: ProjectsFile =
        serde_json::from_str(&raw).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    Ok(file.registered_projects)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    for (name, project) in &config.registered_projects {
        if name.is_empty() {
            return Err(ConfigError::Message("project name must not be empty".into()));
        }
        if project.local_base_path.is_empty() || project.sftp_base_path.is_empty() {
            return Err(ConfigError::Message(format!(
                "project {name}: local_base_path and sftp_base_path are required"
            )));
        }
        if project.sftp_host.is_empty() {
            return Err(ConfigError::Message(format!(
                "project {name}: sftp_host is required"
            )));
        }
    }
    Ok(())
}
