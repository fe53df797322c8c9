//! Configuration for imapsrv

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "IMAPSRV_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// IMAP configuration
    #[serde(default)]
    pub imap: ImapConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Mailstore configuration
    #[serde(default)]
    pub mailstore: MailstoreConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

/// IMAP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapConfig {
    /// IMAP server bind address
    #[serde(default = "default_imap_bind")]
    pub bind: String,

    /// Idle session timeout in minutes
    #[serde(default = "default_imap_timeout")]
    pub timeout_minutes: i64,

    /// Maximum concurrent connections
    #[serde(default = "default_imap_max_connections")]
    pub max_connections: usize,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            bind: default_imap_bind(),
            timeout_minutes: default_imap_timeout(),
            max_connections: default_imap_max_connections(),
        }
    }
}

fn default_imap_bind() -> String {
    "0.0.0.0:143".to_string()
}

fn default_imap_timeout() -> i64 {
    30
}

fn default_imap_max_connections() -> usize {
    1000
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Mailstore configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailstoreConfig {
    /// TOML file describing the mailbox tree; an empty store is used when unset
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from the environment override or default locations,
    /// falling back to built-in defaults
    pub fn load() -> crate::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(std::path::Path::new(&path));
        }

        let paths = [
            PathBuf::from("./imapsrv.toml"),
            PathBuf::from("/etc/imapsrv/imapsrv.toml"),
        ];

        for path in paths {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration");
                return Self::from_file(&path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.hostname, "localhost");
        assert_eq!(config.imap.bind, "0.0.0.0:143");
        assert_eq!(config.imap.timeout_minutes, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.mailstore.path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
hostname = "mail.example.com"

[imap]
bind = "127.0.0.1:1143"
max_connections = 10

[mailstore]
path = "/data/mailboxes.toml"
"#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.server.hostname, "mail.example.com");
        assert_eq!(config.imap.bind, "127.0.0.1:1143");
        assert_eq!(config.imap.max_connections, 10);
        assert_eq!(config.imap.timeout_minutes, 30);
        assert_eq!(
            config.mailstore.path,
            Some(PathBuf::from("/data/mailboxes.toml"))
        );
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = Config::from_toml("[imap]\nmax_connections = \"many\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
    }
}
