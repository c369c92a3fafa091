use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Spreadsheet import configuration
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database type (postgres)
    #[serde(default = "default_db_type", rename = "type")]
    pub db_type: String,
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_db_name", rename = "database")]
    pub name: String,
    /// Database user
    #[serde(default = "default_db_user", rename = "username")]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// Create missing tables on start-up
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Name of the sheet holding user rows
    #[serde(default = "default_user_sheet")]
    pub user_sheet: String,
    /// Name of the sheet holding permission rows
    #[serde(default = "default_permission_sheet")]
    pub permission_sheet: String,
    /// Maximum upload size in bytes (default: 10MB)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_type() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "ims".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_auto_migrate() -> bool {
    true
}

fn default_user_sheet() -> String {
    "User".to_string()
}

fn default_permission_sheet() -> String {
    "Thong_tin_phan_quyen".to_string()
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: default_db_type(),
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            auto_migrate: default_auto_migrate(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            user_sheet: default_user_sheet(),
            permission_sheet: default_permission_sheet(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl DatabaseConfig {
    /// Generate database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
