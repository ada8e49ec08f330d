// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
};

impl Config {
    /// Load configuration from the default "config.toml"
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension),
    /// merged with `DFCI_*` environment variables and built-in defaults
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DFCI"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.root", "Dfci_Database")?
            .set_default("storage.static_dir", "static")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            // The identity-apply UEFI variable ceiling, 16 KiB
            .set_default("http.max_body_size", 16_384)?
            .set_default("http.external_host", "mikeytbds3.eastus.cloudapp.azure.com")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = Config::load_from("no_such_config_file").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.root, "Dfci_Database");
        assert_eq!(cfg.storage.static_dir, "static");
        assert_eq!(cfg.http.max_body_size, 16_384);
        assert!(cfg.server.workers.is_none());
        assert!(cfg.performance.max_connections.is_none());
        assert_eq!(cfg.logging.access_log_format, "combined");
    }

    #[test]
    fn test_socket_addr_from_defaults() {
        let cfg = Config::load_from("no_such_config_file").unwrap();
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
