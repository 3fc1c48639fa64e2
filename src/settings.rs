use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::FieldgateError;

/// role -> entity name -> granted group keys
pub type Grants = HashMap<String, HashMap<String, Vec<String>>>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    /// Group grants for the built-in resolver. Production deployments resolve
    /// masks elsewhere and leave this empty.
    #[serde(default)]
    pub grants: Grants,
    /// Roles that may edit every field of every entity.
    #[serde(default)]
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, FieldgateError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)?
            .set_default("server.port", Server::default().port)?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: FIELDGATE__SERVER__PORT=9090, etc.
        builder =
            builder.add_source(config::Environment::with_prefix("FIELDGATE").separator("__"));

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_load_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nonexistent.toml");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert!(settings.grants.is_empty());
        assert!(settings.admins.is_empty());
    }

    #[test]
    fn test_settings_load_grants_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fieldgate.toml");

        let config_content = r#"
admins = ["admin"]

[server]
host = "127.0.0.1"

[grants.editor]
game = ["TITLES", "DATES"]
character = ["PROFILE"]

[grants.translator]
game = ["INTRO"]
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.admins, vec!["admin".to_string()]);
        assert_eq!(settings.grants["editor"]["game"], vec!["TITLES", "DATES"]);
        assert_eq!(settings.grants["editor"]["character"], vec!["PROFILE"]);
        assert_eq!(settings.grants["translator"]["game"], vec!["INTRO"]);
    }

    #[test]
    fn test_settings_env_override() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fieldgate.toml");

        fs::write(&config_path, "[server]\nport = 8090\n").expect("Failed to write config");

        env::set_var("FIELDGATE__SERVER__PORT", "9999");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.port, 9999);

        env::remove_var("FIELDGATE__SERVER__PORT");
    }

    #[test]
    fn test_settings_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("fieldgate.toml");

        fs::write(&config_path, "[server\nhost = ").expect("Failed to write config");

        let err = Settings::load(config_path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, FieldgateError::Config(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn test_bind_addr() {
        let mut settings = Settings::default();
        settings.server.host = "localhost".to_string();
        settings.server.port = 3000;
        assert_eq!(settings.bind_addr(), "localhost:3000");
    }
}
