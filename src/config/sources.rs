use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "MEDIAGATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/mediagate.toml";
const ENV_PREFIX: &str = "MEDIAGATE";
const ENV_SEPARATOR: &str = "__";

pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS_B64";
pub const YOUTUBE_API_KEY_ENV_VAR: &str = "YOUTUBE_API_KEY";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(credentials) = env::var(CREDENTIALS_ENV_VAR) {
        config.firestore.credentials_b64 = Some(credentials).filter(|value| !value.is_empty());
    }
    if let Ok(api_key) = env::var(YOUTUBE_API_KEY_ENV_VAR) {
        config.youtube.api_key = Some(api_key).filter(|value| !value.is_empty());
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MEDIAGATE__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.firestore.collection, "myvue3food");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"

[upstream]
request_timeout = "30s"
connect_timeout = 2

[firestore]
project_id = "other-project"
collection = "recipes"

[bilibili]
proxy_timeout = "2500ms"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.upstream.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(config.upstream.connect_timeout.as_duration(), Duration::from_secs(2));
        assert_eq!(config.firestore.project_id, "other-project");
        assert_eq!(config.firestore.collection, "recipes");
        assert_eq!(config.firestore.database, "(default)");
        assert_eq!(config.bilibili.proxy_timeout.as_duration(), Duration::from_millis(2500));
        assert_eq!(config.bilibili.referer, "https://www.bilibili.com/");
    }

    #[test]
    fn test_secrets_are_not_read_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[youtube]
api_key = "should-be-ignored"

[firestore]
credentials_b64 = "should-be-ignored"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert!(config.youtube.api_key.is_none());
        assert!(config.firestore.credentials_b64.is_none());
    }

    // Environment overrides need env::set_var, which is unsafe under edition 2024;
    // they are exercised by running the binary instead.
}
