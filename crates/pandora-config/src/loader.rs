//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, LogFormat, PandoraConfig};

/// Environment variable naming the optional TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "PANDORA_CONFIG";

/// Configuration loader applying defaults, then a file, then environment
/// variables.
///
/// # Example
///
/// ```no_run
/// use pandora_config::ConfigLoader;
///
/// # fn main() -> Result<(), pandora_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("pandora.toml")?
///     .with_env()?
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: PandoraConfig,
}

impl ConfigLoader {
    /// Create a loader holding the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay a TOML file. The file must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        self.config = toml::from_str(&content)?;
        Ok(self)
    }

    /// Overlay a TOML file if it exists; missing files are skipped.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Overlay a TOML string (primarily for tests).
    pub fn with_string(mut self, content: &str) -> Result<Self, ConfigError> {
        self.config = toml::from_str(content)?;
        Ok(self)
    }

    /// Overlay `PANDORA_*` environment variables.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(addr) = env::var("PANDORA_HTTP_ADDR") {
            self.config.server.http_addr = addr;
        }
        if let Ok(secs) = env::var("PANDORA_SHUTDOWN_TIMEOUT_SECS") {
            self.config.server.shutdown_timeout_secs =
                parse_var("PANDORA_SHUTDOWN_TIMEOUT_SECS", &secs)?;
        }
        if let Ok(path) = env::var("PANDORA_LOCAL_DOCUMENT_PATH") {
            self.config.export.local_document_path = path.into();
        }
        if let Ok(bucket) = env::var("PANDORA_S3_BUCKET") {
            self.config.export.s3_bucket = bucket;
        }
        if let Ok(key) = env::var("PANDORA_S3_KEY") {
            self.config.export.s3_key = key;
        }
        if let Ok(url) = env::var("PANDORA_S3_ENDPOINT_URL") {
            self.config.export.s3_endpoint_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Ok(flag) = env::var("PANDORA_S3_FORCE_PATH_STYLE") {
            self.config.export.s3_force_path_style =
                parse_var("PANDORA_S3_FORCE_PATH_STYLE", &flag)?;
        }
        if let Ok(max) = env::var("PANDORA_MAX_ENTRIES") {
            self.config.export.max_entries = parse_var("PANDORA_MAX_ENTRIES", &max)?;
        }
        if let Ok(bytes) = env::var("PANDORA_STREAM_BUFFER_BYTES") {
            self.config.export.stream_buffer_bytes =
                parse_var("PANDORA_STREAM_BUFFER_BYTES", &bytes)?;
        }
        if let Ok(secs) = env::var("PANDORA_EXPORT_TIMEOUT_SECS") {
            self.config.export.timeout_secs = parse_var("PANDORA_EXPORT_TIMEOUT_SECS", &secs)?;
        }
        if let Ok(level) = env::var("PANDORA_LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Ok(format) = env::var("PANDORA_LOG_FORMAT") {
            self.config.logging.format = match format.as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::invalid_value(
                        "logging.format",
                        format!("expected 'json' or 'pretty', got {other:?}"),
                    ))
                }
            };
        }
        Ok(self)
    }

    /// Validate and return the layered configuration.
    pub fn load(self) -> Result<PandoraConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Load configuration the way the service binary does: defaults, then the
/// file named by `PANDORA_CONFIG` (if any), then environment overrides.
pub fn load_from_env() -> Result<PandoraConfig, ConfigError> {
    let loader = ConfigLoader::new();
    let loader = match env::var(CONFIG_PATH_VAR) {
        Ok(path) if !path.is_empty() => loader.with_file(path)?,
        _ => loader,
    };
    loader.with_env()?.load()
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::invalid_value(name, format!("cannot parse {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, PandoraConfig::default());
    }

    #[test]
    fn test_loader_with_string() {
        let toml = r#"
            [server]
            http_addr = "127.0.0.1:3000"

            [export]
            max_entries = 50
        "#;
        let config = ConfigLoader::new().with_string(toml).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.export.max_entries, 50);
        // Untouched sections keep their defaults.
        assert_eq!(config.export.s3_bucket, "demo");
    }

    #[test]
    fn test_loader_rejects_unknown_fields() {
        let toml = r#"
            [server]
            http_adr = "127.0.0.1:3000"
        "#;
        assert!(ConfigLoader::new().with_string(toml).is_err());
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[export]\ns3_bucket = \"archive\"").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.export.s3_bucket, "archive");
    }

    #[test]
    fn test_loader_optional_file_missing() {
        let config = ConfigLoader::new()
            .with_optional_file("/definitely/not/here.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, PandoraConfig::default());
    }

    #[test]
    fn test_loader_env_overrides() {
        env::set_var("PANDORA_MAX_ENTRIES", "25");
        env::set_var("PANDORA_LOG_FORMAT", "pretty");
        let config = ConfigLoader::new().with_env().unwrap().load().unwrap();
        env::remove_var("PANDORA_MAX_ENTRIES");
        env::remove_var("PANDORA_LOG_FORMAT");

        assert_eq!(config.export.max_entries, 25);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_rejects_bad_env_value() {
        env::set_var("PANDORA_STREAM_BUFFER_BYTES", "lots");
        let result = ConfigLoader::new().with_env();
        env::remove_var("PANDORA_STREAM_BUFFER_BYTES");
        assert!(result.is_err());
    }
}
