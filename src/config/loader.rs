//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DiscoveryConfig;
use crate::config::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DiscoveryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: DiscoveryConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_loads_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[backend]
name = "cluster1"

[[inventory.partitions]]
name = "finance"

[[inventory.partitions.load_balancers]]
name = "prod"

[[inventory.partitions.load_balancers.listeners]]
name = "http"
port = 80
members = [{{ address = "10.0.0.1", port = 8080 }}]
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backend.name, "cluster1");
        assert_eq!(config.queue.workers, 2);
        assert_eq!(config.inventory.partitions[0].load_balancers[0].name, "prod");
    }

    #[test]
    fn test_rejects_invalid_backend_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[backend]\nname = \"Bad_Name\"\n").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/discovery.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
