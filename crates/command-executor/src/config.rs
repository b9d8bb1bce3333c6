//! Executor configuration
//!
//! Every field has a default so an empty YAML document is a valid configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for an [`Executor`](crate::executor::Executor)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// How logical binary names are mapped to executables
    pub resolver: ResolverConfig,
    /// Wall-clock timeout applied when an invocation does not set its own
    pub default_timeout_ms: Option<u64>,
    /// Environment overrides applied to every invocation
    pub env: HashMap<String, String>,
}

impl ExecutorConfig {
    /// Parse a configuration from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// The default timeout as a `Duration`
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

/// Binary resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Environment variable naming the alternate bundled-install directory
    pub alternate_install_var: String,
    /// Environment variable holding the executable search path
    pub path_var: String,
    /// Suffixes tried after the logical name, in order
    pub executable_suffixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let executable_suffixes = if cfg!(windows) {
            vec![String::new(), ".exe".to_string()]
        } else {
            vec![String::new()]
        };

        Self {
            alternate_install_var: "DOCKER_TOOLBOX_INSTALL_PATH".to_string(),
            path_var: "PATH".to_string(),
            executable_suffixes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ExecutorConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ExecutorConfig::default());
        assert_eq!(config.resolver.path_var, "PATH");
        assert!(config.default_timeout().is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
default_timeout_ms: 2500
resolver:
  alternate_install_var: PODMAN_INSTALL_DIR
env:
  DOCKER_HOST: tcp://127.0.0.1:2376
"#;
        let config = ExecutorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.resolver.alternate_install_var, "PODMAN_INSTALL_DIR");
        assert_eq!(config.resolver.path_var, "PATH");
        assert_eq!(
            config.env.get("DOCKER_HOST").map(String::as_str),
            Some("tcp://127.0.0.1:2376")
        );
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(ExecutorConfig::from_yaml_str("default_timeout_ms: [nope").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExecutorConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, ExecutorConfig::default());
    }
}
