use crate::error::{StrutError, StrutResult};
use crate::specification::{Info, Server};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default request body limit (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Configuration for a [`crate::Strut`] instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrutConfig {
    /// OpenAPI specification version (should be "3.0.3")
    pub openapi_version: String,

    /// API information
    pub info: Info,

    /// Servers listed in the document
    pub servers: Vec<Server>,

    /// What happens when a route or operationId is registered twice
    pub duplicate_policy: DuplicatePolicy,

    /// Documentation endpoints
    pub docs: DocsConfig,

    /// Maximum accepted request body size in bytes
    pub body_limit: usize,
}

/// How repeated registrations are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the registration with a conflict error
    #[default]
    Reject,
    /// Replace the earlier registration, logging a warning
    Overwrite,
}

/// Where the generated document is served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Whether the documentation endpoints are mounted at all
    pub enabled: bool,
    pub json_path: String,
    pub yaml_path: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            json_path: "/.well-known/openapi.json".to_string(),
            yaml_path: "/.well-known/openapi.yaml".to_string(),
        }
    }
}

impl Default for StrutConfig {
    fn default() -> Self {
        Self {
            openapi_version: "3.0.3".to_string(),
            info: Info::default(),
            servers: Vec::new(),
            duplicate_policy: DuplicatePolicy::default(),
            docs: DocsConfig::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl StrutConfig {
    /// Create a new configuration with custom API info
    pub fn new(title: &str, version: &str) -> Self {
        let mut config = Self::default();
        config.info.title = title.to_string();
        config.info.version = version.to_string();
        config
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(source: &str) -> StrutResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> StrutResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    /// Add a server configuration
    pub fn with_server(mut self, url: &str, description: &str) -> Self {
        self.servers.push(Server::new(url, description));
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_docs_paths(mut self, json_path: &str, yaml_path: &str) -> Self {
        self.docs.json_path = json_path.to_string();
        self.docs.yaml_path = yaml_path.to_string();
        self
    }

    pub fn without_docs(mut self) -> Self {
        self.docs.enabled = false;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> StrutResult<()> {
        if self.openapi_version.is_empty() {
            return Err(StrutError::config_error("openapi_version cannot be empty"));
        }

        if self.info.title.is_empty() {
            return Err(StrutError::config_error("API title cannot be empty"));
        }

        if self.info.version.is_empty() {
            return Err(StrutError::config_error("API version cannot be empty"));
        }

        if self.servers.iter().any(|server| server.url.is_empty()) {
            return Err(StrutError::config_error("server url cannot be empty"));
        }

        if self.docs.enabled {
            for path in [&self.docs.json_path, &self.docs.yaml_path] {
                if !path.starts_with('/') {
                    return Err(StrutError::config_error(format!(
                        "documentation path '{}' must start with '/'",
                        path
                    )));
                }
            }
            if self.docs.json_path == self.docs.yaml_path {
                return Err(StrutError::config_error(
                    "documentation paths for JSON and YAML must differ",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StrutConfig::default();
        assert_eq!(config.openapi_version, "3.0.3");
        assert_eq!(config.info.title, "strut");
        assert_eq!(config.info.version, "v0.0.1");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.docs.enabled);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = StrutConfig::from_toml_str(
            r#"
            duplicate_policy = "overwrite"

            [info]
            title = "Pets"
            version = "1.2.0"

            [[servers]]
            url = "https://api.example.com"
            description = "Production"

            [docs]
            json_path = "/openapi.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.info.title, "Pets");
        assert_eq!(config.info.version, "1.2.0");
        assert_eq!(config.info.description.as_deref(), Some("strut"));
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.docs.json_path, "/openapi.json");
        assert_eq!(config.docs.yaml_path, "/.well-known/openapi.yaml");
        assert_eq!(config.openapi_version, "3.0.3");
    }

    #[test]
    fn test_invalid_toml() {
        let err = StrutConfig::from_toml_str("info = 3").unwrap_err();
        assert!(matches!(err, StrutError::Toml(_)));
    }

    #[test]
    fn test_validation_errors() {
        let config = StrutConfig::new("", "1.0");
        assert!(matches!(config.validate(), Err(StrutError::Config(_))));

        let config = StrutConfig::default().with_docs_paths("openapi.json", "/openapi.yaml");
        assert!(config.validate().is_err());

        let config = StrutConfig::default().with_docs_paths("/same", "/same");
        assert!(config.validate().is_err());

        let config = StrutConfig::default()
            .with_docs_paths("bad", "bad")
            .without_docs();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "body_limit = 1024\n[info]\ntitle = \"File\"").unwrap();

        let config = StrutConfig::from_file(file.path()).unwrap();
        assert_eq!(config.body_limit, 1024);
        assert_eq!(config.info.title, "File");

        let missing = StrutConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(StrutError::Io(_))));
    }
}
