use thiserror::Error;

/// Result type for strut operations
pub type StrutResult<T> = Result<T, StrutError>;

/// Errors raised while configuring routes or serializing the definition
///
/// Reflection and schema aggregation never fail; everything here comes from
/// I/O, encoding or conflicting registrations.
#[derive(Debug, Error)]
pub enum StrutError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The same verb was registered twice on one path
    #[error("Route {verb} {path} is already registered")]
    DuplicateRoute { verb: String, path: String },

    /// Two operations share an operationId
    #[error("operationId '{operation_id}' is already in use")]
    DuplicateOperationId { operation_id: String },
}

impl StrutError {
    /// Create a new configuration error
    pub fn config_error<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    pub fn duplicate_route(verb: impl ToString, path: impl ToString) -> Self {
        Self::DuplicateRoute {
            verb: verb.to_string(),
            path: path.to_string(),
        }
    }

    pub fn duplicate_operation_id(operation_id: impl ToString) -> Self {
        Self::DuplicateOperationId {
            operation_id: operation_id.to_string(),
        }
    }

    /// True for errors caused by conflicting registrations
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRoute { .. } | Self::DuplicateOperationId { .. }
        )
    }
}
