use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayError {
    ConfigurationError(String),
    OrchestrationError(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            RelayError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
        }
    }
}

impl std::error::Error for RelayError {}

pub type Result<T> = std::result::Result<T, RelayError>;
