use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Cannot {action} while in the {state} state")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
