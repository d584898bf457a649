use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExitForgeError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Mutation error: {0}")]
    Mutation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExitForgeError>;
