use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScripError {
    #[error("No scrip store here. Run 'scrip init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .scrip/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Could not open store '{target}': {message}")]
    Connection { target: String, message: String },

    #[error("Statement failed: {0}")]
    Statement(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File error: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("Scrip not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Scrip has no id; it must be created before it can be changed")]
    NotPersisted,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for ScripError {
    fn from(e: rusqlite::Error) -> Self {
        ScripError::Statement(format!("SQLite error: {}", e))
    }
}

impl From<tokio::task::JoinError> for ScripError {
    fn from(e: tokio::task::JoinError) -> Self {
        ScripError::Task(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScripError>;
