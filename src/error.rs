use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckgateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Checklist validation failed:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("Circular inheritance detected: {}", .chain.join(" -> "))]
    Inheritance { chain: Vec<String> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store is locked: {0}")]
    LockTimeout(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Batch execution rolled back: {0}")]
    Rollback(#[source] Box<CheckgateError>),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Project not initialized. Run 'checkgate init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

impl From<rusqlite::Error> for CheckgateError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => {
                CheckgateError::InvalidArgument(format!("integrity constraint violated: {}", err))
            }
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                CheckgateError::LockTimeout(err.to_string())
            }
            _ => CheckgateError::Store(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckgateError>;
