use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TopicFilterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Lookup error: {0}")]
    Lookup(String),
}

pub type Result<T> = std::result::Result<T, TopicFilterError>;
