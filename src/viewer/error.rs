use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize settings: {0}")]
    ConfigSerialize(#[from] ron::Error),

    #[error("failed to write {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{0}")]
    Cli(String),

    #[error("model url is empty")]
    EmptyUrl,

    #[error("failed to load model '{url}': {reason}")]
    ModelLoad { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ViewerError>;
