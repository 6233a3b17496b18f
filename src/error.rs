use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    // IO-related errors
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory: {path}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Data processing errors
    #[error("Failed to parse JSON: {context}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse JSON from stdin")]
    StdinJsonParse(#[from] serde_json::Error),

    #[error("Unsupported cache store version {found}")]
    StoreVersion { found: u32 },

    // Environment-related errors
    #[error("Home directory not found")]
    HomeNotFound,

    // Runtime errors
    #[error("Background task failed")]
    TaskJoin(#[from] tokio::task::JoinError),

    // Runtime setup
    #[error("Failed to configure thread pool")]
    ThreadPoolInit(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, StatusError>;
