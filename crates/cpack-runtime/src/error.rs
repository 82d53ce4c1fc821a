//! Runtime error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid write options: {message}")]
    InvalidOptions { message: String },

    #[error("Invalid file path '{path}' in runtime write")]
    InvalidPath { path: String },

    #[error("Release metadata error: {message}")]
    Metadata { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] cpack_core::CoreError),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
