//! Error types for the triage simulator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The queue is empty")]
    EmptyQueue,

    #[error("Invalid skill level '{0}': expected basic, intermediate or expert")]
    InvalidSkillLevel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
