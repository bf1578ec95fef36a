use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing CSV column: {0}")]
    MissingColumn(String),

    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(PathBuf),
}

pub type Result<T> = std::result::Result<T, ImportError>;
