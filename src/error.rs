use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream catalog unavailable: {0}")]
    Upstream(String),

    #[error("Key-value backend unavailable: {0}")]
    Backend(String),

    #[error("Event not found: {0}")]
    NotFound(Uuid),

    #[error("Event already exists: {0}")]
    Conflict(Uuid),

    #[error("Invalid event: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, EventsError>;
