use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),
}
