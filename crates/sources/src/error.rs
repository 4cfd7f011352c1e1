use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to read the data source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to deserialize the data source: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("The upstream data source returned an error: {0}")]
    Upstream(String),
}
