use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipwatchError {
    #[error("Text embedding runtime is not available. Running in load-only mode.")]
    EmbeddingUnavailable,

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Trigger config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),
}

pub type Result<T> = std::result::Result<T, ClipwatchError>;
