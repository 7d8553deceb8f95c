use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] raii_store::StoreError),

    #[error("io error writing sidecar document: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown reference type: {0}")]
    InvalidReferenceType(String),
}

impl From<raii_model::InvalidReferenceType> for EngineError {
    fn from(error: raii_model::InvalidReferenceType) -> Self {
        EngineError::InvalidReferenceType(error.0)
    }
}
