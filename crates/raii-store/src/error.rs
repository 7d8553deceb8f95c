use heed3::{Error as HeedError, MdbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lmdb backend error: {0}")]
    Backend(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unknown reference type: {0}")]
    InvalidReferenceType(String),
}

impl From<HeedError> for StoreError {
    fn from(error: HeedError) -> Self {
        match error {
            HeedError::Mdb(MdbError::KeyExist) => StoreError::Backend(format!("duplicate key: {error}")),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<postcard::Error> for StoreError {
    fn from(error: postcard::Error) -> Self {
        StoreError::Decode(format!("postcard: {error}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Decode(format!("json: {error}"))
    }
}

impl From<raii_model::InvalidReferenceType> for StoreError {
    fn from(error: raii_model::InvalidReferenceType) -> Self {
        StoreError::InvalidReferenceType(error.0)
    }
}
