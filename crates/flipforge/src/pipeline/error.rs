use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document {0} has no stored source file")]
    MissingSource(String),

    #[error("Conversion failed: {0}")]
    Convert(#[from] crate::error::ConvertError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Failed to serialize page manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
