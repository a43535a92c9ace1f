use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlipforgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Viewer asset missing: {path}")]
    MissingViewerAsset { path: PathBuf },
}

/// Errors from the rasterize/split stages of the conversion pipeline.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    #[error("PDF produced no pages")]
    NoPages,

    #[error("Rendered page {page} not found in working directory")]
    MissingRaster { page: u32 },

    #[error("Failed to decode page image '{path}': {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    #[error("Failed to encode page image: {0}")]
    ImageEncode(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported upload type '{mime}' for '{path}' (expected application/pdf)")]
    UnsupportedType { path: PathBuf, mime: String },

    #[error("Document title is empty")]
    EmptyTitle,

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document {id} is not ready (status: {status})")]
    NotReady { id: String, status: String },

    #[error("Owner {0} is not entitled to publish")]
    NotEntitled(String),

    #[error("Public identifier '{0}' is already in use")]
    SlugConflict(String),

    #[error("Invalid public identifier '{0}': lowercase letters, digits and hyphens only")]
    InvalidSlug(String),

    #[error("Document {0} has no page manifest")]
    MissingManifest(String),

    #[error("Failed to serialize page manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job failed: {0}")]
    JobFailed(String),
}

pub type Result<T> = std::result::Result<T, FlipforgeError>;
