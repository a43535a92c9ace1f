pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod pipeline;
pub mod publisher;
pub mod rasterizer;
pub mod sanitize;
pub mod splitter;
pub mod storage;
pub mod worker;

pub use broadcast::JobProgressBroadcaster;
pub use config::{load_config, Config};
pub use db::Database;
pub use error::{
    ConfigError, ConvertError, FlipforgeError, IngestError, PublishError, Result, StorageError,
    WorkerError,
};
pub use ingest::Ingestor;
pub use manifest::{PageEntry, PageManifest};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext};
pub use publisher::{AllowAll, Entitlement, Publisher};
pub use worker::{Job, JobKind, JobResult, WorkerPool};
