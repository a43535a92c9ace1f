pub mod job;
pub mod pool;

pub use job::{Job, JobKind, JobResult};
pub use pool::WorkerPool;

// Re-export crossbeam_channel for embedders
pub use crossbeam_channel;
