use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};
use tokio::sync::broadcast;

use crate::broadcast::job_progress::{JobPhase, JobProgressEvent};
use crate::db::Database;
use crate::pipeline::progress::{BroadcastProgress, NoopProgress, ProgressReporter};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineContext, ProgressEvent};
use crate::publisher::Publisher;
use crate::worker::job::{Job, JobKind, JobResult};

pub struct WorkerPool {
    job_sender: Sender<Job>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    /// Optional job progress broadcaster for streaming.
    /// Stored to keep the sender alive; workers hold cloned Arcs.
    #[allow(dead_code)]
    job_progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
}

impl WorkerPool {
    pub fn new(db: Database, config: Arc<PipelineConfig>, worker_count: usize) -> Self {
        Self::with_progress_sender(db, config, worker_count, None)
    }

    /// Creates a new worker pool with an optional job progress broadcaster.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn with_progress_sender(
        db: Database,
        config: Arc<PipelineConfig>,
        worker_count: usize,
        job_progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<JobResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_db = db.clone();
            let worker_config = Arc::clone(&config);
            let progress_sender = job_progress_sender.clone();

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    job_rx,
                    result_tx,
                    shutdown_flag,
                    worker_db,
                    worker_config,
                    progress_sender,
                );
            });

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
            job_progress_sender,
        }
    }

    pub fn submit(&self, job: Job) -> Result<(), crate::error::WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(crate::error::WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| crate::error::WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    shutdown: Arc<AtomicBool>,
    db: Database,
    config: Arc<PipelineConfig>,
    progress_sender: Option<Arc<broadcast::Sender<JobProgressEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    let pipeline = Pipeline::from_config(db.clone(), Arc::clone(&config));
    let publisher = Publisher::from_config(db, config);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing job {} ({:?})", worker_id, job.id, job.kind);

                let result = if let Some(ref sender) = progress_sender {
                    let progress =
                        BroadcastProgress::new(&job.id, &job.document_id, Arc::clone(sender));
                    progress.report(ProgressEvent::Phase {
                        phase: JobPhase::Queued,
                        message: "Job queued for processing".to_string(),
                    });
                    run_job(&pipeline, &publisher, job, &progress)
                } else {
                    run_job(&pipeline, &publisher, job, &NoopProgress)
                };

                if let Err(e) = result_sender.send(result) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

fn run_job(
    pipeline: &Pipeline,
    publisher: &Publisher,
    job: Job,
    progress: &dyn ProgressReporter,
) -> JobResult {
    match job.kind.clone() {
        JobKind::Convert => {
            let ctx = PipelineContext::new(job);
            let (result, _ctx) = pipeline.run(ctx, progress);
            result
        }
        JobKind::Publish { slug } => {
            progress.report(ProgressEvent::Phase {
                phase: JobPhase::Publishing,
                message: "Copying public files...".to_string(),
            });
            match publisher.publish(&job.document_id, slug.as_deref()) {
                Ok(published_slug) => {
                    progress.report(ProgressEvent::Completed {
                        total_pages: None,
                        published_slug: Some(published_slug.clone()),
                    });
                    JobResult::published(&job, published_slug)
                }
                Err(e) => {
                    let message = e.to_string();
                    progress.report(ProgressEvent::Failed {
                        error: message.clone(),
                    });
                    JobResult::failure(&job, message)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::document_repo;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path) -> Arc<PipelineConfig> {
        Arc::new(PipelineConfig {
            data_root: root.join("data"),
            publish_root: root.join("public"),
            viewer_assets: root.join("viewer"),
            worker_count: 2,
        })
    }

    #[test]
    fn test_worker_pool_creation() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let pool = WorkerPool::new(db, test_config(tmp.path()), 2);

        assert!(!pool.is_shutdown());

        pool.shutdown();
        assert!(pool.is_shutdown());

        pool.wait();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let pool = WorkerPool::new(db, test_config(tmp.path()), 1);

        pool.shutdown();
        let result = pool.submit(Job::convert("d1"));
        assert!(result.is_err());

        pool.wait();
    }

    #[test]
    fn test_convert_job_for_missing_document_reports_failure() {
        // Each worker opens its own view of the shared in-memory database
        // via the cloned handle, so the job runs end to end and fails at
        // the load step.
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let pool = WorkerPool::new(db, test_config(tmp.path()), 1);

        pool.submit(Job::convert("ghost")).unwrap();
        let result = pool.recv_result().unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Document not found"));

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_publish_job_for_unready_document_reports_failure() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();

        let doc = crate::db::DocumentRow {
            id: "d1".to_string(),
            owner_id: "owner-1".to_string(),
            title: "Catalog".to_string(),
            slug: "catalog".to_string(),
            source_path: None,
            status: "processing".to_string(),
            error: None,
            total_pages: 0,
            pages_json: None,
            is_published: false,
            published_slug: None,
            published_at: None,
            processing_started_at: None,
            processing_completed_at: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            byte_size: None,
        };
        document_repo::insert(&db, &doc).unwrap();

        let pool = WorkerPool::new(db, test_config(tmp.path()), 1);
        pool.submit(Job::publish("d1", Some("my-slug".to_string())))
            .unwrap();

        let result = pool.recv_result().unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not ready"));

        pool.shutdown();
        pool.wait();
    }
}
