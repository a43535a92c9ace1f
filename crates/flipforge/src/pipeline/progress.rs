use std::sync::Arc;

use tokio::sync::broadcast;

use crate::broadcast::job_progress::{JobPhase, JobProgressEvent, JobProgressTracker};

/// Events emitted by the pipeline during conversion.
pub enum ProgressEvent {
    Phase {
        phase: JobPhase,
        message: String,
    },
    Completed {
        total_pages: Option<u32>,
        published_slug: Option<String>,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events onto the broadcast channel.
pub struct BroadcastProgress {
    tracker: JobProgressTracker,
}

impl BroadcastProgress {
    pub fn new(
        job_id: &str,
        document_id: &str,
        sender: Arc<broadcast::Sender<JobProgressEvent>>,
    ) -> Self {
        Self {
            tracker: JobProgressTracker::new(job_id, document_id, sender),
        }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                self.tracker.update_phase(phase, &message);
            }
            ProgressEvent::Completed {
                total_pages,
                published_slug,
            } => {
                self.tracker.completed(total_pages, published_slug.as_deref());
            }
            ProgressEvent::Failed { error } => {
                self.tracker.failed(&error);
            }
        }
    }
}
