//! Job progress broadcaster for real-time conversion status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Phase of job processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    Rasterizing,
    Splitting,
    Persisting,
    Publishing,
    Completed,
    Failed,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPhase::Queued => write!(f, "Queued"),
            JobPhase::Rasterizing => write!(f, "Rendering pages"),
            JobPhase::Splitting => write!(f, "Splitting spreads"),
            JobPhase::Persisting => write!(f, "Storing pages"),
            JobPhase::Publishing => write!(f, "Publishing"),
            JobPhase::Completed => write!(f, "Completed"),
            JobPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Status of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

/// Progress event for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressEvent {
    /// Unique job identifier.
    pub job_id: String,
    /// Document being processed.
    pub document_id: String,
    /// Current phase of processing.
    pub phase: JobPhase,
    /// Overall job status.
    pub status: JobStatus,
    /// Human-readable message describing current activity.
    pub message: String,
    /// Timestamp of this event.
    pub timestamp: DateTime<Utc>,
    /// Final page count (set on conversion completion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    /// Public slug (set on publish completion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_slug: Option<String>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobProgressEvent {
    /// Creates a new progress event.
    pub fn new(job_id: &str, document_id: &str, phase: JobPhase, message: &str) -> Self {
        let status = match phase {
            JobPhase::Completed => JobStatus::Completed,
            JobPhase::Failed => JobStatus::Failed,
            _ => JobStatus::Processing,
        };

        Self {
            job_id: job_id.to_string(),
            document_id: document_id.to_string(),
            phase,
            status,
            message: message.to_string(),
            timestamp: Utc::now(),
            total_pages: None,
            published_slug: None,
            error: None,
        }
    }

    /// Creates a completion event.
    pub fn completed(
        job_id: &str,
        document_id: &str,
        total_pages: Option<u32>,
        published_slug: Option<&str>,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            document_id: document_id.to_string(),
            phase: JobPhase::Completed,
            status: JobStatus::Completed,
            message: "Job completed successfully".to_string(),
            timestamp: Utc::now(),
            total_pages,
            published_slug: published_slug.map(|s| s.to_string()),
            error: None,
        }
    }

    /// Creates a failure event.
    pub fn failed(job_id: &str, document_id: &str, error: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            document_id: document_id.to_string(),
            phase: JobPhase::Failed,
            status: JobStatus::Failed,
            message: "Job failed".to_string(),
            timestamp: Utc::now(),
            total_pages: None,
            published_slug: None,
            error: Some(error.to_string()),
        }
    }
}

/// Broadcasts job progress events for streaming.
#[derive(Clone)]
pub struct JobProgressBroadcaster {
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressBroadcaster {
    /// Creates a new job progress broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: JobProgressEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobProgressEvent> {
        self.sender.subscribe()
    }

    /// Returns a cloneable handle to the underlying sender for worker use.
    pub fn sender(&self) -> Arc<broadcast::Sender<JobProgressEvent>> {
        Arc::clone(&self.sender)
    }

    /// Creates a new job progress tracker for a processing job.
    pub fn start_job(&self, job_id: &str, document_id: &str) -> JobProgressTracker {
        let tracker = JobProgressTracker::new(job_id, document_id, Arc::clone(&self.sender));

        // Send initial queued event
        tracker.update_phase(JobPhase::Queued, "Job queued for processing");

        tracker
    }
}

/// Tracks progress of a single job and emits events through the broadcaster.
pub struct JobProgressTracker {
    job_id: String,
    document_id: String,
    sender: Arc<broadcast::Sender<JobProgressEvent>>,
}

impl JobProgressTracker {
    pub fn new(
        job_id: &str,
        document_id: &str,
        sender: Arc<broadcast::Sender<JobProgressEvent>>,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            document_id: document_id.to_string(),
            sender,
        }
    }

    pub fn update_phase(&self, phase: JobPhase, message: &str) {
        let event = JobProgressEvent::new(&self.job_id, &self.document_id, phase, message);
        let _ = self.sender.send(event);
    }

    pub fn completed(&self, total_pages: Option<u32>, published_slug: Option<&str>) {
        let event = JobProgressEvent::completed(
            &self.job_id,
            &self.document_id,
            total_pages,
            published_slug,
        );
        let _ = self.sender.send(event);
    }

    pub fn failed(&self, error: &str) {
        let event = JobProgressEvent::failed(&self.job_id, &self.document_id, error);
        let _ = self.sender.send(event);
    }
}
