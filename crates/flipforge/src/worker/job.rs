/// What a queued job should do with its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Rasterize, split and persist the document's pages.
    Convert,
    /// Copy the ready document into the public publish tree.
    Publish {
        /// Caller-chosen public slug. `None` means derive one.
        slug: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub document_id: String,
    pub kind: JobKind,
}

impl Job {
    pub fn convert(document_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            kind: JobKind::Convert,
        }
    }

    pub fn publish(document_id: &str, slug: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            kind: JobKind::Publish { slug },
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub document_id: String,
    pub success: bool,
    /// Final page count (convert jobs).
    pub total_pages: Option<u32>,
    /// Public slug (publish jobs).
    pub published_slug: Option<String>,
    pub error: Option<String>,
}

impl JobResult {
    pub fn converted(job: &Job, total_pages: u32) -> Self {
        Self {
            job_id: job.id.clone(),
            document_id: job.document_id.clone(),
            success: true,
            total_pages: Some(total_pages),
            published_slug: None,
            error: None,
        }
    }

    pub fn published(job: &Job, slug: String) -> Self {
        Self {
            job_id: job.id.clone(),
            document_id: job.document_id.clone(),
            success: true,
            total_pages: None,
            published_slug: Some(slug),
            error: None,
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            document_id: job.document_id.clone(),
            success: false,
            total_pages: None,
            published_slug: None,
            error: Some(error),
        }
    }
}
