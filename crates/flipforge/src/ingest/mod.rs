//! Upload handling: accepts a PDF, stores the original and creates the
//! document record in `uploading` status. Conversion is a separate job.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{document_repo, Database, DocumentRow, DocumentStatus};
use crate::error::IngestError;
use crate::sanitize::{redact_path, slugify};
use crate::storage::PageStore;

const PDF_MIME: &str = "application/pdf";

pub struct Ingestor {
    db: Database,
    store: PageStore,
}

impl Ingestor {
    pub fn new(db: Database, store: PageStore) -> Self {
        Self { db, store }
    }

    /// Accepts an uploaded PDF for `owner_id`. Copies the file into private
    /// storage and inserts the document row. The returned document is in
    /// `uploading` status; queue a convert job to move it forward.
    pub fn ingest(
        &self,
        owner_id: &str,
        title: &str,
        upload_path: &Path,
    ) -> Result<DocumentRow, IngestError> {
        let _span = tracing::info_span!(
            "ingest",
            owner = owner_id,
            upload = %redact_path(upload_path)
        )
        .entered();

        let title = title.trim();
        if title.is_empty() {
            return Err(IngestError::EmptyTitle);
        }

        let mime = mime_guess::from_path(upload_path).first_or_octet_stream();
        if mime.essence_str() != PDF_MIME {
            return Err(IngestError::UnsupportedType {
                path: upload_path.to_path_buf(),
                mime: mime.essence_str().to_string(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let slug = self.unique_slug(title)?;

        let source_path = self.store.store_source(upload_path, owner_id, &id)?;
        let byte_size = std::fs::metadata(&source_path).ok().map(|m| m.len());

        let now = Utc::now().to_rfc3339();
        let doc = DocumentRow {
            id,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            slug,
            source_path: Some(source_path.to_string_lossy().into_owned()),
            status: DocumentStatus::Uploading.as_str().to_string(),
            error: None,
            total_pages: 0,
            pages_json: None,
            is_published: false,
            published_slug: None,
            published_at: None,
            processing_started_at: None,
            processing_completed_at: None,
            created_at: now.clone(),
            updated_at: now,
            byte_size,
        };
        document_repo::insert(&self.db, &doc)?;

        tracing::info!("Ingested document {} ('{}')", doc.id, doc.title);
        Ok(doc)
    }

    /// Derives a slug from the title, appending -2, -3, ... until free.
    fn unique_slug(&self, title: &str) -> Result<String, IngestError> {
        let base = slugify(title);
        if !document_repo::slug_exists(&self.db, &base)? {
            return Ok(base);
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !document_repo::slug_exists(&self.db, &candidate)? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}
