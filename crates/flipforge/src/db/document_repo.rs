//! Document repository — CRUD operations for the `documents` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploading => "uploading",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "uploading" => Ok(DocumentStatus::Uploading),
            "processing" => Ok(DocumentStatus::Processing),
            "ready" => Ok(DocumentStatus::Ready),
            "error" => Ok(DocumentStatus::Error),
            other => Err(DatabaseError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw document row from the database.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub slug: String,
    pub source_path: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub total_pages: u32,
    pub pages_json: Option<String>,
    pub is_published: bool,
    pub published_slug: Option<String>,
    pub published_at: Option<String>,
    pub processing_started_at: Option<String>,
    pub processing_completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub byte_size: Option<u64>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            source_path: row.get("source_path")?,
            status: row.get("status")?,
            error: row.get("error")?,
            total_pages: row.get("total_pages")?,
            pages_json: row.get("pages_json")?,
            is_published: row.get::<_, i64>("is_published")? != 0,
            published_slug: row.get("published_slug")?,
            published_at: row.get("published_at")?,
            processing_started_at: row.get("processing_started_at")?,
            processing_completed_at: row.get("processing_completed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            byte_size: row.get("byte_size")?,
        })
    }

    pub fn status(&self) -> Result<DocumentStatus, DatabaseError> {
        DocumentStatus::parse(&self.status)
    }
}

/// Inserts a new document row.
pub fn insert(db: &Database, doc: &DocumentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, owner_id, title, slug, source_path, status, error,
             total_pages, pages_json, is_published, published_slug, published_at,
             processing_started_at, processing_completed_at, created_at, updated_at, byte_size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                doc.id,
                doc.owner_id,
                doc.title,
                doc.slug,
                doc.source_path,
                doc.status,
                doc.error,
                doc.total_pages,
                doc.pages_json,
                doc.is_published as i64,
                doc.published_slug,
                doc.published_at,
                doc.processing_started_at,
                doc.processing_completed_at,
                doc.created_at,
                doc.updated_at,
                doc.byte_size,
            ],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Finds a document by its published slug.
pub fn find_by_published_slug(
    db: &Database,
    slug: &str,
) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE published_slug = ?1")?;
        let mut rows = stmt.query_map(params![slug], DocumentRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists documents belonging to an owner, newest first.
pub fn list_by_owner(db: &Database, owner_id: &str) -> Result<Vec<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM documents WHERE owner_id = ?1 ORDER BY created_at DESC")?;
        let rows: Vec<DocumentRow> = stmt
            .query_map(params![owner_id], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns true if a document slug is already taken.
pub fn slug_exists(db: &Database, slug: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE slug = ?1",
            params![slug],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Returns true if another document already holds this published slug.
pub fn published_slug_taken(
    db: &Database,
    slug: &str,
    exclude_id: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE published_slug = ?1 AND id != ?2",
            params![slug, exclude_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    })
}

/// Marks a document as processing and stamps the start time.
pub fn mark_processing(db: &Database, id: &str, started_at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'processing', error = NULL,
             processing_started_at = ?2, updated_at = ?2 WHERE id = ?1",
            params![id, started_at],
        )?;
        Ok(())
    })
}

/// Marks a document as ready, writing the page count and metadata blob.
pub fn mark_ready(
    db: &Database,
    id: &str,
    total_pages: u32,
    pages_json: &str,
    completed_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'ready', total_pages = ?2, pages_json = ?3,
             processing_completed_at = ?4, updated_at = ?4 WHERE id = ?1",
            params![id, total_pages, pages_json, completed_at],
        )?;
        Ok(())
    })
}

/// Marks a document as failed with a human-readable message.
pub fn mark_error(db: &Database, id: &str, message: &str, at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'error', error = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, message, at],
        )?;
        Ok(())
    })
}

/// Records a successful publish: slug, timestamp, visibility flag.
pub fn mark_published(
    db: &Database,
    id: &str,
    published_slug: &str,
    published_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET is_published = 1, published_slug = ?2,
             published_at = ?3, updated_at = ?3 WHERE id = ?1",
            params![id, published_slug, published_at],
        )?;
        Ok(())
    })
}

/// Flips the visibility flag off. The published slug is kept so a
/// later republish reuses the same public identifier.
pub fn mark_unpublished(db: &Database, id: &str, at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET is_published = 0, updated_at = ?2 WHERE id = ?1",
            params![id, at],
        )?;
        Ok(())
    })
}
