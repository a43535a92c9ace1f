//! Page repository — CRUD operations for the `pages` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw page row from the database.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub id: i64,
    pub document_id: String,
    pub page_number: u32,
    pub file: String,
    pub width: u32,
    pub height: u32,
}

impl PageRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            page_number: row.get("page_number")?,
            file: row.get("file")?,
            width: row.get("width")?,
            height: row.get("height")?,
        })
    }
}

/// Inserts a page row. The (document_id, page_number) pair is unique.
pub fn insert(
    db: &Database,
    document_id: &str,
    page_number: u32,
    file: &str,
    width: u32,
    height: u32,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO pages (document_id, page_number, file, width, height)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![document_id, page_number, file, width, height],
        )?;
        Ok(())
    })
}

/// Lists a document's pages in ordinal order.
pub fn list_by_document(db: &Database, document_id: &str) -> Result<Vec<PageRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM pages WHERE document_id = ?1 ORDER BY page_number ASC")?;
        let rows: Vec<PageRow> = stmt
            .query_map(params![document_id], PageRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts a document's pages.
pub fn count_by_document(db: &Database, document_id: &str) -> Result<u32, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE document_id = ?1",
            params![document_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Deletes all pages of a document. Used by reprocessing (delete-then-recreate).
pub fn delete_by_document(db: &Database, document_id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "DELETE FROM pages WHERE document_id = ?1",
            params![document_id],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db_with_document() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, owner_id, title, slug, status, created_at, updated_at)
                 VALUES ('d1', 'u1', 'Doc', 'doc', 'processing', '2026-01-01', '2026-01-01')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_insert_and_list_ordered() {
        let db = test_db_with_document();
        // Insert out of order; list must come back sorted by ordinal.
        insert(&db, "d1", 2, "page-002.jpg", 1240, 1754).unwrap();
        insert(&db, "d1", 1, "page-001.jpg", 1240, 1754).unwrap();
        insert(&db, "d1", 3, "page-003.jpg", 620, 1754).unwrap();

        let pages = list_by_document(&db, "d1").unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(pages[2].width, 620);
    }

    #[test]
    fn test_duplicate_ordinal_rejected() {
        let db = test_db_with_document();
        insert(&db, "d1", 1, "page-001.jpg", 100, 100).unwrap();
        assert!(insert(&db, "d1", 1, "page-001-dup.jpg", 100, 100).is_err());
    }

    #[test]
    fn test_count_and_delete() {
        let db = test_db_with_document();
        insert(&db, "d1", 1, "page-001.jpg", 100, 100).unwrap();
        insert(&db, "d1", 2, "page-002.jpg", 100, 100).unwrap();
        assert_eq!(count_by_document(&db, "d1").unwrap(), 2);

        delete_by_document(&db, "d1").unwrap();
        assert_eq!(count_by_document(&db, "d1").unwrap(), 0);
        assert!(list_by_document(&db, "d1").unwrap().is_empty());
    }

    #[test]
    fn test_missing_document_fk() {
        let db = test_db_with_document();
        assert!(insert(&db, "no-such-doc", 1, "page-001.jpg", 100, 100).is_err());
    }
}
