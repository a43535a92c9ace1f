use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Private per-document storage rooted at the configured data directory.
///
/// Paths are deterministic: `documents/{owner_id}/{document_id}/source.pdf`
/// for the uploaded original and `.../pages/page-NNN.jpg` for emitted pages.
/// Reprocessing overwrites in place; there is no conflict-suffix scheme.
pub struct PageStore {
    data_root: PathBuf,
}

impl PageStore {
    pub fn new<P: AsRef<Path>>(data_root: P) -> Self {
        Self {
            data_root: data_root.as_ref().to_path_buf(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn document_dir(&self, owner_id: &str, document_id: &str) -> PathBuf {
        self.data_root
            .join("documents")
            .join(owner_id)
            .join(document_id)
    }

    pub fn pages_dir(&self, owner_id: &str, document_id: &str) -> PathBuf {
        self.document_dir(owner_id, document_id).join("pages")
    }

    pub fn source_path(&self, owner_id: &str, document_id: &str) -> PathBuf {
        self.document_dir(owner_id, document_id).join("source.pdf")
    }

    /// Copies the uploaded PDF into the document's directory.
    pub fn store_source(
        &self,
        source: &Path,
        owner_id: &str,
        document_id: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.document_dir(owner_id, document_id);
        ensure_directory(&dir)?;

        let dest = dir.join("source.pdf");
        std::fs::copy(source, &dest).map_err(|e| StorageError::CopyFile {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;
        Ok(dest)
    }

    /// Writes one page image under the document's pages directory.
    pub fn store_page(
        &self,
        content: &[u8],
        owner_id: &str,
        document_id: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.pages_dir(owner_id, document_id);
        ensure_directory(&dir)?;

        let path = dir.join(filename);
        std::fs::write(&path, content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Removes the pages directory (delete-then-recreate on reprocess).
    /// Missing directory is fine.
    pub fn remove_pages(&self, owner_id: &str, document_id: &str) -> Result<(), StorageError> {
        let dir = self.pages_dir(owner_id, document_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| StorageError::Remove {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deterministic_paths() {
        let store = PageStore::new("/data");
        assert_eq!(
            store.pages_dir("u1", "d1"),
            PathBuf::from("/data/documents/u1/d1/pages")
        );
        assert_eq!(
            store.source_path("u1", "d1"),
            PathBuf::from("/data/documents/u1/d1/source.pdf")
        );
    }

    #[test]
    fn test_store_source_copies() {
        let tmp = TempDir::new().unwrap();
        let upload = tmp.path().join("upload.pdf");
        std::fs::write(&upload, b"%PDF-1.5 fake").unwrap();

        let store = PageStore::new(tmp.path().join("data"));
        let dest = store.store_source(&upload, "u1", "d1").unwrap();

        assert!(dest.ends_with("documents/u1/d1/source.pdf"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.5 fake");
        // Original upload is left in place; ingestion owns its lifecycle.
        assert!(upload.exists());
    }

    #[test]
    fn test_store_page_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = PageStore::new(tmp.path());

        let p1 = store.store_page(b"first", "u1", "d1", "page-001.jpg").unwrap();
        let p2 = store.store_page(b"second", "u1", "d1", "page-001.jpg").unwrap();

        assert_eq!(p1, p2);
        assert_eq!(std::fs::read(&p2).unwrap(), b"second");
    }

    #[test]
    fn test_remove_pages() {
        let tmp = TempDir::new().unwrap();
        let store = PageStore::new(tmp.path());

        store.store_page(b"x", "u1", "d1", "page-001.jpg").unwrap();
        assert!(store.pages_dir("u1", "d1").exists());

        store.remove_pages("u1", "d1").unwrap();
        assert!(!store.pages_dir("u1", "d1").exists());

        // Removing again is a no-op.
        store.remove_pages("u1", "d1").unwrap();
    }

    #[test]
    fn test_store_source_missing_upload_errors() {
        let tmp = TempDir::new().unwrap();
        let store = PageStore::new(tmp.path());

        let result = store.store_source(Path::new("/nonexistent/upload.pdf"), "u1", "d1");
        assert!(matches!(result, Err(StorageError::CopyFile { .. })));
    }
}
