use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::filesystem::ensure_directory;

/// Public publish tree, one directory per published slug:
/// `{publish_root}/{slug}/` holding page images, `pages.json`,
/// `index.html` and the viewer assets.
pub struct PublishStore {
    publish_root: PathBuf,
}

impl PublishStore {
    pub fn new<P: AsRef<Path>>(publish_root: P) -> Self {
        Self {
            publish_root: publish_root.as_ref().to_path_buf(),
        }
    }

    pub fn publish_root(&self) -> &Path {
        &self.publish_root
    }

    pub fn slug_dir(&self, slug: &str) -> PathBuf {
        self.publish_root.join(slug)
    }

    pub fn ensure_slug_dir(&self, slug: &str) -> Result<PathBuf, StorageError> {
        let dir = self.slug_dir(slug);
        ensure_directory(&dir)?;
        Ok(dir)
    }

    /// Ensures the `pages/` subdirectory inside a slug directory.
    pub fn ensure_pages_dir(&self, slug: &str) -> Result<PathBuf, StorageError> {
        let dir = self.slug_dir(slug).join("pages");
        ensure_directory(&dir)?;
        Ok(dir)
    }

    /// Copies one private page image into the slug directory under `filename`.
    pub fn copy_page(
        &self,
        source: &Path,
        slug: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.slug_dir(slug).join(filename);
        std::fs::copy(source, &dest).map_err(|e| StorageError::CopyFile {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;
        Ok(dest)
    }

    pub fn write_file(
        &self,
        slug: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.slug_dir(slug).join(filename);
        std::fs::write(&path, content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Best-effort removal of a slug directory. Failures are logged and
    /// swallowed so unpublish never fails on filesystem state.
    pub fn remove_slug_dir(&self, slug: &str) {
        let dir = self.slug_dir(slug);
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                log::warn!("Failed to remove publish directory for '{}': {}", slug, e);
            }
        }
    }
}
